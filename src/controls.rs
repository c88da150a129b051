//! Keyboard controls. Every key press becomes a `SessionCommand`.

use bevy::prelude::*;

use crate::session::SessionCommand;

/// Key bindings, in the order they are listed at startup.
pub const BINDINGS: [(KeyCode, &str); 9] = [
    (KeyCode::KeyF, "toggle inertial / body-fixed frame"),
    (KeyCode::ArrowLeft, "previous day"),
    (KeyCode::ArrowRight, "next day"),
    (KeyCode::KeyW, "cycle whisker parameter"),
    (KeyCode::KeyM, "cycle model parameter"),
    (KeyCode::KeyP, "cycle path color parameter"),
    (KeyCode::KeyG, "toggle ground track"),
    (KeyCode::KeyS, "toggle sub-solar point"),
    (KeyCode::Space, "pause / resume"),
];

pub fn command_for_key(key: KeyCode) -> Option<SessionCommand> {
    let command = match key {
        KeyCode::KeyF => SessionCommand::ToggleFrame,
        KeyCode::ArrowLeft => SessionCommand::ShiftDay(-1),
        KeyCode::ArrowRight => SessionCommand::ShiftDay(1),
        KeyCode::KeyW => SessionCommand::CycleWhisker,
        KeyCode::KeyM => SessionCommand::CycleModel,
        KeyCode::KeyP => SessionCommand::CyclePathColor,
        KeyCode::KeyG => SessionCommand::ToggleGroundTrack,
        KeyCode::KeyS => SessionCommand::ToggleSubsolar,
        KeyCode::Space => SessionCommand::TogglePause,
        _ => return None,
    };
    Some(command)
}

pub fn log_bindings() {
    for (key, action) in BINDINGS {
        info!("{key:?}: {action}");
    }
}

pub fn keyboard_commands(
    input: Res<ButtonInput<KeyCode>>,
    mut commands: MessageWriter<SessionCommand>,
) {
    for key in input.get_just_pressed() {
        if let Some(command) = command_for_key(*key) {
            debug!("{key:?} -> {command:?}");
            commands.write(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_binding_maps_to_a_command() {
        for (key, _) in BINDINGS {
            assert!(command_for_key(key).is_some(), "{key:?} is unbound");
        }
    }

    #[test]
    fn day_keys_shift_in_opposite_directions() {
        assert_eq!(
            command_for_key(KeyCode::ArrowLeft),
            Some(SessionCommand::ShiftDay(-1))
        );
        assert_eq!(
            command_for_key(KeyCode::ArrowRight),
            Some(SessionCommand::ShiftDay(1))
        );
        assert_eq!(command_for_key(KeyCode::KeyQ), None);
    }
}
