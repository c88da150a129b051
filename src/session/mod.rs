//! Explicit session state: what is being looked at, and the commands that change it.

use bevy::prelude::*;
use chrono::{Duration, NaiveDate};

use crate::datasource::catalog::MODEL_PARAMETERS;
use crate::datasource::{PathColorParameter, WhiskerParameter};
use crate::frames::ReferenceFrame;

pub mod pipeline;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Session {
    /// Selected date range: one UTC day.
    pub day: NaiveDate,
    pub frame: ReferenceFrame,
    pub whisker: WhiskerParameter,
    /// Index into the model parameter list.
    pub model_index: usize,
    pub path_color: PathColorParameter,
    pub show_ground_track: bool,
    pub show_subsolar: bool,
    pub paused: bool,
}

impl Session {
    pub fn new(day: NaiveDate, frame: ReferenceFrame) -> Self {
        Self {
            day,
            frame,
            whisker: WhiskerParameter::default(),
            model_index: 0,
            path_color: PathColorParameter::default(),
            show_ground_track: true,
            show_subsolar: true,
            paused: false,
        }
    }

    pub fn model_parameter(&self) -> &'static str {
        MODEL_PARAMETERS[self.model_index % MODEL_PARAMETERS.len()]
    }

    /// Apply one command and report which part of the pipeline it invalidates.
    pub fn apply(&mut self, command: &SessionCommand) -> Option<SessionChange> {
        let change = match *command {
            SessionCommand::SelectDate(day) => {
                self.day = day;
                SessionChange::DateRange
            }
            SessionCommand::ShiftDay(days) => {
                let Some(day) = self.day.checked_add_signed(Duration::days(days)) else {
                    warn!("cannot shift {} by {days} days", self.day);
                    return None;
                };
                self.day = day;
                SessionChange::DateRange
            }
            SessionCommand::SetFrame(frame) => {
                if frame == self.frame {
                    return None;
                }
                self.frame = frame;
                SessionChange::Frame
            }
            SessionCommand::ToggleFrame => {
                self.frame = self.frame.toggled();
                SessionChange::Frame
            }
            SessionCommand::SelectWhisker(parameter) => {
                if parameter == self.whisker {
                    return None;
                }
                self.whisker = parameter;
                SessionChange::Whiskers
            }
            SessionCommand::CycleWhisker => {
                self.whisker = cycle(&WhiskerParameter::ALL, self.whisker);
                SessionChange::Whiskers
            }
            SessionCommand::CycleModel => {
                self.model_index = (self.model_index + 1) % MODEL_PARAMETERS.len();
                SessionChange::Model
            }
            SessionCommand::CyclePathColor => {
                self.path_color = cycle(&PathColorParameter::ALL, self.path_color);
                SessionChange::PathColor
            }
            SessionCommand::ToggleGroundTrack => {
                self.show_ground_track = !self.show_ground_track;
                SessionChange::Display
            }
            SessionCommand::ToggleSubsolar => {
                self.show_subsolar = !self.show_subsolar;
                SessionChange::Display
            }
            SessionCommand::TogglePause => {
                self.paused = !self.paused;
                SessionChange::Display
            }
        };
        Some(change)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let index = all.iter().position(|p| *p == current).unwrap_or(0);
    all[(index + 1) % all.len()]
}

/// Requests to change the session. Nothing downstream writes these back.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum SessionCommand {
    SelectDate(NaiveDate),
    ShiftDay(i64),
    SetFrame(ReferenceFrame),
    ToggleFrame,
    SelectWhisker(WhiskerParameter),
    CycleWhisker,
    CycleModel,
    CyclePathColor,
    ToggleGroundTrack,
    ToggleSubsolar,
    TogglePause,
}

/// What a command invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    DateRange,
    Frame,
    Whiskers,
    Model,
    PathColor,
    /// Presentation only; no data to reload.
    Display,
}

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SessionCommand>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
            ReferenceFrame::Inertial,
        )
    }

    #[test]
    fn date_commands() {
        let mut s = session();
        assert_eq!(s.apply(&SessionCommand::ShiftDay(1)), Some(SessionChange::DateRange));
        assert_eq!(s.day, NaiveDate::from_ymd_opt(2019, 6, 2).unwrap());
        assert_eq!(s.apply(&SessionCommand::ShiftDay(-2)), Some(SessionChange::DateRange));
        assert_eq!(s.day, NaiveDate::from_ymd_opt(2019, 5, 31).unwrap());

        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(s.apply(&SessionCommand::SelectDate(day)), Some(SessionChange::DateRange));
        assert_eq!(s.day, day);
    }

    #[test]
    fn frame_commands() {
        let mut s = session();
        assert_eq!(s.apply(&SessionCommand::SetFrame(ReferenceFrame::Inertial)), None);
        assert_eq!(s.apply(&SessionCommand::ToggleFrame), Some(SessionChange::Frame));
        assert_eq!(s.frame, ReferenceFrame::BodyFixed);
        assert_eq!(
            s.apply(&SessionCommand::SetFrame(ReferenceFrame::Inertial)),
            Some(SessionChange::Frame)
        );
    }

    #[test]
    fn cycling_wraps_around() {
        let mut s = session();
        for _ in 0..WhiskerParameter::ALL.len() {
            s.apply(&SessionCommand::CycleWhisker);
        }
        assert_eq!(s.whisker, WhiskerParameter::default());

        for _ in 0..MODEL_PARAMETERS.len() {
            assert_eq!(s.apply(&SessionCommand::CycleModel), Some(SessionChange::Model));
        }
        assert_eq!(s.model_parameter(), MODEL_PARAMETERS[0]);

        let first = s.path_color;
        s.apply(&SessionCommand::CyclePathColor);
        assert_ne!(s.path_color, first);
    }

    #[test]
    fn display_toggles() {
        let mut s = session();
        assert_eq!(s.apply(&SessionCommand::TogglePause), Some(SessionChange::Display));
        assert!(s.paused);
        s.apply(&SessionCommand::ToggleGroundTrack);
        s.apply(&SessionCommand::ToggleSubsolar);
        assert!(!s.show_ground_track);
        assert!(!s.show_subsolar);
    }

    #[test]
    fn reselecting_the_same_whisker_is_a_no_op() {
        let mut s = session();
        assert_eq!(
            s.apply(&SessionCommand::SelectWhisker(WhiskerParameter::MagneticField)),
            None
        );
    }
}
