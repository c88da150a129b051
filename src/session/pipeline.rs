//! Session changes start generations and fetches; fetch results feed the pipeline stores.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use chrono::Duration;

use crate::config::VizConfig;
use crate::datasource::catalog::{
    ephemeris_request, frame_matrix_request, model_request, path_color_request, whisker_request,
};
use crate::datasource::{DataChannels, DataTable, DatasetRequest, FetchCommand, FetchResult};
use crate::ephemeris::{EphemerisIngest, EphemerisRow, EphemerisState, PathColorState};
use crate::error::PipelineError;
use crate::frames::{FrameProvider, FrameTransformer, PreloadedFrames};
use crate::readiness::{Generation, InputKind, InputState, ReadinessCoordinator};
use crate::session::{Session, SessionChange, SessionCommand};
use crate::shell::model::{ModelRequest, ModelState, ShellGrid, model_season};
use crate::time::{SimulationTime, day_window};
use crate::visualization::colormaps::{ColorMapper, PaletteMapper};
use crate::whiskers::{FrameMatrixState, WhiskerState, parse_matrix_table};

/// Everything the pipeline derives from fetched tables.
#[derive(SystemParam)]
pub struct PipelineStores<'w> {
    pub ephemeris: ResMut<'w, EphemerisState>,
    pub matrices: ResMut<'w, FrameMatrixState>,
    pub whiskers: ResMut<'w, WhiskerState>,
    pub model: ResMut<'w, ModelState>,
    pub path_color: ResMut<'w, PathColorState>,
}

/// Borrowed view of the pipeline for one batch of work.
pub struct PipelineContext<'a> {
    pub coordinator: &'a mut ReadinessCoordinator,
    pub channels: &'a DataChannels,
    pub transformer: &'a FrameTransformer,
    pub frames: &'a dyn FrameProvider,
    pub config: &'a VizConfig,
    pub session: &'a Session,
    pub mapper: &'a dyn ColorMapper,
    pub ephemeris: &'a mut EphemerisState,
    pub matrices: &'a mut FrameMatrixState,
    pub whiskers: &'a mut WhiskerState,
    pub model: &'a mut ModelState,
    pub path_color: &'a mut PathColorState,
}

impl PipelineContext<'_> {
    /// Start a new generation of `kind` and hand its request to the worker.
    fn request(&mut self, kind: InputKind, request: DatasetRequest) -> Generation {
        let generation = self.coordinator.begin(kind);
        let command = FetchCommand {
            input: kind,
            generation,
            request,
        };
        if self.channels.cmd_tx.send(command).is_err()
            && let Err(err) = self
                .coordinator
                .fail(kind, generation, "dataset worker stopped")
        {
            error!("{err}");
        }
        generation
    }

    /// Drop everything tied to the previous date range and fetch the new one.
    pub fn reload_date_range(&mut self) {
        let day = self.session.day;
        info!("loading {day}");

        *self.ephemeris = EphemerisState::default();
        self.matrices.mso_to_fixed.clear();
        self.whiskers.rows.clear();
        self.whiskers.parameter = self.session.whisker;
        self.path_color.rows.clear();
        self.path_color.refresh(&[], self.mapper, self.config.render.path_palette);
        self.model.clear();
        // the model is requested once the ephemeris says which season to use
        self.coordinator.reset(InputKind::Model);

        self.request(InputKind::Ephemeris, ephemeris_request(day));
        self.request(InputKind::FrameMatrix, frame_matrix_request(day));
        self.request(InputKind::Whiskers, whisker_request(self.session.whisker, day));
        self.request(
            InputKind::PathColor,
            path_color_request(self.session.path_color, day),
        );
    }

    pub fn reload_whiskers(&mut self) {
        self.whiskers.rows.clear();
        self.whiskers.parameter = self.session.whisker;
        self.request(
            InputKind::Whiskers,
            whisker_request(self.session.whisker, self.session.day),
        );
    }

    pub fn reload_path_color(&mut self) {
        self.path_color.rows.clear();
        self.path_color.refresh(&[], self.mapper, self.config.render.path_palette);
        self.request(
            InputKind::PathColor,
            path_color_request(self.session.path_color, self.session.day),
        );
    }

    /// Fetch the model grid for the season of the current ephemeris, if there is one.
    pub fn request_model(&mut self) {
        let Some(mean_ls) = self
            .ephemeris
            .products
            .as_ref()
            .map(|p| p.mean_solar_longitude)
        else {
            return;
        };
        let season = model_season(mean_ls);
        let parameter = self.session.model_parameter();
        let generation = self.request(
            InputKind::Model,
            model_request(parameter, &self.config.shell, season),
        );
        self.model.requested = Some(ModelRequest {
            generation,
            parameter,
            season,
        });
    }

    /// Re-derive the ephemeris from the retained rows in the transformer's current frame.
    pub fn reingest_ephemeris(&mut self) {
        if !self.coordinator.is_ready(InputKind::Ephemeris) {
            // a fetch in flight is ingested in the new frame when it lands
            return;
        }
        let generation = self.coordinator.begin(InputKind::Ephemeris);
        let rows = std::mem::take(&mut self.ephemeris.rows);
        let outcome = self.install_ephemeris(generation, rows);
        self.finish(InputKind::Ephemeris, generation, outcome);
    }

    fn install_ephemeris(
        &mut self,
        generation: Generation,
        rows: Vec<EphemerisRow>,
    ) -> Result<(), PipelineError> {
        let ingest = EphemerisIngest::new(self.transformer, &self.config.ingest);
        let products = match ingest.ingest(&rows, self.transformer.frame(), self.frames) {
            Ok(products) => products,
            Err(err) => {
                *self.ephemeris = EphemerisState::default();
                return Err(err);
            }
        };
        info!(
            "ephemeris ({}): {} samples, mean Ls {:.1}",
            products.frame.label(),
            products.epochs.len(),
            products.mean_solar_longitude
        );
        self.path_color.refresh(
            &products.epochs,
            self.mapper,
            self.config.render.path_palette,
        );
        *self.ephemeris = EphemerisState {
            generation: Some(generation),
            rows,
            products: Some(products),
        };
        Ok(())
    }

    fn finish(&mut self, kind: InputKind, generation: Generation, outcome: Result<(), PipelineError>) {
        let status = match outcome {
            Ok(()) => self.coordinator.complete(kind, generation),
            Err(err) => self.coordinator.fail(kind, generation, err.to_string()),
        };
        if let Err(err) = status {
            debug!("{err}");
        }
    }

    /// Route one worker result. Results for a superseded generation are discarded.
    pub fn handle_result(&mut self, result: FetchResult) {
        let FetchResult {
            input,
            generation,
            outcome,
        } = result;

        if self.coordinator.state(input) != &InputState::Loading(generation) {
            debug!(
                "discarding {}",
                PipelineError::StaleGenerationResult {
                    kind: input,
                    generation,
                    current: self.coordinator.current(input),
                }
            );
            return;
        }

        let table = match outcome {
            Ok(table) => table,
            Err(reason) => {
                if let Err(err) = self.coordinator.fail(input, generation, reason) {
                    debug!("{err}");
                }
                return;
            }
        };
        debug!(
            "{} table: {} rows from {:?}",
            input.label(),
            table.rows.len(),
            table.kind
        );

        let outcome = match input {
            InputKind::Ephemeris => {
                let rows = parse_ephemeris_rows(&table);
                self.install_ephemeris(generation, rows)
            }
            InputKind::FrameMatrix => self.install_matrices(table),
            InputKind::Whiskers => self.install_whiskers(table),
            InputKind::Model => self.install_model(generation, &table),
            InputKind::PathColor => self.install_path_color(table),
        };
        self.finish(input, generation, outcome);

        if input == InputKind::Ephemeris && self.coordinator.is_ready(InputKind::Ephemeris) {
            self.request_model();
        }
    }

    fn install_matrices(&mut self, table: DataTable) -> Result<(), PipelineError> {
        if table.rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        self.matrices.mso_to_fixed = parse_matrix_table(&table.rows);
        Ok(())
    }

    fn install_whiskers(&mut self, table: DataTable) -> Result<(), PipelineError> {
        if table.rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if !table.kind.is_vector_source() {
            warn!("whisker rows came from {:?}", table.kind);
        }
        self.whiskers.rows = table.rows;
        self.whiskers.derived_from = None;
        Ok(())
    }

    fn install_model(&mut self, generation: Generation, table: &DataTable) -> Result<(), PipelineError> {
        let shell = &self.config.shell;
        let grid = ShellGrid::from_rows(&table.rows, self.mapper, shell.palette, shell.alpha)?;
        if self.model.accept(generation, grid) {
            Ok(())
        } else {
            Err(PipelineError::StaleGenerationResult {
                kind: InputKind::Model,
                generation,
                current: self.model.requested.map(|r| r.generation),
            })
        }
    }

    fn install_path_color(&mut self, table: DataTable) -> Result<(), PipelineError> {
        if table.rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        self.path_color.rows = table.rows;
        let epochs = self
            .ephemeris
            .products
            .as_ref()
            .map(|p| p.epochs.as_slice())
            .unwrap_or_default();
        self.path_color
            .refresh(epochs, self.mapper, self.config.render.path_palette);
        Ok(())
    }
}

/// Parse spice rows, skipping the malformed ones.
pub fn parse_ephemeris_rows(table: &DataTable) -> Vec<EphemerisRow> {
    table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(index, cells)| match EphemerisRow::from_cells(index, cells) {
            Ok(row) => Some(row),
            Err(err) => {
                warn!("ephemeris {err}");
                None
            }
        })
        .collect()
}

pub fn queue_initial_load(session: Res<Session>, mut commands: MessageWriter<SessionCommand>) {
    commands.write(SessionCommand::SelectDate(session.day));
}

#[allow(clippy::too_many_arguments)]
pub fn apply_session_commands(
    mut reader: MessageReader<SessionCommand>,
    mut session: ResMut<Session>,
    channels: Option<Res<DataChannels>>,
    mut coordinator: ResMut<ReadinessCoordinator>,
    mut transformer: ResMut<FrameTransformer>,
    mut frames: ResMut<PreloadedFrames>,
    mut sim_time: ResMut<SimulationTime>,
    config: Res<VizConfig>,
    mapper: Res<PaletteMapper>,
    mut stores: PipelineStores,
) {
    let mut changes: Vec<SessionChange> = Vec::new();
    for command in reader.read() {
        if let Some(change) = session.apply(command)
            && !changes.contains(&change)
        {
            changes.push(change);
        }
    }
    if changes.is_empty() {
        return;
    }
    let Some(channels) = channels else {
        warn!("dataset worker not running; ignoring {changes:?}");
        return;
    };

    let date_changed = changes.contains(&SessionChange::DateRange);
    if date_changed {
        let (start, end) = day_window(session.day);
        frames.preload(start, end, Duration::days(1));
        sim_time.current_utc = start;
    }
    let frame_changed =
        changes.contains(&SessionChange::Frame) && transformer.set_frame(session.frame);
    if frame_changed {
        info!("frame: {}", session.frame.label());
    }

    let mut ctx = PipelineContext {
        coordinator: &mut coordinator,
        channels: &channels,
        transformer: &transformer,
        frames: &*frames,
        config: &config,
        session: &session,
        mapper: &*mapper,
        ephemeris: &mut stores.ephemeris,
        matrices: &mut stores.matrices,
        whiskers: &mut stores.whiskers,
        model: &mut stores.model,
        path_color: &mut stores.path_color,
    };

    if date_changed {
        // a new date range reloads every input with the current selections
        ctx.reload_date_range();
        return;
    }
    if frame_changed {
        ctx.reingest_ephemeris();
    }
    for change in changes {
        match change {
            SessionChange::Whiskers => ctx.reload_whiskers(),
            SessionChange::PathColor => ctx.reload_path_color(),
            SessionChange::Model => ctx.request_model(),
            SessionChange::DateRange | SessionChange::Frame | SessionChange::Display => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn receive_fetch_results(
    channels: Option<Res<DataChannels>>,
    mut coordinator: ResMut<ReadinessCoordinator>,
    transformer: Res<FrameTransformer>,
    frames: Res<PreloadedFrames>,
    config: Res<VizConfig>,
    session: Res<Session>,
    mapper: Res<PaletteMapper>,
    mut stores: PipelineStores,
) {
    let Some(channels) = channels else { return };
    let results: Vec<FetchResult> = {
        let Ok(guard) = channels.res_rx.lock() else {
            return;
        };
        std::iter::from_fn(|| guard.try_recv().ok()).collect()
    };
    if results.is_empty() {
        return;
    }

    let mut ctx = PipelineContext {
        coordinator: &mut coordinator,
        channels: &channels,
        transformer: &transformer,
        frames: &*frames,
        config: &config,
        session: &session,
        mapper: &*mapper,
        ephemeris: &mut stores.ephemeris,
        matrices: &mut stores.matrices,
        whiskers: &mut stores.whiskers,
        model: &mut stores.model,
        path_color: &mut stores.path_color,
    };
    for result in results {
        ctx.handle_result(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::DatasetKind;
    use crate::frames::ReferenceFrame;
    use crate::frames::provider::testing::FixedFrames;
    use bevy::math::DMat3;
    use chrono::NaiveDate;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::{Arc, Mutex};

    struct Harness {
        coordinator: ReadinessCoordinator,
        channels: DataChannels,
        sent: Receiver<FetchCommand>,
        transformer: FrameTransformer,
        frames: FixedFrames,
        config: VizConfig,
        session: Session,
        ephemeris: EphemerisState,
        matrices: FrameMatrixState,
        whiskers: WhiskerState,
        model: ModelState,
        path_color: PathColorState,
    }

    impl Harness {
        fn new(frame: ReferenceFrame) -> Self {
            let (cmd_tx, sent) = mpsc::channel();
            let (_res_tx, res_rx) = mpsc::channel();
            let config = VizConfig::default();
            Self {
                coordinator: ReadinessCoordinator::default(),
                channels: DataChannels {
                    cmd_tx,
                    res_rx: Arc::new(Mutex::new(res_rx)),
                },
                sent,
                transformer: FrameTransformer::new(frame, config.ellipsoid),
                frames: FixedFrames(DMat3::IDENTITY),
                session: Session::new(NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(), frame),
                config,
                ephemeris: EphemerisState::default(),
                matrices: FrameMatrixState::default(),
                whiskers: WhiskerState::default(),
                model: ModelState::default(),
                path_color: PathColorState::default(),
            }
        }

        fn ctx(&mut self) -> PipelineContext<'_> {
            PipelineContext {
                coordinator: &mut self.coordinator,
                channels: &self.channels,
                transformer: &self.transformer,
                frames: &self.frames,
                config: &self.config,
                session: &self.session,
                mapper: &PaletteMapper,
                ephemeris: &mut self.ephemeris,
                matrices: &mut self.matrices,
                whiskers: &mut self.whiskers,
                model: &mut self.model,
                path_color: &mut self.path_color,
            }
        }

        fn drain(&self) -> Vec<FetchCommand> {
            self.sent.try_iter().collect()
        }
    }

    fn spice_table(ls: &[f64]) -> DataTable {
        let rows = ls
            .iter()
            .enumerate()
            .map(|(i, ls)| {
                vec![
                    format!("2019-06-01T00:{:02}:00Z", i),
                    ls.to_string(),
                    "1.5".into(),
                    "150".into(),
                    "10".into(),
                    "20".into(),
                    "45".into(),
                    "5".into(),
                    "30".into(),
                ]
            })
            .collect();
        DataTable {
            kind: DatasetKind::Spice,
            rows,
        }
    }

    fn find(commands: &[FetchCommand], kind: InputKind) -> &FetchCommand {
        commands
            .iter()
            .find(|c| c.input == kind)
            .expect("command for kind")
    }

    #[test]
    fn date_reload_requests_every_input_but_the_model() {
        let mut h = Harness::new(ReferenceFrame::Inertial);
        h.ctx().reload_date_range();
        let sent = h.drain();
        let kinds: Vec<_> = sent.iter().map(|c| c.input).collect();
        assert_eq!(
            kinds,
            vec![
                InputKind::Ephemeris,
                InputKind::FrameMatrix,
                InputKind::Whiskers,
                InputKind::PathColor
            ]
        );
        assert!(h.coordinator.state(InputKind::Model) == &InputState::Idle);
        assert!(sent[0].request.filters.iter().any(|f| f == "time>2019-06-01"));
    }

    #[test]
    fn ephemeris_result_installs_products_and_requests_model() {
        let mut h = Harness::new(ReferenceFrame::Inertial);
        h.ctx().reload_date_range();
        let sent = h.drain();
        let ephemeris = find(&sent, InputKind::Ephemeris).generation;

        h.ctx().handle_result(FetchResult {
            input: InputKind::Ephemeris,
            generation: ephemeris,
            outcome: Ok(spice_table(&[80.0, 100.0])),
        });

        assert!(h.coordinator.is_ready(InputKind::Ephemeris));
        let products = h.ephemeris.products.as_ref().unwrap();
        assert_eq!(products.epochs.len(), 2);
        assert_eq!(products.mean_solar_longitude, 90.0);

        let sent = h.drain();
        let model = find(&sent, InputKind::Model);
        assert!(model.request.filters.contains(&"solar_longitude=90".to_string()));
        assert_eq!(h.model.requested.map(|r| r.season), Some(90));
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut h = Harness::new(ReferenceFrame::Inertial);
        h.ctx().reload_date_range();
        let old = find(&h.drain(), InputKind::Ephemeris).generation;
        h.session.day = NaiveDate::from_ymd_opt(2019, 6, 2).unwrap();
        h.ctx().reload_date_range();
        let current = find(&h.drain(), InputKind::Ephemeris).generation;

        h.ctx().handle_result(FetchResult {
            input: InputKind::Ephemeris,
            generation: old,
            outcome: Ok(spice_table(&[10.0])),
        });
        assert!(h.ephemeris.products.is_none());
        assert_eq!(
            h.coordinator.state(InputKind::Ephemeris),
            &InputState::Loading(current)
        );
    }

    #[test]
    fn empty_and_failed_fetches_mark_the_input_failed() {
        let mut h = Harness::new(ReferenceFrame::Inertial);
        h.ctx().reload_date_range();
        let sent = h.drain();

        h.ctx().handle_result(FetchResult {
            input: InputKind::Ephemeris,
            generation: find(&sent, InputKind::Ephemeris).generation,
            outcome: Ok(spice_table(&[])),
        });
        h.ctx().handle_result(FetchResult {
            input: InputKind::Whiskers,
            generation: find(&sent, InputKind::Whiskers).generation,
            outcome: Err("http 500".into()),
        });

        assert!(matches!(
            h.coordinator.state(InputKind::Ephemeris),
            InputState::Failed { .. }
        ));
        assert_eq!(
            h.coordinator
                .first_failure(&[InputKind::Whiskers])
                .map(|(_, reason)| reason),
            Some("http 500")
        );
        // no model request without an ephemeris
        assert!(h.drain().is_empty());
    }

    #[test]
    fn frame_change_reingests_without_fetching() {
        let mut h = Harness::new(ReferenceFrame::Inertial);
        h.ctx().reload_date_range();
        let sent = h.drain();
        h.ctx().handle_result(FetchResult {
            input: InputKind::Ephemeris,
            generation: find(&sent, InputKind::Ephemeris).generation,
            outcome: Ok(spice_table(&[10.0])),
        });
        h.drain();
        let before = h.coordinator.current(InputKind::Ephemeris);

        h.transformer.set_frame(ReferenceFrame::BodyFixed);
        h.ctx().reingest_ephemeris();

        assert!(h.drain().is_empty());
        assert!(h.coordinator.is_ready(InputKind::Ephemeris));
        assert_ne!(h.coordinator.current(InputKind::Ephemeris), before);
        let products = h.ephemeris.products.as_ref().unwrap();
        assert_eq!(products.frame, ReferenceFrame::BodyFixed);
        assert_eq!(h.ephemeris.rows.len(), 1);
    }

    #[test]
    fn model_result_is_installed_for_the_requested_season() {
        let mut h = Harness::new(ReferenceFrame::Inertial);
        h.ctx().reload_date_range();
        let sent = h.drain();
        h.ctx().handle_result(FetchResult {
            input: InputKind::Ephemeris,
            generation: find(&sent, InputKind::Ephemeris).generation,
            outcome: Ok(spice_table(&[200.0])),
        });
        let model = find(&h.drain(), InputKind::Model).generation;

        h.ctx().handle_result(FetchResult {
            input: InputKind::Model,
            generation: model,
            outcome: Ok(DataTable {
                kind: DatasetKind::Mgitm,
                rows: vec![
                    vec!["0".into(), "0".into(), "1".into()],
                    vec!["0".into(), "5".into(), "2".into()],
                ],
            }),
        });
        assert!(h.coordinator.all_ready(&[InputKind::Ephemeris, InputKind::Model]));
        assert_eq!(h.model.season, Some(180));
        assert_eq!(h.model.grid.as_ref().map(|g| g.width()), Some(2));
    }

    #[test]
    fn path_colors_align_once_both_tables_are_in() {
        let mut h = Harness::new(ReferenceFrame::Inertial);
        h.ctx().reload_date_range();
        let sent = h.drain();

        h.ctx().handle_result(FetchResult {
            input: InputKind::PathColor,
            generation: find(&sent, InputKind::PathColor).generation,
            outcome: Ok(DataTable {
                kind: DatasetKind::Ngims,
                rows: vec![vec!["2019-06-01T00:01:00Z".into(), "7".into()]],
            }),
        });
        h.ctx().handle_result(FetchResult {
            input: InputKind::Ephemeris,
            generation: find(&sent, InputKind::Ephemeris).generation,
            outcome: Ok(spice_table(&[1.0, 2.0, 3.0])),
        });
        assert_eq!(h.path_color.values, vec![None, Some(7.0), None]);
        assert_eq!(h.path_color.colors.len(), 3);
    }
}
