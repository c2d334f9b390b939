//! Per-row stable video playback.
//!
//! Each row is either idle or playing its stable video in a loop. Surface
//! notifications (metadata ready, playback ended) arrive as `SurfaceEvent`s
//! and are routed through the listener currently installed on the row, so a
//! stopped row simply has no listener left for a late event to hit.
//!
//! Sensor restarts rewind every playing row at once and hold a
//! `SensorRestartLock` until each of those rows has played through once.

use std::mem;

use tracing::{debug, info, warn};

use super::restart_lock::SensorRestartLock;
use crate::config::DisplayConfig;
use crate::layout::{
    compute_aspect_ratio, Container, GeometryResolver, PlacementEngine, TransitionTiming,
};
use crate::models::{ContainerSize, Placement};
use crate::video::pool::VideoPool;
use crate::video::surface::{
    SurfaceEvent, SurfaceEventKind, SurfaceFactory, VideoSurface,
};

/// What happens when a row's video reaches its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EndListener {
    #[default]
    None,
    /// Replay from the start with a fresh entry slide.
    Loop,
    /// Count the row as finished for the sensor restart, then loop.
    PendingRestart,
}

#[derive(Debug, Clone, Default)]
struct RowState {
    stable: bool,
    playing: bool,
    end_listener: EndListener,
    /// One-shot: recalculate placements when decoded size arrives.
    awaiting_metadata: bool,
}

impl RowState {
    fn is_active(&self) -> bool {
        self.stable && self.playing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerOptions {
    /// A trigger on a playing row stops it.
    pub allow_toggle_off: bool,
    /// A trigger on a playing row stops and restarts it.
    pub force_restart: bool,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            allow_toggle_off: true,
            force_restart: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    ToggledOff,
    InvalidRow,
    NoVideo,
    PlacementFailed,
    PlaybackFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    /// A previous restart is still pending.
    Ignored { pending: usize },
    NoActiveRows,
    Restarted { rows: Vec<usize> },
}

pub struct RowPlayback<F: SurfaceFactory, C: Container> {
    geometry: GeometryResolver,
    engine: PlacementEngine,
    slide: TransitionTiming,
    settle: TransitionTiming,
    pool: VideoPool<F>,
    container: C,
    rows: Vec<RowState>,
    restart_lock: SensorRestartLock,
}

impl<F: SurfaceFactory, C: Container> RowPlayback<F, C> {
    pub fn new(config: &DisplayConfig, pool: VideoPool<F>, container: C) -> Self {
        Self {
            geometry: GeometryResolver::new(config),
            engine: PlacementEngine::new(config),
            slide: TransitionTiming::slide(config.slide_duration, config.settle_duration),
            settle: TransitionTiming::settle(config.settle_duration),
            pool,
            container,
            rows: vec![RowState::default(); config.row_count],
            restart_lock: SensorRestartLock::new(),
        }
    }

    /// Whether `row` is showing its stable video.
    pub fn is_playing(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(RowState::is_active)
    }

    #[cfg(test)]
    pub(crate) fn restart_pending(&self) -> usize {
        self.restart_lock.pending()
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &VideoPool<F> {
        &self.pool
    }

    /// Keyboard trigger for `row`.
    pub fn trigger(&mut self, row: usize, options: TriggerOptions) -> TriggerOutcome {
        if row >= self.rows.len() {
            warn!("trigger for unknown row {}", row + 1);
            return TriggerOutcome::InvalidRow;
        }
        if self.pool.acquire(row).is_none() {
            warn!("video element not found for row {}", row + 1);
            return TriggerOutcome::NoVideo;
        }

        if self.rows[row].is_active() {
            if options.allow_toggle_off && !options.force_restart {
                info!("toggle off row {}", row + 1);
                self.stop(row);
                return TriggerOutcome::ToggledOff;
            }
            if options.force_restart {
                info!("restart row {}", row + 1);
                self.stop(row);
            }
        }

        self.start_row(row)
    }

    /// Stop `row`, detaching its listeners. Safe to call on an idle row.
    pub fn stop(&mut self, row: usize) {
        let Some(state) = self.rows.get_mut(row) else {
            return;
        };
        let listener = mem::take(&mut state.end_listener);
        state.awaiting_metadata = false;
        state.stable = false;
        state.playing = false;

        if listener == EndListener::PendingRestart {
            self.finish_restart(row);
        }

        if let Some(video) = self.pool.get_mut(row) {
            video.surface.pause();
            video.surface.rewind();
            video.surface.hide();
        }
    }

    /// Rewind and replay every playing row, unless a restart is pending.
    pub fn sensor_restart(&mut self) -> RestartOutcome {
        if self.restart_lock.is_locked() {
            let pending = self.restart_lock.pending();
            info!("sensor restart ignored, {} row(s) pending", pending);
            return RestartOutcome::Ignored { pending };
        }

        let active: Vec<usize> = self
            .pool
            .rows()
            .into_iter()
            .filter(|row| self.is_playing(*row))
            .collect();
        if active.is_empty() {
            info!("sensor restart: no active rows");
            return RestartOutcome::NoActiveRows;
        }

        self.restart_lock.try_lock(active.len());
        info!(
            "sensor restart rows={}",
            active
                .iter()
                .map(|row| (row + 1).to_string())
                .collect::<Vec<_>>()
                .join(",")
        );

        let container = self.measure_container();
        for &row in &active {
            let target_x = self.geometry.resolve_row_anchor_x(row);
            let Some(video) = self.pool.get_mut(row) else {
                continue;
            };
            let state = &mut self.rows[row];

            video.surface.pause();
            state.end_listener = EndListener::PendingRestart;

            let aspect = compute_aspect_ratio(
                video.surface.video_dimensions(),
                self.engine.fallback_aspect(),
            );
            match self.engine.compute(row, target_x, aspect, container) {
                Some(placement) => {
                    video.surface.place(&placement, TransitionTiming::INSTANT);
                    video.surface.commit_layout();
                }
                None => warn!("restart placement failed for row {}", row + 1),
            }

            video.surface.rewind();
            match video.surface.play() {
                Ok(()) => state.playing = true,
                Err(err) => {
                    warn!("sensor restart play failed row {}: {}", row + 1, err);
                    self.stop(row);
                }
            }
        }

        RestartOutcome::Restarted { rows: active }
    }

    /// Route a surface notification to the row's listeners.
    pub fn handle_event(&mut self, event: SurfaceEvent) {
        let Some(state) = self.rows.get_mut(event.row) else {
            debug!("event for unknown row {}", event.row + 1);
            return;
        };

        match event.kind {
            SurfaceEventKind::MetadataReady => {
                if mem::take(&mut state.awaiting_metadata) {
                    debug!("metadata ready row {}", event.row + 1);
                    self.recalculate_placements();
                }
            }
            SurfaceEventKind::Ended => {
                let current = self.pool.get(event.row).map(|v| v.surface.cycle());
                if current != Some(event.cycle) {
                    debug!("stale end row {} ignored", event.row + 1);
                    return;
                }
                state.playing = false;
                match mem::take(&mut state.end_listener) {
                    EndListener::None => debug!("ended row {} with no listener", event.row + 1),
                    EndListener::Loop => self.replay_loop(event.row),
                    EndListener::PendingRestart => {
                        self.finish_restart(event.row);
                        self.replay_loop(event.row);
                    }
                }
            }
        }
    }

    /// Move every stable row to its settled placement, e.g. after a resize
    /// or once decoded dimensions are known.
    pub fn recalculate_placements(&mut self) {
        let stable: Vec<usize> = self
            .pool
            .rows()
            .into_iter()
            .filter(|row| self.rows.get(*row).is_some_and(|s| s.stable))
            .collect();
        if stable.is_empty() {
            return;
        }

        let container = self.measure_container();
        for row in stable {
            let target_x = self.geometry.resolve_row_anchor_x(row);
            let Some(video) = self.pool.get_mut(row) else {
                continue;
            };
            let aspect = compute_aspect_ratio(
                video.surface.video_dimensions(),
                self.engine.fallback_aspect(),
            );
            if let Some(placement) = self.engine.compute(row, target_x, aspect, container) {
                video.surface.place(&placement, self.settle);
            }
        }
    }

    fn start_row(&mut self, row: usize) -> TriggerOutcome {
        let target_x = self.geometry.resolve_row_anchor_x(row);
        let container = self.measure_container();
        let Some(video) = self.pool.get_mut(row) else {
            return TriggerOutcome::NoVideo;
        };
        let state = &mut self.rows[row];

        video.surface.set_looping(false);
        // A row still owing a sensor restart keeps owing it until this new
        // cycle ends or the row is stopped.
        let on_end = match state.end_listener {
            EndListener::PendingRestart => EndListener::PendingRestart,
            EndListener::None | EndListener::Loop => EndListener::Loop,
        };

        let Some(placement) = apply_entry(
            &self.engine,
            &mut video.surface,
            row,
            target_x,
            container,
            self.slide,
        ) else {
            warn!("placement failed for row {}", row + 1);
            return TriggerOutcome::PlacementFailed;
        };

        state.stable = true;
        video.surface.set_muted(true);
        info!(
            "play row {} top={} left={} src={}",
            row + 1,
            placement.top.round(),
            placement.left.round(),
            source_label(&video.surface)
        );

        video.surface.rewind();
        if let Err(err) = video.surface.reload() {
            debug!("reload before play failed row {}: {}", row + 1, err);
        }
        state.awaiting_metadata |= needs_metadata(&video.surface);
        state.end_listener = on_end;

        if start_with_retry(&mut video.surface, row) {
            state.playing = true;
            TriggerOutcome::Started
        } else {
            self.stop(row);
            TriggerOutcome::PlaybackFailed
        }
    }

    fn replay_loop(&mut self, row: usize) {
        if !self.rows[row].stable {
            return;
        }
        let target_x = self.geometry.resolve_row_anchor_x(row);
        let container = self.measure_container();
        let Some(video) = self.pool.get_mut(row) else {
            return;
        };
        let state = &mut self.rows[row];
        state.end_listener = EndListener::Loop;

        if apply_entry(
            &self.engine,
            &mut video.surface,
            row,
            target_x,
            container,
            self.slide,
        )
        .is_none()
        {
            warn!("loop placement failed for row {}", row + 1);
            self.stop(row);
            return;
        }

        video.surface.rewind();
        state.awaiting_metadata |= needs_metadata(&video.surface);
        match video.surface.play() {
            Ok(()) => state.playing = true,
            Err(err) => {
                warn!("stable loop replay failed row {}: {}", row + 1, err);
                self.stop(row);
            }
        }
    }

    fn finish_restart(&mut self, row: usize) {
        if self.restart_lock.release_one() {
            info!("sensor restart complete");
        } else {
            debug!(
                "row {} finished restart, {} pending",
                row + 1,
                self.restart_lock.pending()
            );
        }
    }

    fn measure_container(&self) -> Option<ContainerSize> {
        let size = self.container.measure();
        if size.is_none() {
            warn!("placement failed: container not found");
        }
        size
    }

    #[cfg(test)]
    pub(crate) fn pool_mut(&mut self) -> &mut VideoPool<F> {
        &mut self.pool
    }
}

/// Two-phase entry: stage and commit the offset start, then transition to
/// the target so the slide has a committed origin.
fn apply_entry<S: VideoSurface>(
    engine: &PlacementEngine,
    surface: &mut S,
    row: usize,
    target_x: f64,
    container: Option<ContainerSize>,
    slide: TransitionTiming,
) -> Option<Placement> {
    let aspect = compute_aspect_ratio(surface.video_dimensions(), engine.fallback_aspect());
    let plan = engine.plan_entry(row, target_x, aspect, container)?;
    surface.place(&plan.start, TransitionTiming::INSTANT);
    surface.commit_layout();
    surface.place(&plan.target, slide);
    Some(plan.target)
}

fn start_with_retry<S: VideoSurface>(surface: &mut S, row: usize) -> bool {
    let err = match surface.play() {
        Ok(()) => return true,
        Err(err) => err,
    };
    warn!("play error row {}: {}", row + 1, err);

    if let Err(err) = surface.reload() {
        debug!("reload for retry failed row {}: {}", row + 1, err);
    }
    match surface.play() {
        Ok(()) => true,
        Err(err) => {
            warn!("retry stable play failed row {}: {}", row + 1, err);
            false
        }
    }
}

fn needs_metadata<S: VideoSurface>(surface: &S) -> bool {
    let (width, height) = surface.video_dimensions();
    width == 0 || height == 0
}

fn source_label<S: VideoSurface>(surface: &S) -> String {
    surface
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::video::surface::fake::{Call, FakeFactory, FakeSurface};
    use crate::video::surface::PlaybackError;

    struct TestContainer(Rc<Cell<Option<ContainerSize>>>);

    impl Container for TestContainer {
        fn measure(&self) -> Option<ContainerSize> {
            self.0.get()
        }
    }

    type TestPlayback = RowPlayback<FakeFactory, TestContainer>;

    fn playback_with(config: DisplayConfig) -> (TestPlayback, Rc<Cell<Option<ContainerSize>>>) {
        let mut pool = VideoPool::new(FakeFactory::default());
        pool.initialize_template(FakeSurface::new("stableVideo", 0));
        let size = Rc::new(Cell::new(Some(ContainerSize::new(1920.0, 540.0))));
        let playback = RowPlayback::new(&config, pool, TestContainer(size.clone()));
        (playback, size)
    }

    fn playback() -> TestPlayback {
        playback_with(DisplayConfig::default()).0
    }

    fn surface(playback: &TestPlayback, row: usize) -> &FakeSurface {
        &playback.pool().get(row).unwrap().surface
    }

    fn surface_mut(playback: &mut TestPlayback, row: usize) -> &mut FakeSurface {
        &mut playback.pool_mut().get_mut(row).unwrap().surface
    }

    fn push_play_result(playback: &TestPlayback, result: Result<(), PlaybackError>) {
        surface(playback, 0)
            .script
            .borrow_mut()
            .play_results
            .push_back(result);
    }

    /// End of the cycle the row's surface is currently in.
    fn ended(playback: &TestPlayback, row: usize) -> SurfaceEvent {
        SurfaceEvent::new(row, surface(playback, row).cycle, SurfaceEventKind::Ended)
    }

    fn slide() -> TransitionTiming {
        TransitionTiming::slide(Duration::from_millis(4000), Duration::from_millis(300))
    }

    #[test]
    fn trigger_idle_row_starts_with_entry_slide() {
        let mut playback = playback();
        assert_eq!(
            playback.trigger(1, TriggerOptions::default()),
            TriggerOutcome::Started
        );
        assert!(playback.is_playing(1));

        let video = surface(&playback, 1);
        assert!(video.visible);
        assert!(video.playing);

        let places: Vec<&Call> = video
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Place(..) | Call::Commit))
            .collect();
        assert_eq!(places.len(), 3);
        match (places[0], places[1], places[2]) {
            (Call::Place(start, t0), Call::Commit, Call::Place(target, t1)) => {
                assert_eq!(*t0, TransitionTiming::INSTANT);
                assert_eq!(*t1, slide());
                assert_eq!(target.left, 350.0);
                assert_eq!(start.left, 850.0);
                assert_eq!(target.top, 108.0);
            }
            other => panic!("unexpected placement sequence {:?}", other),
        }
        assert_eq!(video.count(&Call::Play), 1);
    }

    #[test]
    fn second_trigger_toggles_off() {
        let mut playback = playback();
        playback.trigger(3, TriggerOptions::default());
        assert_eq!(
            playback.trigger(3, TriggerOptions::default()),
            TriggerOutcome::ToggledOff
        );
        assert!(!playback.is_playing(3));

        let video = surface(&playback, 3);
        assert!(!video.visible);
        assert!(!video.playing);
        assert_eq!(
            &video.calls[video.calls.len() - 3..],
            &[Call::Pause, Call::Rewind, Call::Hide]
        );
    }

    #[test]
    fn toggle_round_trip_can_start_again() {
        let mut playback = playback();
        playback.trigger(0, TriggerOptions::default());
        playback.trigger(0, TriggerOptions::default());
        assert_eq!(
            playback.trigger(0, TriggerOptions::default()),
            TriggerOutcome::Started
        );
        assert!(playback.is_playing(0));
        assert_eq!(playback.pool().len(), 1);
    }

    #[test]
    fn force_restart_stops_then_reenters() {
        let mut playback = playback();
        playback.trigger(2, TriggerOptions::default());
        let outcome = playback.trigger(
            2,
            TriggerOptions {
                allow_toggle_off: true,
                force_restart: true,
            },
        );
        assert_eq!(outcome, TriggerOutcome::Started);
        assert!(playback.is_playing(2));
        let video = surface(&playback, 2);
        assert_eq!(video.count(&Call::Hide), 1);
        assert_eq!(video.count(&Call::Play), 2);
    }

    #[test]
    fn trigger_without_toggle_off_reenters() {
        let mut playback = playback();
        playback.trigger(4, TriggerOptions::default());
        let outcome = playback.trigger(
            4,
            TriggerOptions {
                allow_toggle_off: false,
                force_restart: false,
            },
        );
        assert_eq!(outcome, TriggerOutcome::Started);
        assert_eq!(surface(&playback, 4).count(&Call::Hide), 0);
        assert_eq!(surface(&playback, 4).count(&Call::Play), 2);
    }

    #[test]
    fn unmeasurable_container_aborts_without_playing() {
        let (mut playback, size) = playback_with(DisplayConfig::default());
        size.set(None);
        assert_eq!(
            playback.trigger(1, TriggerOptions::default()),
            TriggerOutcome::PlacementFailed
        );
        assert!(!playback.is_playing(1));
        let video = surface(&playback, 1);
        assert_eq!(video.count(&Call::Play), 0);
        assert!(!video.visible);
    }

    #[test]
    fn missing_template_reports_no_video() {
        let size = Rc::new(Cell::new(Some(ContainerSize::new(1920.0, 540.0))));
        let mut playback = RowPlayback::new(
            &DisplayConfig::default(),
            VideoPool::new(FakeFactory::default()),
            TestContainer(size),
        );
        assert_eq!(
            playback.trigger(0, TriggerOptions::default()),
            TriggerOutcome::NoVideo
        );
    }

    #[test]
    fn out_of_range_row_is_rejected() {
        let mut playback = playback();
        assert_eq!(
            playback.trigger(5, TriggerOptions::default()),
            TriggerOutcome::InvalidRow
        );
        assert_eq!(playback.pool().len(), 1);
    }

    #[test]
    fn play_failure_is_retried_once() {
        let mut playback = playback();
        push_play_result(&playback, Err(PlaybackError::Rejected("not allowed".into())));
        assert_eq!(
            playback.trigger(0, TriggerOptions::default()),
            TriggerOutcome::Started
        );
        let video = surface(&playback, 0);
        let tail: Vec<&Call> = video
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Play | Call::Reload))
            .collect();
        // template init reload, pre-play reload, failed play, retry reload, play
        assert_eq!(
            tail,
            vec![&Call::Reload, &Call::Reload, &Call::Play, &Call::Reload, &Call::Play]
        );
        assert!(playback.is_playing(0));
    }

    #[test]
    fn failed_retry_gives_up_and_hides() {
        let mut playback = playback();
        push_play_result(&playback, Err(PlaybackError::Rejected("a".into())));
        push_play_result(&playback, Err(PlaybackError::Rejected("b".into())));
        assert_eq!(
            playback.trigger(0, TriggerOptions::default()),
            TriggerOutcome::PlaybackFailed
        );
        assert!(!playback.is_playing(0));
        assert!(!surface(&playback, 0).visible);
    }

    #[test]
    fn natural_end_loops_with_fresh_entry() {
        let mut playback = playback();
        playback.trigger(1, TriggerOptions::default());
        surface_mut(&mut playback, 1).calls.clear();

        playback.handle_event(ended(&playback, 1));
        assert!(playback.is_playing(1));
        let video = surface(&playback, 1);
        assert_eq!(video.count(&Call::Commit), 1);
        assert_eq!(video.count(&Call::Rewind), 1);
        assert_eq!(video.count(&Call::Play), 1);
        assert_eq!(video.last_target().unwrap().1, slide());

        playback.handle_event(ended(&playback, 1));
        assert!(playback.is_playing(1));
        assert_eq!(surface(&playback, 1).count(&Call::Play), 2);
    }

    #[test]
    fn end_after_stop_is_ignored() {
        let mut playback = playback();
        playback.trigger(1, TriggerOptions::default());
        playback.stop(1);
        surface_mut(&mut playback, 1).calls.clear();

        playback.handle_event(ended(&playback, 1));
        assert!(!playback.is_playing(1));
        assert!(surface(&playback, 1).calls.is_empty());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut playback = playback();
        playback.stop(2);
        playback.trigger(2, TriggerOptions::default());
        playback.stop(2);
        playback.stop(2);
        assert!(!playback.is_playing(2));
        assert!(!surface(&playback, 2).visible);
        playback.stop(99);
    }

    #[test]
    fn loop_replay_failure_stops_row() {
        let mut playback = playback();
        playback.trigger(1, TriggerOptions::default());
        push_play_result(&playback, Err(PlaybackError::Rejected("gone".into())));
        playback.handle_event(ended(&playback, 1));
        assert!(!playback.is_playing(1));
        assert!(!surface(&playback, 1).visible);
    }

    #[test]
    fn metadata_recalculates_stable_rows_once() {
        let mut playback = playback();
        playback.trigger(3, TriggerOptions::default());
        surface_mut(&mut playback, 3).dimensions = (1000, 500);
        surface_mut(&mut playback, 3).calls.clear();

        let metadata = SurfaceEvent::new(3, surface(&playback, 3).cycle, SurfaceEventKind::MetadataReady);
        playback.handle_event(metadata);
        let (placement, timing) = surface(&playback, 3).last_target().unwrap();
        assert_eq!(timing, TransitionTiming::settle(Duration::from_millis(300)));
        assert_eq!(placement.width, 216.0);
        assert_eq!(placement.left, 300.0);

        surface_mut(&mut playback, 3).calls.clear();
        playback.handle_event(metadata);
        assert!(surface(&playback, 3).calls.is_empty());
    }

    #[test]
    fn resize_recalculates_only_stable_rows() {
        let (mut playback, size) = playback_with(DisplayConfig::default());
        playback.trigger(2, TriggerOptions::default());
        playback.trigger(1, TriggerOptions::default());
        playback.trigger(1, TriggerOptions::default());
        surface_mut(&mut playback, 1).calls.clear();

        size.set(Some(ContainerSize::new(1000.0, 540.0)));
        playback.recalculate_placements();

        let (placement, _) = surface(&playback, 2).last_target().unwrap();
        assert!((placement.left - (1000.0 - 192.0)).abs() < 1e-9);
        assert!(surface(&playback, 1).calls.is_empty());
    }

    #[test]
    fn sensor_restart_replays_active_rows_and_debounces() {
        let mut playback = playback();
        playback.trigger(0, TriggerOptions::default());
        playback.trigger(3, TriggerOptions::default());

        assert_eq!(
            playback.sensor_restart(),
            RestartOutcome::Restarted { rows: vec![0, 3] }
        );
        assert_eq!(playback.restart_pending(), 2);
        let video = surface(&playback, 3);
        assert_eq!(video.last_target().unwrap().1, TransitionTiming::INSTANT);
        assert_eq!(video.count(&Call::Play), 2);

        let before: Vec<usize> = [0, 3]
            .iter()
            .map(|r| surface(&playback, *r).calls.len())
            .collect();
        assert_eq!(
            playback.sensor_restart(),
            RestartOutcome::Ignored { pending: 2 }
        );
        let after: Vec<usize> = [0, 3]
            .iter()
            .map(|r| surface(&playback, *r).calls.len())
            .collect();
        assert_eq!(before, after);

        playback.handle_event(ended(&playback, 0));
        assert_eq!(playback.restart_pending(), 1);
        assert!(playback.is_playing(0));
        // Row 0 is back on its normal loop; a second end must not release again.
        playback.handle_event(ended(&playback, 0));
        assert_eq!(playback.restart_pending(), 1);

        playback.handle_event(ended(&playback, 3));
        assert_eq!(playback.restart_pending(), 0);
        assert!(matches!(
            playback.sensor_restart(),
            RestartOutcome::Restarted { .. }
        ));
    }

    #[test]
    fn sensor_restart_without_active_rows_is_noop() {
        let mut playback = playback();
        playback.trigger(1, TriggerOptions::default());
        playback.stop(1);
        assert_eq!(playback.sensor_restart(), RestartOutcome::NoActiveRows);
        assert_eq!(playback.restart_pending(), 0);
    }

    #[test]
    fn stopping_a_pending_row_counts_as_finished() {
        let mut playback = playback();
        playback.trigger(0, TriggerOptions::default());
        playback.trigger(1, TriggerOptions::default());
        playback.sensor_restart();

        playback.trigger(1, TriggerOptions::default());
        assert_eq!(playback.restart_pending(), 1);
        playback.stop(0);
        assert_eq!(playback.restart_pending(), 0);
        playback.stop(0);
        assert_eq!(playback.restart_pending(), 0);
    }

    #[test]
    fn retrigger_keeps_pending_restart_until_cycle_ends() {
        let mut playback = playback();
        playback.trigger(1, TriggerOptions::default());
        playback.sensor_restart();
        assert_eq!(playback.restart_pending(), 1);

        let reenter = TriggerOptions {
            allow_toggle_off: false,
            force_restart: false,
        };
        assert_eq!(playback.trigger(1, reenter), TriggerOutcome::Started);
        assert_eq!(playback.restart_pending(), 1);

        playback.handle_event(ended(&playback, 1));
        assert_eq!(playback.restart_pending(), 0);
        playback.handle_event(ended(&playback, 1));
        playback.stop(1);
        assert_eq!(playback.restart_pending(), 0);

        playback.trigger(1, TriggerOptions::default());
        assert_eq!(
            playback.sensor_restart(),
            RestartOutcome::Restarted { rows: vec![1] }
        );
    }

    #[test]
    fn end_from_before_a_restart_does_not_release_it() {
        let mut playback = playback();
        playback.trigger(2, TriggerOptions::default());
        let queued = ended(&playback, 2);

        playback.sensor_restart();
        surface_mut(&mut playback, 2).calls.clear();
        playback.handle_event(queued);
        assert_eq!(playback.restart_pending(), 1);
        assert!(playback.is_playing(2));
        assert!(surface(&playback, 2).calls.is_empty());

        playback.handle_event(ended(&playback, 2));
        assert_eq!(playback.restart_pending(), 0);
        assert!(playback.is_playing(2));
    }

    #[test]
    fn restart_play_failure_counts_as_finished() {
        let mut playback = playback();
        playback.trigger(2, TriggerOptions::default());
        push_play_result(&playback, Err(PlaybackError::Unavailable));
        assert_eq!(
            playback.sensor_restart(),
            RestartOutcome::Restarted { rows: vec![2] }
        );
        assert_eq!(playback.restart_pending(), 0);
        assert!(!playback.is_playing(2));
    }

    #[test]
    fn entry_example_for_row_two() {
        let mut config = DisplayConfig::default();
        config.video_x_by_row[2] = 300.0;
        let (mut playback, _) = playback_with(config);
        playback.trigger(2, TriggerOptions::default());

        let video = surface(&playback, 2);
        let placements: Vec<Placement> = video
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Place(p, _) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(placements[0].left, 800.0);
        assert_eq!(placements[1].left, 300.0);
        assert_eq!(placements[1].top, 216.0);
        assert_eq!(placements[1].height, 108.0);
    }
}
