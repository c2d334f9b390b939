//! Playable video surfaces as seen by the playback state machine.

use std::path::Path;

use thiserror::Error;

use crate::layout::TransitionTiming;
use crate::models::Placement;

/// Why a surface refused to start or reload playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("no media source assigned")]
    NoSource,
    #[error("player unavailable")]
    Unavailable,
    #[error("playback rejected: {0}")]
    Rejected(String),
}

/// Asynchronous notifications a surface delivers back to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEventKind {
    /// Decoded dimensions became known.
    MetadataReady,
    /// Playback reached the end of the media.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceEvent {
    pub row: usize,
    /// `VideoSurface::cycle` at the time the event was observed.
    pub cycle: u64,
    pub kind: SurfaceEventKind,
}

impl SurfaceEvent {
    pub fn new(row: usize, cycle: u64, kind: SurfaceEventKind) -> Self {
        Self { row, cycle, kind }
    }
}

/// A video element bound to one row.
pub trait VideoSurface {
    fn id(&self) -> &str;
    fn source(&self) -> Option<&Path>;
    /// Decoded `(width, height)`; zero while unknown.
    fn video_dimensions(&self) -> (u32, u32);
    /// Incremented by every `rewind`.
    fn cycle(&self) -> u64;

    fn set_muted(&mut self, muted: bool);
    fn set_looping(&mut self, looping: bool);

    fn pause(&mut self);
    fn rewind(&mut self);
    fn reload(&mut self) -> Result<(), PlaybackError>;
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Move the surface to `placement`, animating with `timing`. Instant
    /// placements are staged until committed or the next frame.
    fn place(&mut self, placement: &Placement, timing: TransitionTiming);
    /// Commit staged geometry so the next transition starts from it.
    fn commit_layout(&mut self);
    fn hide(&mut self);
}

/// Creates per-row surfaces from the template.
pub trait SurfaceFactory {
    type Surface: VideoSurface;

    /// Deep copy of `template` bound to `row`, attached to the display.
    fn clone_from_template(
        &self,
        template: &Self::Surface,
        row: usize,
        id: &str,
    ) -> anyhow::Result<Self::Surface>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! Recording surface used by pool and state machine tests.

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Muted(bool),
        Looping(bool),
        Pause,
        Rewind,
        Reload,
        Play,
        Place(Placement, TransitionTiming),
        Commit,
        Hide,
    }

    /// Shared script of results the next `play`/`reload` calls return.
    #[derive(Debug, Default)]
    pub struct Script {
        pub play_results: VecDeque<Result<(), PlaybackError>>,
        pub reload_results: VecDeque<Result<(), PlaybackError>>,
    }

    #[derive(Debug)]
    pub struct FakeSurface {
        pub id: String,
        pub row: usize,
        pub source: Option<PathBuf>,
        pub dimensions: (u32, u32),
        pub cycle: u64,
        pub calls: Vec<Call>,
        pub playing: bool,
        pub visible: bool,
        pub script: Rc<RefCell<Script>>,
    }

    impl FakeSurface {
        pub fn new(id: &str, row: usize) -> Self {
            Self {
                id: id.to_string(),
                row,
                source: Some(PathBuf::from("agent-output.webm")),
                dimensions: (0, 0),
                cycle: 0,
                calls: Vec::new(),
                playing: false,
                visible: false,
                script: Rc::new(RefCell::new(Script::default())),
            }
        }

        pub fn last_target(&self) -> Option<(Placement, TransitionTiming)> {
            self.calls.iter().rev().find_map(|call| match call {
                Call::Place(p, t) => Some((*p, *t)),
                _ => None,
            })
        }

        pub fn count(&self, wanted: &Call) -> usize {
            self.calls.iter().filter(|c| *c == wanted).count()
        }
    }

    impl VideoSurface for FakeSurface {
        fn id(&self) -> &str {
            &self.id
        }

        fn source(&self) -> Option<&Path> {
            self.source.as_deref()
        }

        fn video_dimensions(&self) -> (u32, u32) {
            self.dimensions
        }

        fn cycle(&self) -> u64 {
            self.cycle
        }

        fn set_muted(&mut self, muted: bool) {
            self.calls.push(Call::Muted(muted));
        }

        fn set_looping(&mut self, looping: bool) {
            self.calls.push(Call::Looping(looping));
        }

        fn pause(&mut self) {
            self.playing = false;
            self.calls.push(Call::Pause);
        }

        fn rewind(&mut self) {
            self.cycle += 1;
            self.calls.push(Call::Rewind);
        }

        fn reload(&mut self) -> Result<(), PlaybackError> {
            self.calls.push(Call::Reload);
            self.script
                .borrow_mut()
                .reload_results
                .pop_front()
                .unwrap_or(Ok(()))
        }

        fn play(&mut self) -> Result<(), PlaybackError> {
            self.calls.push(Call::Play);
            let result = self
                .script
                .borrow_mut()
                .play_results
                .pop_front()
                .unwrap_or(Ok(()));
            self.playing = result.is_ok();
            result
        }

        fn place(&mut self, placement: &Placement, timing: TransitionTiming) {
            self.visible = true;
            self.calls.push(Call::Place(*placement, timing));
        }

        fn commit_layout(&mut self) {
            self.calls.push(Call::Commit);
        }

        fn hide(&mut self) {
            self.visible = false;
            self.calls.push(Call::Hide);
        }
    }

    /// Factory that clones fakes and shares the template's script.
    #[derive(Debug, Default)]
    pub struct FakeFactory {
        pub fail_rows: Vec<usize>,
    }

    impl SurfaceFactory for FakeFactory {
        type Surface = FakeSurface;

        fn clone_from_template(
            &self,
            template: &FakeSurface,
            row: usize,
            id: &str,
        ) -> anyhow::Result<FakeSurface> {
            if self.fail_rows.contains(&row) {
                anyhow::bail!("clone refused for row {}", row);
            }
            let mut surface = FakeSurface::new(id, row);
            surface.source = template.source.clone();
            surface.dimensions = template.dimensions;
            surface.script = template.script.clone();
            Ok(surface)
        }
    }
}
