//! One reusable video surface per row.
//!
//! Row 0 adopts the template surface itself; every other row gets a deep
//! copy of the template the first time it is asked for. Surfaces are never
//! dropped while the pool lives.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::surface::{SurfaceFactory, VideoSurface};

/// How a pooled surface came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOrigin {
    /// The template surface, used in place for row 0.
    Adopted,
    /// A copy of the template made for another row.
    Cloned,
}

#[derive(Debug)]
pub struct PooledVideo<S> {
    pub id: String,
    pub row: usize,
    pub origin: VideoOrigin,
    pub surface: S,
}

impl<S> PooledVideo<S> {
    fn adopt(row: usize, id: String, surface: S) -> Self {
        Self {
            id,
            row,
            origin: VideoOrigin::Adopted,
            surface,
        }
    }

    fn cloned(row: usize, id: String, surface: S) -> Self {
        Self {
            id,
            row,
            origin: VideoOrigin::Cloned,
            surface,
        }
    }
}

pub struct VideoPool<F: SurfaceFactory> {
    factory: F,
    videos: BTreeMap<usize, PooledVideo<F::Surface>>,
}

impl<F: SurfaceFactory> VideoPool<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            videos: BTreeMap::new(),
        }
    }

    /// Configure the template and adopt it as row 0's surface.
    pub fn initialize_template(&mut self, mut template: F::Surface) {
        template.set_muted(true);
        template.set_looping(false);
        if let Err(err) = template.reload() {
            warn!("template reload failed: {}", err);
        }
        let id = template.id().to_string();
        tracing::info!(
            "template ready src={}",
            template
                .source()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );
        self.videos.insert(0, PooledVideo::adopt(0, id, template));
    }

    pub fn has_template(&self) -> bool {
        self.videos.contains_key(&0)
    }

    /// The surface for `row`, creating it from the template on first use.
    pub fn acquire(&mut self, row: usize) -> Option<&mut PooledVideo<F::Surface>> {
        if !self.videos.contains_key(&row) {
            let video = self.clone_for_row(row)?;
            self.videos.insert(row, video);
        }
        self.videos.get_mut(&row)
    }

    pub fn get(&self, row: usize) -> Option<&PooledVideo<F::Surface>> {
        self.videos.get(&row)
    }

    pub fn get_mut(&mut self, row: usize) -> Option<&mut PooledVideo<F::Surface>> {
        self.videos.get_mut(&row)
    }

    /// Rows that currently own a surface, ascending.
    pub fn rows(&self) -> Vec<usize> {
        self.videos.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    fn clone_for_row(&self, row: usize) -> Option<PooledVideo<F::Surface>> {
        let template = self.videos.get(&0)?;
        let id = format!("{}-r{}", template.id, row);

        let mut surface = match self
            .factory
            .clone_from_template(&template.surface, row, &id)
        {
            Ok(surface) => surface,
            Err(err) => {
                warn!("failed to clone video for row {}: {:#}", row + 1, err);
                return None;
            }
        };

        surface.set_muted(true);
        surface.set_looping(false);
        surface.pause();
        surface.rewind();
        if let Err(err) = surface.reload() {
            debug!("reload of {} failed: {}", id, err);
        }

        Some(PooledVideo::cloned(row, id, surface))
    }
}
