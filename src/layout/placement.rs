use crate::config::DisplayConfig;
use crate::models::{ContainerSize, Placement};

/// Aspect ratio of decoded media, or `fallback` while the size is unknown.
pub fn compute_aspect_ratio(dimensions: (u32, u32), fallback: f64) -> f64 {
    let (width, height) = dimensions;
    if width > 0 && height > 0 {
        width as f64 / height as f64
    } else {
        fallback
    }
}

/// Reports the size of the element videos are positioned in.
pub trait Container {
    /// `None` when the container does not exist or cannot be measured.
    fn measure(&self) -> Option<ContainerSize>;
}

/// `value.max(min).min(max)`; unlike `f64::clamp` this never panics when
/// `max < min`, in which case `max` wins.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Start and target rectangles of an entry slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPlan {
    pub start: Placement,
    pub target: Placement,
}

/// Computes where a row's video sits inside the container.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    row_height_px: f64,
    entry_offset_px: f64,
    fallback_aspect: f64,
}

impl PlacementEngine {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            row_height_px: config.row_height_px,
            entry_offset_px: config.entry_offset_px,
            fallback_aspect: config.fallback_aspect,
        }
    }

    pub fn fallback_aspect(&self) -> f64 {
        self.fallback_aspect
    }

    /// Clamped rectangle for a video at `x` on `row`.
    ///
    /// Height is the row height and width follows the aspect ratio. Returns
    /// `None` when the container could not be measured.
    pub fn compute(
        &self,
        row: usize,
        x: f64,
        aspect: f64,
        container: Option<ContainerSize>,
    ) -> Option<Placement> {
        let container = container?;
        let height = self.row_height_px;
        let width = height * aspect;
        let raw_left = if x.is_finite() { x } else { 0.0 };
        let left = clamp(raw_left, 0.0, container.width - width).max(0.0);
        let max_top = (container.height - height).max(0.0);
        let top = clamp(row as f64 * self.row_height_px, 0.0, max_top);

        Some(Placement {
            row,
            left,
            top,
            width,
            height,
        })
    }

    /// Target placement plus a start placement offset to the right, for the
    /// slide-in. The start falls back to the target if it cannot be computed.
    pub fn plan_entry(
        &self,
        row: usize,
        target_x: f64,
        aspect: f64,
        container: Option<ContainerSize>,
    ) -> Option<EntryPlan> {
        let target = self.compute(row, target_x, aspect, container)?;
        let start = self
            .compute(row, target_x + self.entry_offset_px, aspect, container)
            .unwrap_or(target);
        Some(EntryPlan { start, target })
    }
}
