use crate::config::{DisplayConfig, TagAnchor, DEFAULT_ANCHOR_OFFSET_PX};

/// Evenly spaced X positions across `width_px`.
///
/// A single position is centered in the usable width; two or more span from
/// `left_padding` to `width_px - right_padding` inclusive. Every value is
/// rounded to a whole pixel.
pub fn generate_even_x_positions(
    count: usize,
    width_px: f64,
    left_padding: f64,
    right_padding: f64,
) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let usable_width = (width_px - left_padding - right_padding).max(0.0);
    if count == 1 {
        return vec![(left_padding + usable_width / 2.0).round()];
    }
    let step = usable_width / (count - 1) as f64;
    (0..count)
        .map(|i| (left_padding + step * i as f64).round())
        .collect()
}

/// Resolves price-tag X positions and the video anchor X for each row.
#[derive(Debug, Clone)]
pub struct GeometryResolver {
    display_width_px: f64,
    left_padding: f64,
    right_padding: f64,
    default_video_x_px: f64,
    tag_counts: Vec<usize>,
    tag_x_overrides: Vec<Option<Vec<f64>>>,
    video_x_by_row: Vec<f64>,
    video_anchors: Vec<Option<TagAnchor>>,
}

impl GeometryResolver {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            display_width_px: config.display_width_px,
            left_padding: config.tag_left_padding_px,
            right_padding: config.tag_right_padding_px,
            default_video_x_px: config.default_video_x_px,
            tag_counts: config.tag_counts.clone(),
            tag_x_overrides: config.tag_x_overrides.clone(),
            video_x_by_row: config.video_x_by_row.clone(),
            video_anchors: config.video_anchors.clone(),
        }
    }

    /// Tag positions for `row`, one per configured tag.
    ///
    /// Override entries that are missing or not finite are replaced by the
    /// evenly spaced position at the same index.
    pub fn resolve_positions(&self, row: usize) -> Vec<f64> {
        let count = self.tag_counts.get(row).copied().unwrap_or(0);
        if count == 0 {
            return Vec::new();
        }

        let generated = generate_even_x_positions(
            count,
            self.display_width_px,
            self.left_padding,
            self.right_padding,
        );
        let overrides = self
            .tag_x_overrides
            .get(row)
            .and_then(|o| o.as_deref())
            .unwrap_or(&[]);

        generated
            .iter()
            .enumerate()
            .map(|(i, fallback)| match overrides.get(i) {
                Some(x) if x.is_finite() => *x,
                _ => *fallback,
            })
            .collect()
    }

    /// X the row's video settles at.
    pub fn resolve_row_anchor_x(&self, row: usize) -> f64 {
        if let Some(anchor) = self.video_anchors.get(row).copied().flatten() {
            let positions = self.resolve_positions(row);
            let idx = anchor.tag_index.saturating_sub(1);
            if let Some(tag_x) = positions.get(idx) {
                let offset = if anchor.offset_px.is_finite() {
                    anchor.offset_px
                } else {
                    DEFAULT_ANCHOR_OFFSET_PX
                };
                return tag_x + offset;
            }
        }

        match self.video_x_by_row.get(row) {
            Some(x) if x.is_finite() => *x,
            _ => self.default_video_x_px,
        }
    }
}
