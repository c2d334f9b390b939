//! Display, asset and sensor configuration.
//!
//! The defaults describe the one deployed layout: five 108 px rows across a
//! 1920 px wide panel, with price tags on the first two rows. Deployment
//! specific values (assets location, serial endpoint) come from the
//! environment so the binary itself never needs rebuilding on site.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of rows on the panel.
pub const DISPLAY_ROW_COUNT: usize = 5;

/// Height of every row band in pixels.
pub const ROW_HEIGHT_PX: f64 = 108.0;

/// Nominal panel width, used for tag layout and as a measurement fallback.
pub const DISPLAY_WIDTH_PX: f64 = 1920.0;

/// Video X used when a row has neither an anchor nor a configured X.
pub const DEFAULT_STABLE_X_PX: f64 = 300.0;

/// Offset added to an anchor when its own offset is not a finite number.
pub const DEFAULT_ANCHOR_OFFSET_PX: f64 = 50.0;

/// Horizontal distance the entry slide starts from, right of the target.
pub const STABLE_VIDEO_ENTRY_OFFSET_PX: f64 = 500.0;

pub const STABLE_VIDEO_SLIDE_DURATION: Duration = Duration::from_millis(4000);
pub const STABLE_VIDEO_SETTLE_DURATION: Duration = Duration::from_millis(300);

/// Aspect ratio assumed until the media reports its decoded size.
pub const FALLBACK_VIDEO_ASPECT: f64 = 16.0 / 9.0;

pub const PRICE_TAG_PADDING_PX: f64 = 16.0;

const ASSETS_DIR_ENV: &str = "SHELFVID_ASSETS_DIR";
const SERIAL_PORT_ENV: &str = "SHELFVID_SERIAL_PORT";
const SERIAL_BAUD_ENV: &str = "SHELFVID_SERIAL_BAUD";
const SENSOR_ENV: &str = "SHELFVID_SENSOR";

const DEFAULT_BAUD_RATE: u32 = 9600;

/// Places a row's video relative to one of that row's price tags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagAnchor {
    /// 1-based index into the row's tag positions.
    pub tag_index: usize,
    pub offset_px: f64,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub row_count: usize,
    pub row_height_px: f64,
    pub display_width_px: f64,
    pub default_video_x_px: f64,
    pub entry_offset_px: f64,
    pub slide_duration: Duration,
    pub settle_duration: Duration,
    pub fallback_aspect: f64,
    pub tag_left_padding_px: f64,
    pub tag_right_padding_px: f64,
    /// Price tags per row.
    pub tag_counts: Vec<usize>,
    /// Explicit tag X positions per row. Missing or non-finite entries fall
    /// back to the evenly spaced layout.
    pub tag_x_overrides: Vec<Option<Vec<f64>>>,
    /// Video X per row when no anchor applies.
    pub video_x_by_row: Vec<f64>,
    pub video_anchors: Vec<Option<TagAnchor>>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            row_count: DISPLAY_ROW_COUNT,
            row_height_px: ROW_HEIGHT_PX,
            display_width_px: DISPLAY_WIDTH_PX,
            default_video_x_px: DEFAULT_STABLE_X_PX,
            entry_offset_px: STABLE_VIDEO_ENTRY_OFFSET_PX,
            slide_duration: STABLE_VIDEO_SLIDE_DURATION,
            settle_duration: STABLE_VIDEO_SETTLE_DURATION,
            fallback_aspect: FALLBACK_VIDEO_ASPECT,
            tag_left_padding_px: PRICE_TAG_PADDING_PX,
            tag_right_padding_px: PRICE_TAG_PADDING_PX,
            tag_counts: vec![17, 14, 0, 0, 0],
            tag_x_overrides: vec![None; DISPLAY_ROW_COUNT],
            video_x_by_row: vec![950.0, 350.0, 950.0, 300.0, 300.0],
            video_anchors: vec![
                Some(TagAnchor {
                    tag_index: 1,
                    offset_px: 40.0,
                }),
                None,
                None,
                None,
                None,
            ],
        }
    }
}

impl DisplayConfig {
    /// Total height of the row grid.
    pub fn grid_height_px(&self) -> f64 {
        self.row_height_px * self.row_count as f64
    }

    pub fn tag_count(&self, row: usize) -> usize {
        self.tag_counts.get(row).copied().unwrap_or(0)
    }
}

/// Filesystem locations of the media the display shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub media_dir: PathBuf,
}

impl AssetPaths {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }

    /// `SHELFVID_ASSETS_DIR`, else `assets/media` beside the executable,
    /// else `assets/media` under the working directory.
    pub fn discover() -> Self {
        if let Some(dir) = std::env::var_os(ASSETS_DIR_ENV).filter(|v| !v.is_empty()) {
            return Self::new(PathBuf::from(dir));
        }

        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("assets").join("media")));
        match beside_exe {
            Some(dir) if dir.is_dir() => Self::new(dir),
            _ => Self::new(Path::new("assets").join("media")),
        }
    }

    pub fn price_tag_dir(&self) -> PathBuf {
        self.media_dir.join("price-tag")
    }
}

/// Serial sensor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    pub enabled: bool,
    /// Exact endpoint path that wins over heuristic selection when present.
    pub port_override: Option<String>,
    pub baud_rate: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port_override: None,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl SensorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(SENSOR_ENV) {
            let value = value.trim().to_ascii_lowercase();
            config.enabled = !matches!(value.as_str(), "0" | "off" | "false" | "no");
        }

        config.port_override = lookup(SERIAL_PORT_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(raw) = lookup(SERIAL_BAUD_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(baud) if baud > 0 => config.baud_rate = baud,
                _ => tracing::warn!("invalid {}={:?}, using {}", SERIAL_BAUD_ENV, raw, DEFAULT_BAUD_RATE),
            }
        }

        config
    }
}
