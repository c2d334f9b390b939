use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageReader;
use tracing::info;

use crate::config::AssetPaths;

pub const VIDEO_BASENAME: &str = "agent-output";

/// Checked in this order; the first existing file wins.
pub const VIDEO_EXTENSIONS: &[&str] = &["webm", "mov", "mp4"];

/// The looping video shown on every row, if one is installed.
pub fn resolve_video_file(assets: &AssetPaths) -> Option<PathBuf> {
    let found = VIDEO_EXTENSIONS
        .iter()
        .map(|ext| assets.media_dir.join(format!("{VIDEO_BASENAME}.{ext}")))
        .find(|path| path.is_file());

    if found.is_none() {
        info!(
            "video file missing: {}",
            assets
                .media_dir
                .join(format!("{VIDEO_BASENAME}.[{}]", VIDEO_EXTENSIONS.join(",")))
                .display()
        );
    }
    found
}

/// `price{row_number}_{index}.png`, both 1-based, if the file exists.
pub fn resolve_price_tag_file(
    assets: &AssetPaths,
    row_number: usize,
    index: usize,
) -> Option<PathBuf> {
    let path = assets
        .price_tag_dir()
        .join(format!("price{row_number}_{index}.png"));
    if path.is_file() {
        Some(path)
    } else {
        info!("price tag missing: {}", path.display());
        None
    }
}

/// Pixel size of an image, read from its header.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    let file = File::open(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .context("Failed to guess image format")?
        .into_dimensions()
        .with_context(|| format!("Failed to read dimensions: {:?}", path))
}
