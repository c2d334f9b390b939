use crate::assets::resolve_price_tag_file;
use crate::config::{AssetPaths, DisplayConfig};
use crate::layout::GeometryResolver;
use crate::models::{PriceTag, PriceTagLayout};

/// Collect the price tags to show on each row.
///
/// Tags whose image file is missing are skipped; the remaining tags keep
/// the X position of their own index.
pub fn build_price_tag_layout(config: &DisplayConfig, assets: &AssetPaths) -> PriceTagLayout {
    let geometry = GeometryResolver::new(config);

    let rows = (0..config.row_count)
        .map(|row| {
            let positions = geometry.resolve_positions(row);
            positions
                .iter()
                .enumerate()
                .filter_map(|(i, x)| {
                    let source = resolve_price_tag_file(assets, row + 1, i + 1)?;
                    Some(PriceTag { x: *x, source })
                })
                .collect()
        })
        .collect();

    PriceTagLayout::new(rows)
}
