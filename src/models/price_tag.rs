use std::path::PathBuf;

/// One static price-tag image on a row.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTag {
    pub x: f64,
    pub source: PathBuf,
}

/// Price tags per row, built once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTagLayout {
    rows: Vec<Vec<PriceTag>>,
}

impl PriceTagLayout {
    pub fn new(rows: Vec<Vec<PriceTag>>) -> Self {
        Self { rows }
    }

    pub fn row(&self, row: usize) -> &[PriceTag] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(row, tag)` in row order, then tag order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PriceTag)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row, tags)| tags.iter().map(move |tag| (row, tag)))
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
