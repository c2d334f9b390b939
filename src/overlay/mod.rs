pub mod price_tags;

pub use price_tags::build_price_tag_layout;
