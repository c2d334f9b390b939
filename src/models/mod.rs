pub mod placement;
pub mod price_tag;

pub use placement::*;
pub use price_tag::*;
