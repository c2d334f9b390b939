pub mod geometry;
pub mod placement;
pub mod transition;

pub use geometry::GeometryResolver;
pub use placement::{compute_aspect_ratio, Container, PlacementEngine};
pub use transition::{RectMotion, TransitionTiming};
