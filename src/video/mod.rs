pub mod player;
pub mod pool;
pub mod surface;

pub use player::MpvSurfaceFactory;
pub use pool::VideoPool;
pub use surface::SurfaceEvent;
