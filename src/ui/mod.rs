pub mod animator;
pub mod keybindings;
pub mod window;

pub use window::KioskWindow;
