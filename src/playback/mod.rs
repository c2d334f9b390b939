pub mod restart_lock;
pub mod rows;

pub use rows::{RowPlayback, TriggerOptions};
