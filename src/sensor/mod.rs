//! Bridge from the hardware presence sensor to the playback state machine.

pub mod endpoint;
pub mod protocol;
pub mod source;

pub use protocol::SensorCommand;
pub use source::open_sensor_source;
