use std::io::{self, Read};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use flume::Sender;
use tracing::{error, info, warn};

use super::endpoint::{available_endpoints, select_endpoint, PortCandidate};
use super::protocol::{parse_command, LineBuffer, SensorCommand};
use crate::config::SensorConfig;

const READ_TIMEOUT: Duration = Duration::from_millis(250);
const READ_CHUNK: usize = 256;

/// Something that produces sensor commands.
pub trait SensorSource {
    fn describe(&self) -> String;

    /// Begin delivering commands to `tx`. Returns once delivery has been
    /// set up; commands arrive from a background thread.
    fn start(self: Box<Self>, tx: Sender<SensorCommand>) -> anyhow::Result<()>;
}

/// The sensor capability is absent for this session.
pub struct NoSensor {
    reason: String,
}

impl NoSensor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SensorSource for NoSensor {
    fn describe(&self) -> String {
        format!("no sensor ({})", self.reason)
    }

    fn start(self: Box<Self>, _tx: Sender<SensorCommand>) -> anyhow::Result<()> {
        info!("sensor bridge inactive: {}", self.reason);
        Ok(())
    }
}

/// Sensor board attached over a serial line.
pub struct SerialSensorSource {
    endpoint: PortCandidate,
    baud_rate: u32,
}

impl SerialSensorSource {
    pub fn new(endpoint: PortCandidate, baud_rate: u32) -> Self {
        Self {
            endpoint,
            baud_rate,
        }
    }
}

impl SensorSource for SerialSensorSource {
    fn describe(&self) -> String {
        format!("serial {} @ {} baud", self.endpoint.path, self.baud_rate)
    }

    fn start(self: Box<Self>, tx: Sender<SensorCommand>) -> anyhow::Result<()> {
        let port = serialport::new(&self.endpoint.path, self.baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("failed to open serial port {}", self.endpoint.path))?;

        info!("serial connected: {}", self.describe());

        let path = self.endpoint.path.clone();
        thread::Builder::new()
            .name("sensor-serial".into())
            .spawn(move || match pump_lines(port, &tx) {
                Ok(()) => info!("serial reader for {} stopped", path),
                Err(e) => error!("serial error on {}: {}", path, e),
            })
            .context("failed to spawn serial reader thread")?;

        Ok(())
    }
}

/// Read `reader` until it ends or fails, forwarding every meaningful line.
///
/// Read timeouts are expected on an idle line and do not end the loop. Returns
/// `Ok` when the stream closes or the receiver is gone.
pub fn pump_lines<R: Read>(mut reader: R, tx: &Sender<SensorCommand>) -> io::Result<()> {
    let mut buffer = LineBuffer::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                continue
            }
            Err(e) => return Err(e),
        };

        for line in buffer.push(&chunk[..read]) {
            match parse_command(&line) {
                SensorCommand::Empty => {}
                SensorCommand::Unknown(text) => info!("ignoring serial line: {}", text),
                command => {
                    if tx.send(command).is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Build the source configured for this session.
pub fn open_sensor_source(config: &SensorConfig) -> Box<dyn SensorSource> {
    if !config.enabled {
        return Box::new(NoSensor::new("disabled"));
    }

    let ports = match available_endpoints() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("serial enumeration failed: {}", e);
            return Box::new(NoSensor::new("enumeration failed"));
        }
    };

    match select_endpoint(&ports, config.port_override.as_deref()) {
        Some(endpoint) => Box::new(SerialSensorSource::new(endpoint, config.baud_rate)),
        None => Box::new(NoSensor::new("no serial endpoint found")),
    }
}
