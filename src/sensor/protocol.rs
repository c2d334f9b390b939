//! Line protocol spoken by the sensor microcontroller.
//!
//! The device prints one command per line. Only `SENSOR_DETECTED` means
//! anything; other lines are boot chatter or debug output.

use tracing::warn;

pub const SENSOR_DETECTED: &str = "SENSOR_DETECTED";

/// Longest unterminated line kept before the buffer is discarded.
pub const MAX_LINE_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorCommand {
    Detected,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> SensorCommand {
    match line.trim() {
        "" => SensorCommand::Empty,
        SENSOR_DETECTED => SensorCommand::Detected,
        other => SensorCommand::Unknown(other.to_string()),
    }
}

/// Accumulates bytes from the serial stream and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Set while discarding an overlong line; cleared by the next newline.
    overflowed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return every line completed by them, trimmed.
    /// The trailing partial line stays buffered.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            lines.push(text.trim().to_string());
            self.overflowed = false;
        }

        if self.pending.len() > MAX_LINE_LEN {
            if !self.overflowed {
                warn!(
                    "serial line exceeded {} bytes without a newline, discarding",
                    MAX_LINE_LEN
                );
                self.overflowed = true;
            }
            self.pending.clear();
        }
        lines
    }

    /// Bytes received since the last line terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
