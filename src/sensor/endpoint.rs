//! Picking the serial endpoint the sensor board is attached to.

use serialport::{SerialPortInfo, SerialPortType};
use tracing::{debug, info, warn};

/// USB vendor IDs of boards the sensor firmware ships on.
const KNOWN_VENDOR_IDS: &[u16] = &[
    0x2341, // Arduino
    0x1A86, // WCH CH340
    0x0403, // FTDI
    0x10C4, // Silicon Labs CP210x
    0x303A, // Espressif
    0x2E8A, // Raspberry Pi
];

const KNOWN_VENDOR_NAMES: &[&str] = &[
    "arduino",
    "wch.cn",
    "ch340",
    "ftdi",
    "silicon labs",
    "cp210",
    "espressif",
    "raspberry pi",
];

/// Names of endpoints that are never the sensor.
const EXCLUDED_SIGNATURES: &[&str] = &["bluetooth", "debug-console", "wlan-debug"];

/// Identifying metadata of one available endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortCandidate {
    pub path: String,
    pub vendor_id: Option<u16>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl PortCandidate {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    fn is_usb(&self) -> bool {
        self.vendor_id.is_some()
    }

    fn is_excluded(&self) -> bool {
        let haystack = self.descriptor();
        EXCLUDED_SIGNATURES.iter().any(|sig| haystack.contains(sig))
    }

    fn is_known_board(&self) -> bool {
        if self
            .vendor_id
            .is_some_and(|vid| KNOWN_VENDOR_IDS.contains(&vid))
        {
            return true;
        }
        let haystack = self.descriptor();
        KNOWN_VENDOR_NAMES.iter().any(|name| haystack.contains(name))
    }

    fn descriptor(&self) -> String {
        [
            Some(self.path.as_str()),
            self.manufacturer.as_deref(),
            self.product.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}

impl From<SerialPortInfo> for PortCandidate {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                path: info.port_name,
                vendor_id: Some(usb.vid),
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            _ => Self::new(info.port_name),
        }
    }
}

/// Choose the endpoint to open.
///
/// An available override wins. Otherwise a known microcontroller board,
/// then any other USB serial device; excluded signatures never match.
pub fn select_endpoint(
    ports: &[PortCandidate],
    port_override: Option<&str>,
) -> Option<PortCandidate> {
    if let Some(wanted) = port_override {
        if let Some(port) = ports.iter().find(|p| p.path == wanted) {
            info!("serial override matched {}", wanted);
            return Some(port.clone());
        }
        warn!("serial override {} not available", wanted);
    }

    let eligible: Vec<&PortCandidate> = ports.iter().filter(|p| !p.is_excluded()).collect();
    for port in ports.iter().filter(|p| p.is_excluded()) {
        debug!("skipping excluded serial endpoint {}", port.path);
    }

    eligible
        .iter()
        .find(|p| p.is_known_board())
        .or_else(|| eligible.iter().find(|p| p.is_usb()))
        .map(|p| (*p).clone())
}

/// Enumerate serial endpoints on this machine.
pub fn available_endpoints() -> anyhow::Result<Vec<PortCandidate>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(PortCandidate::from).collect())
}
