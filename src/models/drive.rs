use serde::Serialize;
use std::fmt;

/// Routing identifier for one disk behind a multi-bay USB bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BayAddress {
    /// Bridge device node as reported by `smartctl --scan` (e.g. `/dev/sdb`).
    pub bridge:   String,
    /// smartctl `-d` base type for the bridge chipset (e.g. `jmb39x`).
    pub dev_type: String,
    pub bay:      u8,
}

impl BayAddress {
    pub fn new(bridge: impl Into<String>, dev_type: impl Into<String>, bay: u8) -> Self {
        Self { bridge: bridge.into(), dev_type: dev_type.into(), bay }
    }

    /// Value passed to `smartctl -d`: `jmb39x,0`.
    pub fn device_arg(&self) -> String {
        format!("{},{}", self.dev_type, self.bay)
    }

    /// The `-d <type> <bridge>` argument tail shared by every per-bay query.
    pub fn smartctl_args(&self) -> Vec<String> {
        vec!["-d".into(), self.device_arg(), self.bridge.clone()]
    }
}

impl fmt::Display for BayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bay {}", self.bridge, self.bay)
    }
}

/// Identity snapshot of one physical disk behind one bridge address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveRecord {
    pub serial:         String,
    pub address:        BayAddress,
    pub model:          String,
    pub capacity_bytes: u64,
}

impl DriveRecord {
    /// Returns None unless the serial is non-empty and the capacity positive.
    pub fn new(serial: &str, address: BayAddress, model: Option<&str>, capacity_bytes: u64) -> Option<Self> {
        let serial = serial.trim();
        if serial.is_empty() || capacity_bytes == 0 {
            return None;
        }
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown");
        Some(Self {
            serial: serial.to_string(),
            address,
            model: model.to_string(),
            capacity_bytes,
        })
    }

    /// Serial reduced to characters that are safe in a file name.
    pub fn file_stem(&self) -> String {
        sanitize_serial(&self.serial)
    }
}

pub fn sanitize_serial(serial: &str) -> String {
    serial
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}
