use crate::util::matcher::DEFAULT_TOLERANCE_BYTES;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Seconds between self-test status polls
    pub poll_interval_sec: u64,
    /// Directory for per-drive log files (relative paths resolve against the cwd)
    pub log_dir: PathBuf,
    /// Consecutive empty status queries before a drive is abandoned. 0 = keep polling forever.
    pub max_poll_failures: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// smartctl -d base type of the bridge chipset; the bay index is appended
    pub dev_type: String,
    /// Bay indices queried behind each bridge
    pub bays: Vec<u8>,
    /// Substring a `smartctl --scan` line must contain to count as a bridge
    pub bridge_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Run a read-only badblocks pass over each mapped drive
    pub enabled: bool,
    /// Maximum byte difference when matching a drive to a block device
    pub tolerance_bytes: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            poll_interval_sec: 60,
            log_dir:           PathBuf::from("baydiag-logs"),
            max_poll_failures: 0,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            dev_type:      "jmb39x".into(),
            bays:          vec![0, 1],
            bridge_filter: "-d sat".into(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { enabled: false, tolerance_bytes: DEFAULT_TOLERANCE_BYTES }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        match try_load() {
            Ok(c)  => c,
            Err(_) => {
                // Write defaults on first run (best-effort)
                let _ = try_write_defaults();
                Config::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("baydiag").join("baydiag.toml"))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    let text = fs::read_to_string(path)?;
    Config::from_toml(&text)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    if path.exists() {
        // Present but unreadable: leave the user's file alone.
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# baydiag configuration\n# Generated on first run, edit freely\n\n{}", text))?;
    Ok(())
}
