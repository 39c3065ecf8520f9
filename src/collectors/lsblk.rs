use crate::collectors::exec::{args, Runner};
use crate::models::device::{BlockDeviceEntry, CapacityIndex};
use crate::util::json::{str_opt, u64_lenient};
use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub const LSBLK: &str = "lsblk";

/// Whole-disk SCSI/SATA/USB names only: `sda`, `sdz`, `sdaa`. Partitions
/// (`sda1`), loop, optical and NVMe nodes never match.
fn disk_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^sd[a-z]+$").expect("static regex"))
}

/// Run `lsblk --json --bytes -o NAME,SIZE,TYPE` and index the whole disks.
pub fn capacity_index(runner: &dyn Runner) -> Result<CapacityIndex> {
    let out = runner
        .run(LSBLK, &args(&["--json", "--bytes", "-o", "NAME,SIZE,TYPE"]))
        .context("lsblk not found")?;
    let v: Value = serde_json::from_slice(&out.stdout).context("lsblk returned invalid JSON")?;
    Ok(parse_capacity_index(&v))
}

pub fn parse_capacity_index(v: &Value) -> CapacityIndex {
    let devices = match v["blockdevices"].as_array() {
        Some(d) => d,
        None    => return CapacityIndex::new(),
    };

    devices.iter().filter_map(|dev| {
        let name = str_opt(&dev["name"])?;
        if dev["type"].as_str() != Some("disk") { return None; }
        // Older lsblk prints the full path with some -o combinations.
        let name = name.strip_prefix("/dev/").unwrap_or(&name).to_string();
        if !disk_name_re().is_match(&name) { return None; }
        let size_bytes = u64_lenient(&dev["size"])?;
        Some(BlockDeviceEntry { name: format!("/dev/{}", name), size_bytes })
    }).collect()
}
