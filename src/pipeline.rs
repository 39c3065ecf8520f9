use crate::collectors::exec::Runner;
use crate::collectors::{badblocks, inventory, lsblk, smartctl};
use crate::error::SetupError;
use crate::models::device::CapacityIndex;
use crate::models::selftest::SelfTestSession;
use crate::selftest::{Poller, Sleeper};
use crate::util::dedup::{dedup, DriveSet};
use crate::util::logfiles::LogDir;
use crate::util::matcher::map_drives;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Effective settings for one run, after config file and CLI are merged.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Explicit bridge devices; empty means discover with `smartctl --scan`.
    pub bridges:           Vec<String>,
    pub bridge_filter:     String,
    pub dev_type:          String,
    pub bays:              Vec<u8>,
    pub poll_interval:     Duration,
    pub max_poll_failures: u32,
    pub tolerance_bytes:   u64,
    pub scan_enabled:      bool,
    /// Inventory and mapping only: no self-tests, no scans, no log files.
    pub list_only:         bool,
    pub log_dir:           PathBuf,
}

#[derive(Debug, Serialize)]
pub struct Mapping {
    pub serial:  String,
    pub device:  Option<String>,
    pub detail:  String,
}

#[derive(Debug, Serialize)]
pub struct ScanResult {
    pub serial:     String,
    pub device:     String,
    pub completed:  bool,
    pub bad_blocks: Option<u64>,
}

/// Everything a run produced, for the closing summary.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub bridges:  Vec<String>,
    pub sessions: Vec<SelfTestSession>,
    pub mappings: Vec<Mapping>,
    pub scans:    Vec<ScanResult>,
    pub log_dir:  PathBuf,
    pub files:    Vec<PathBuf>,
}

pub fn find_bridges(runner: &dyn Runner, opts: &RunOptions) -> Result<Vec<String>> {
    let bridges = if opts.bridges.is_empty() {
        smartctl::scan_bridges(runner, &opts.bridge_filter)?
    } else {
        opts.bridges.clone()
    };
    if bridges.is_empty() {
        return Err(SetupError::NoBridges.into());
    }
    Ok(bridges)
}

fn build_index(runner: &dyn Runner) -> CapacityIndex {
    match lsblk::capacity_index(runner) {
        Ok(idx) => {
            debug!(devices = idx.len(), "block device index");
            if idx.is_empty() {
                println!("  Warning: lsblk reported no whole-disk sd* devices; no drives will be mapped");
            }
            idx
        }
        Err(e)  => {
            warn!(error = %format!("{:#}", e), "block device enumeration failed");
            println!("  Warning: could not list block devices ({:#}); no drives will be mapped", e);
            CapacityIndex::new()
        }
    }
}

/// Inventory → self-tests → capacity mapping → optional surface scans,
/// one drive at a time.
pub fn run(runner: &dyn Runner, sleeper: &mut dyn Sleeper, opts: &RunOptions) -> Result<RunReport> {
    let bridges = find_bridges(runner, opts)?;
    println!("Bridges: {}", bridges.join(", "));

    println!("\n── Discovering drives ─────────────────────────");
    let records = inventory::read_inventory(runner, &bridges, &opts.bays, &opts.dev_type);
    let drives = dedup(records).require_non_empty()?;
    info!(count = drives.len(), duplicates = drives.duplicates.len(), "inventory complete");

    let mut report = RunReport {
        bridges,
        sessions: Vec::new(),
        mappings: Vec::new(),
        scans:    Vec::new(),
        log_dir:  opts.log_dir.clone(),
        files:    Vec::new(),
    };

    if opts.list_only {
        let index = build_index(runner);
        report.mappings = map_and_print(&drives, &index, opts.tolerance_bytes);
        return Ok(report);
    }

    let mut logs = LogDir::create(&opts.log_dir)?;

    println!("\n── Extended self-tests ────────────────────────");
    let poller = Poller::new(runner, opts.poll_interval, opts.max_poll_failures);
    for drive in drives.drives() {
        let session = poller.run(drive.clone(), &mut logs, sleeper)?;
        report.sessions.push(session);
    }

    // Taken after the self-tests so the snapshot reflects the current device
    // nodes; it is not refreshed afterwards.
    let index = build_index(runner);
    report.mappings = map_and_print(&drives, &index, opts.tolerance_bytes);

    if opts.scan_enabled {
        println!("\n── Surface scans (read-only) ──────────────────");
        for m in &report.mappings {
            let Some(device) = &m.device else {
                println!("  Skipping {}: {}", m.serial, m.detail);
                continue;
            };
            let Some(drive) = drives.get(&m.serial) else { continue };
            println!("  Scanning {} ({}); this reads the whole disk and can take hours", device, m.serial);
            let path = logs.badblocks_path(drive);
            let title = format!("badblocks -s -v {} ({})", device, m.serial);
            let result = match badblocks::scan(runner, device) {
                Ok(out) => {
                    let text = out.combined();
                    logs.write(&path, &title, &text)?;
                    let bad = badblocks::bad_block_count(&text);
                    if !out.success() {
                        println!("  Warning: badblocks exited with {:?} on {}", out.code, device);
                    }
                    ScanResult { serial: m.serial.clone(), device: device.clone(), completed: out.success(), bad_blocks: bad }
                }
                Err(e) => {
                    logs.write(&path, &title, &format!("failed: {:#}\n", e))?;
                    println!("  Warning: badblocks failed on {}: {:#}", device, e);
                    ScanResult { serial: m.serial.clone(), device: device.clone(), completed: false, bad_blocks: None }
                }
            };
            report.scans.push(result);
        }
    }

    report.files = logs.produced().to_vec();
    Ok(report)
}

fn map_and_print(drives: &DriveSet, index: &CapacityIndex, tolerance: u64) -> Vec<Mapping> {
    println!("\n── Mapping drives to block devices ────────────");
    map_drives(drives.drives(), index, tolerance)
        .into_iter()
        .map(|(drive, outcome)| {
            println!("  {} → {}", drive.serial, outcome);
            Mapping {
                serial: drive.serial.clone(),
                device: outcome.device().map(str::to_string),
                detail: outcome.to_string(),
            }
        })
        .collect()
}
