use crate::collectors::exec::{args, CmdOutput, Runner};
use crate::models::drive::BayAddress;
use anyhow::Result;
use serde_json::Value;
use tracing::debug;

pub const SMARTCTL: &str = "smartctl";

/// Run `smartctl --scan` and return the device paths whose scan line
/// mentions `filter` (case-insensitive). An empty filter keeps every line.
pub fn scan_bridges(runner: &dyn Runner, filter: &str) -> Result<Vec<String>> {
    let out = runner.run(SMARTCTL, &args(&["--scan"]))?;
    Ok(parse_scan(&out.stdout_str(), filter))
}

/// Scan lines look like `/dev/sdb -d sat # /dev/sdb [SAT], ATA device`.
pub fn parse_scan(text: &str, filter: &str) -> Vec<String> {
    let needle = filter.to_lowercase();
    let mut found: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if !line.to_lowercase().contains(&needle) { continue; }
        let Some(path) = line.split_whitespace().next() else { continue };
        if !path.starts_with("/dev/") { continue; }
        if !found.iter().any(|p| p == path) {
            found.push(path.to_string());
        }
    }
    found
}

/// smartctl exit bits 0-2 mean the command line, device open or the command
/// itself failed. Higher bits only describe SMART findings.
pub fn command_failed(out: &CmdOutput) -> bool {
    match out.code {
        Some(code) => code & 0b111 != 0,
        None       => true,
    }
}

fn query(runner: &dyn Runner, head: &[&str], addr: &BayAddress) -> Option<CmdOutput> {
    let mut argv = args(head);
    argv.extend(addr.smartctl_args());
    match runner.run(SMARTCTL, &argv) {
        Ok(out) => Some(out),
        Err(e) => {
            debug!(address = %addr, error = %e, "smartctl query failed");
            None
        }
    }
}

/// Parse smartctl's stdout as JSON regardless of exit code; smartctl sets
/// status bits for SMART findings even when the query itself succeeded.
fn query_json(runner: &dyn Runner, head: &[&str], addr: &BayAddress) -> Option<Value> {
    let out = query(runner, head, addr)?;
    parse_json(&out, addr)
}

fn parse_json(out: &CmdOutput, addr: &BayAddress) -> Option<Value> {
    if out.is_empty() { return None; }
    match serde_json::from_slice::<Value>(&out.stdout) {
        Ok(v) if v.is_object() => Some(v),
        Ok(_) => None,
        Err(e) => {
            debug!(address = %addr, error = %e, "unparseable smartctl JSON");
            None
        }
    }
}

/// `smartctl --json=c -i`: identity block for one bay.
pub fn identify(runner: &dyn Runner, addr: &BayAddress) -> Option<Value> {
    query_json(runner, &["--json=c", "-i"], addr)
}

/// `smartctl --json=c -c`: capabilities, including self-test execution status.
/// A failed command yields None even though smartctl still prints a JSON
/// error object, so a bridge hiccup is never mistaken for an idle drive.
pub fn status_json(runner: &dyn Runner, addr: &BayAddress) -> Option<Value> {
    let out = query(runner, &["--json=c", "-c"], addr)?;
    if command_failed(&out) {
        debug!(address = %addr, code = ?out.code, "status query failed");
        return None;
    }
    let v = parse_json(&out, addr)?;
    let reported = v["smartctl"]["exit_status"].as_u64().unwrap_or(0);
    if reported & 0b111 != 0 {
        debug!(address = %addr, reported, "status query failed");
        return None;
    }
    Some(v)
}

/// `smartctl -c`: the same status as free text. None if the command failed.
pub fn status_text(runner: &dyn Runner, addr: &BayAddress) -> Option<String> {
    query(runner, &["-c"], addr)
        .filter(|o| !command_failed(o) && !o.is_empty())
        .map(|o| o.stdout_str())
}

/// `smartctl --json=c -a`: everything, used for the post-test summary.
pub fn full_json(runner: &dyn Runner, addr: &BayAddress) -> Option<Value> {
    query_json(runner, &["--json=c", "-a"], addr)
}

/// `smartctl -a`: human-readable report written to the drive logs.
pub fn full_report(runner: &dyn Runner, addr: &BayAddress) -> Result<CmdOutput> {
    let mut argv = args(&["-a"]);
    argv.extend(addr.smartctl_args());
    runner.run(SMARTCTL, &argv)
}

/// `smartctl -t long`: start the extended self-test.
pub fn start_long_test(runner: &dyn Runner, addr: &BayAddress) -> Result<CmdOutput> {
    let mut argv = args(&["-t", "long"]);
    argv.extend(addr.smartctl_args());
    runner.run(SMARTCTL, &argv)
}
