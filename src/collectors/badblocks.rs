use crate::collectors::exec::{args, CmdOutput, Runner};
use anyhow::Result;

pub const BADBLOCKS: &str = "badblocks";

/// Read-only surface scan of a whole block device. `-s` shows progress,
/// `-v` reports every bad block found. Write modes (`-w`, `-n`) are never used.
pub fn scan(runner: &dyn Runner, device: &str) -> Result<CmdOutput> {
    runner.run(BADBLOCKS, &args(&["-s", "-v", device]))
}

/// badblocks ends a verbose run with
/// `Pass completed, 0 bad blocks found. (0/0/0 errors)`.
pub fn bad_block_count(output: &str) -> Option<u64> {
    output
        .lines()
        .rev()
        .find_map(|l| l.split_once("Pass completed, "))
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
}
