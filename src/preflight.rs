use crate::collectors::badblocks::BADBLOCKS;
use crate::collectors::lsblk::LSBLK;
use crate::collectors::smartctl::SMARTCTL;
use crate::error::SetupError;
use tracing::debug;

/// Tools the run cannot do without, with an install hint for each.
pub fn required_tools(scan_enabled: bool) -> Vec<(&'static str, &'static str)> {
    let mut tools = vec![
        (SMARTCTL, "install smartmontools"),
        (LSBLK,    "install util-linux"),
    ];
    if scan_enabled {
        tools.push((BADBLOCKS, "install e2fsprogs, or run with --no-scan"));
    }
    tools
}

/// Fail on the first required tool that is not on PATH.
pub fn check_tools(scan_enabled: bool) -> Result<(), SetupError> {
    check_with(scan_enabled, |tool| which::which(tool).is_ok())
}

fn check_with(scan_enabled: bool, found: impl Fn(&str) -> bool) -> Result<(), SetupError> {
    for (tool, hint) in required_tools(scan_enabled) {
        if !found(tool) {
            return Err(SetupError::MissingTool { tool, hint });
        }
        debug!(tool, "found");
    }
    Ok(())
}

/// smartctl needs raw device access for bridge pass-through commands.
pub fn warn_if_not_root() {
    if !nix::unistd::geteuid().is_root() {
        println!("Warning: not running as root; smartctl will likely be denied access to the bridge.");
    }
}
