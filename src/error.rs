use thiserror::Error;

/// Conditions that stop the run before any drive is touched.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("required tool `{tool}` not found in PATH ({hint})")]
    MissingTool { tool: &'static str, hint: &'static str },

    #[error("no USB bridge devices found (is the enclosure connected and powered? try --bridge /dev/sdX)")]
    NoBridges,

    #[error("no drives with a serial number and capacity found behind the bridge")]
    NoDrives,
}
