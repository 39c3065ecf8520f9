use crate::models::drive::DriveRecord;
use crate::models::smart::HealthSummary;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    NotStarted,
    Running,
    Completed,
}

/// Result of a single status query round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Test still running; percentage only known from the JSON status.
    InProgress(Option<u8>),
    /// Neither status query produced any output.
    QueryFailed,
    Done,
}

/// Per-drive self-test bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct SelfTestSession {
    pub drive:                  DriveRecord,
    pub phase:                  Phase,
    pub last_percent_remaining: Option<u8>,
    /// Percent remaining reported at each in-progress poll, None when unknown.
    pub progress:               Vec<Option<u8>>,
    pub polls:                  u32,
    pub waits:                  u32,
    pub final_report_captured:  bool,
    /// Polling was abandoned after too many consecutive query failures.
    pub gave_up:                bool,
    pub summary:                Option<HealthSummary>,
}

impl SelfTestSession {
    pub fn new(drive: DriveRecord) -> Self {
        Self {
            drive,
            phase: Phase::NotStarted,
            last_percent_remaining: None,
            progress: Vec::new(),
            polls: 0,
            waits: 0,
            final_report_captured: false,
            gave_up: false,
            summary: None,
        }
    }
}
