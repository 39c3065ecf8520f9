use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SmartStatus {
    Unknown,
    Passed,
    Failed,
}

impl SmartStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SmartStatus::Unknown => "n/a",
            SmartStatus::Passed  => "PASSED",
            SmartStatus::Failed  => "FAILED",
        }
    }
}

/// Raw value of one ATA SMART attribute row.
#[derive(Debug, Clone)]
pub struct SmartAttribute {
    pub id:        u32,
    pub raw_value: u64,
}

/// SMART attribute IDs surfaced in the post-test summary.
pub const ATTR_REALLOCATED:   u32 = 5;
pub const ATTR_PENDING:       u32 = 197;
pub const ATTR_UNCORRECTABLE: u32 = 198;

/// Key health fields pulled from the final status document for quick review.
/// Any field may be missing; the drive or bridge simply did not report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
    pub overall:       SmartStatus,
    pub reallocated:   Option<u64>,
    pub pending:       Option<u64>,
    pub uncorrectable: Option<u64>,
}

impl Default for HealthSummary {
    fn default() -> Self {
        Self { overall: SmartStatus::Unknown, reallocated: None, pending: None, uncorrectable: None }
    }
}

impl HealthSummary {
    pub fn from_attributes(overall: SmartStatus, attrs: &[SmartAttribute]) -> Self {
        let raw = |id: u32| attrs.iter().find(|a| a.id == id).map(|a| a.raw_value);
        Self {
            overall,
            reallocated:   raw(ATTR_REALLOCATED),
            pending:       raw(ATTR_PENDING),
            uncorrectable: raw(ATTR_UNCORRECTABLE),
        }
    }

    /// True if any reported sector counter is non-zero.
    pub fn has_sector_errors(&self) -> bool {
        [self.reallocated, self.pending, self.uncorrectable]
            .iter()
            .any(|v| v.map_or(false, |n| n > 0))
    }
}

fn opt(v: Option<u64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "n/a".to_string())
}

impl fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Overall health:      {}", self.overall.label())?;
        writeln!(f, "  Reallocated sectors: {}", opt(self.reallocated))?;
        writeln!(f, "  Pending sectors:     {}", opt(self.pending))?;
        write!(f,   "  Uncorrectable:       {}", opt(self.uncorrectable))
    }
}
