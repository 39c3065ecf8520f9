use crate::models::device::CapacityIndex;
use crate::models::drive::DriveRecord;
use crate::util::human::fmt_bytes;
use std::fmt;

/// 50 MiB. Drives behind a bridge report the same LBA count the kernel sees,
/// so a genuine match is exact or very close.
pub const DEFAULT_TOLERANCE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched  { device: String, diff: u64 },
    /// No device within tolerance. `closest` is the best candidate, if any.
    Unmapped { closest: Option<(String, u64)> },
}

impl MatchOutcome {
    pub fn device(&self) -> Option<&str> {
        match self {
            MatchOutcome::Matched { device, .. } => Some(device),
            MatchOutcome::Unmapped { .. }        => None,
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Matched { device, diff } =>
                write!(f, "{} (off by {} bytes)", device, diff),
            MatchOutcome::Unmapped { closest: Some((device, diff)) } =>
                write!(f, "unmapped: closest is {} but differs by {}, over tolerance", device, fmt_bytes(*diff)),
            MatchOutcome::Unmapped { closest: None } =>
                write!(f, "unmapped: no candidate block devices"),
        }
    }
}

/// Closest device by absolute size difference, accepted only within
/// `tolerance`. Ties go to the first device in name order.
pub fn match_capacity(target: u64, index: &CapacityIndex, tolerance: u64) -> MatchOutcome {
    let mut best: Option<(&str, u64)> = None;
    for (name, size) in index.iter() {
        let diff = target.abs_diff(size);
        // Strict `<` keeps the earliest name on ties.
        if best.map_or(true, |(_, d)| diff < d) {
            best = Some((name, diff));
        }
    }
    match best {
        Some((name, diff)) if diff <= tolerance =>
            MatchOutcome::Matched { device: name.to_string(), diff },
        other =>
            MatchOutcome::Unmapped { closest: other.map(|(n, d)| (n.to_string(), d)) },
    }
}

/// Map each drive in order, never handing the same device to two drives:
/// a matched device leaves the candidate set for the drives after it.
pub fn map_drives<'a>(
    drives:    &'a [DriveRecord],
    index:     &CapacityIndex,
    tolerance: u64,
) -> Vec<(&'a DriveRecord, MatchOutcome)> {
    let mut remaining = index.clone();
    drives.iter().map(|d| {
        let outcome = match_capacity(d.capacity_bytes, &remaining, tolerance);
        if let Some(dev) = outcome.device() {
            remaining.remove(dev);
        }
        (d, outcome)
    }).collect()
}
