use crate::models::smart::{HealthSummary, SmartAttribute, SmartStatus};
use crate::util::json::{find_key, u64_lenient};
use serde_json::Value;

/// Build the post-test summary from a `smartctl --json -a` document.
pub fn summarize(v: &Value) -> HealthSummary {
    let overall = match v["smart_status"]["passed"].as_bool() {
        Some(true)  => SmartStatus::Passed,
        Some(false) => SmartStatus::Failed,
        None        => SmartStatus::Unknown,
    };

    let attributes = parse_ata_attributes(v);
    let mut summary = HealthSummary::from_attributes(overall, &attributes);

    // NVMe behind a bridge has no attribute table; media errors are the
    // closest thing to an uncorrectable count.
    if attributes.is_empty() {
        let log = &v["nvme_smart_health_information_log"];
        if log.is_object() {
            summary.uncorrectable = log["media_errors"].as_u64();
        }
    }
    summary
}

/// Self-test "percent remaining", wherever the transport put it.
pub fn percent_remaining(v: &Value) -> Option<u8> {
    find_key(v, "remaining_percent")
        .and_then(u64_lenient)
        .map(|p| p.min(100) as u8)
}

fn parse_ata_attributes(v: &Value) -> Vec<SmartAttribute> {
    let table = match v["ata_smart_attributes"]["table"].as_array() {
        Some(t) => t,
        None    => return Vec::new(),
    };

    table.iter().filter_map(|entry| {
        let id        = entry["id"].as_u64()? as u32;
        let raw_value = entry["raw"]["value"].as_u64().unwrap_or(0);
        Some(SmartAttribute { id, raw_value })
    }).collect()
}
