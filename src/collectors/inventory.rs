use crate::collectors::exec::Runner;
use crate::collectors::smartctl;
use crate::models::drive::{BayAddress, DriveRecord};
use crate::util::human::fmt_bytes;
use crate::util::json::{first_of, str_opt, u64_lenient, FieldPath};
use serde_json::Value;
use tracing::debug;

// Field locations in priority order. USB-SATA, SCSI-translated and NVMe
// bridges each put identity fields in different places.
const SERIAL_PATHS: &[FieldPath] = &[
    &["serial_number"],
    &["device", "serial_number"],
    &["scsi_serial_number"],
    &["ata_device_identity", "serial_number"],
    &["nvme_serial_number"],
];

const MODEL_PATHS: &[FieldPath] = &[
    &["model_name"],
    &["device", "model_name"],
    &["scsi_model_name"],
    &["scsi_product"],
    &["nvme_model_name"],
];

const CAPACITY_PATHS: &[FieldPath] = &[
    &["user_capacity", "bytes"],
    &["user_capacity"],
    &["device", "user_capacity", "bytes"],
    &["nvme_total_capacity"],
    &["nvme_namespaces", "0", "capacity", "bytes"],
    &["scsi_capacity", "bytes"],
];

/// Extract a validated record from one `smartctl --json -i` document.
pub fn parse_identity(v: &Value, address: BayAddress) -> Option<DriveRecord> {
    let serial   = first_of(v, SERIAL_PATHS, str_opt)?;
    let model    = first_of(v, MODEL_PATHS, str_opt);
    let capacity = first_of(v, CAPACITY_PATHS, |c| u64_lenient(c).filter(|n| *n > 0))?;
    DriveRecord::new(&serial, address, model.as_deref(), capacity)
}

/// Query every (bridge, bay) pair and return the records that validate, in
/// discovery order. Bays that do not answer are treated as empty.
pub fn read_inventory(
    runner:   &dyn Runner,
    bridges:  &[String],
    bays:     &[u8],
    dev_type: &str,
) -> Vec<DriveRecord> {
    let mut found = Vec::new();
    for bridge in bridges {
        for &bay in bays {
            let addr = BayAddress::new(bridge.clone(), dev_type, bay);
            let Some(doc) = smartctl::identify(runner, &addr) else {
                debug!(address = %addr, "no response, bay treated as empty");
                continue;
            };
            match parse_identity(&doc, addr.clone()) {
                Some(rec) => {
                    println!(
                        "  Found {}: {} (S/N {}, {})",
                        rec.address, rec.model, rec.serial, fmt_bytes(rec.capacity_bytes)
                    );
                    found.push(rec);
                }
                None => debug!(address = %addr, "identity incomplete, skipped"),
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::exec::testing::ScriptedRunner;
    use serde_json::json;

    fn addr() -> BayAddress {
        BayAddress::new("/dev/sdb", "jmb39x", 0)
    }

    #[test]
    fn top_level_ata_schema() {
        let v = json!({
            "model_name": "WDC WD40EFRX",
            "serial_number": "WD-WCC4E1234567",
            "user_capacity": { "blocks": 7814037168u64, "bytes": 4000787030016u64 }
        });
        let rec = parse_identity(&v, addr()).unwrap();
        assert_eq!(rec.serial, "WD-WCC4E1234567");
        assert_eq!(rec.model, "WDC WD40EFRX");
        assert_eq!(rec.capacity_bytes, 4000787030016);
    }

    #[test]
    fn each_field_at_a_different_level() {
        let v = json!({
            "serial_number": "S3Z9NB0K",
            "device": { "model_name": "Samsung SSD 860" },
            "nvme_namespaces": [ { "capacity": { "bytes": "500107862016" } } ]
        });
        let rec = parse_identity(&v, addr()).unwrap();
        assert_eq!(rec.serial, "S3Z9NB0K");
        assert_eq!(rec.model, "Samsung SSD 860");
        assert_eq!(rec.capacity_bytes, 500107862016);
    }

    #[test]
    fn earlier_paths_win() {
        let v = json!({
            "serial_number": "TOP",
            "device": { "serial_number": "NESTED" },
            "user_capacity": 1000,
            "nvme_total_capacity": 2000
        });
        let rec = parse_identity(&v, addr()).unwrap();
        assert_eq!(rec.serial, "TOP");
        assert_eq!(rec.capacity_bytes, 1000);
        assert_eq!(rec.model, "Unknown");
    }

    #[test]
    fn rejects_missing_serial_or_capacity() {
        assert!(parse_identity(&json!({ "user_capacity": { "bytes": 10 } }), addr()).is_none());
        assert!(parse_identity(&json!({ "serial_number": "  ", "user_capacity": 10 }), addr()).is_none());
        assert!(parse_identity(&json!({ "serial_number": "X", "user_capacity": { "bytes": 0 } }), addr()).is_none());
        assert!(parse_identity(&json!({ "serial_number": "X" }), addr()).is_none());
        // A zero at a higher-priority path falls through to the next.
        let v = json!({ "serial_number": "X", "user_capacity": { "bytes": 0 }, "nvme_total_capacity": 5 });
        assert_eq!(parse_identity(&v, addr()).unwrap().capacity_bytes, 5);
    }

    #[test]
    fn inventory_skips_silent_and_invalid_bays() {
        let r = ScriptedRunner::new();
        r.on_ok(
            "smartctl --json=c -i -d jmb39x,0 /dev/sdb",
            r#"{"serial_number":"AAA","user_capacity":{"bytes":100}}"#,
        );
        r.on_ok("smartctl --json=c -i -d jmb39x,1 /dev/sdb", "");
        r.on_ok("smartctl --json=c -i -d jmb39x,0 /dev/sdc", r#"{"model_name":"no serial"}"#);
        // jmb39x,1 /dev/sdc is unscripted: the runner errors.

        let recs = read_inventory(&r, &["/dev/sdb".into(), "/dev/sdc".into()], &[0, 1], "jmb39x");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].serial, "AAA");
        assert_eq!(recs[0].address.bay, 0);
        assert_eq!(r.calls.borrow().len(), 4);
    }
}
