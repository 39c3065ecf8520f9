use crate::models::selftest::SelfTestSession;
use crate::pipeline::RunReport;
use serde_json::{json, Value};

/// Human-readable closing summary of a run.
pub fn generate(report: &RunReport) -> String {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut out = String::new();

    out.push_str("═══════════════════════════════════════════════\n");
    out.push_str(&format!("  baydiag summary — {}\n", now));
    out.push_str("═══════════════════════════════════════════════\n\n");

    if !report.sessions.is_empty() {
        out.push_str(&format!("── Self-tests ({}) ─────────────────────────────\n", report.sessions.len()));
        for s in &report.sessions {
            out.push_str(&session_line(s));
        }
        out.push('\n');
    }

    out.push_str(&format!("── Block device mapping ({}) ──────────────────\n", report.mappings.len()));
    for m in &report.mappings {
        out.push_str(&format!("  {:<24} {}\n", m.serial, m.detail));
    }
    out.push('\n');

    if !report.scans.is_empty() {
        out.push_str(&format!("── Surface scans ({}) ──────────────────────────\n", report.scans.len()));
        for s in &report.scans {
            let bad = match (s.completed, s.bad_blocks) {
                (_, Some(n))    => format!("{} bad blocks", n),
                (true, None)    => "completed".to_string(),
                (false, None)   => "did not complete".to_string(),
            };
            out.push_str(&format!("  {:<24} {:<10} {}\n", s.serial, s.device, bad));
        }
        out.push('\n');
    }

    if report.files.is_empty() {
        out.push_str("No log files written.\n");
    } else {
        out.push_str(&format!("Logs in {}:\n", report.log_dir.display()));
        for f in &report.files {
            out.push_str(&format!("  {}\n", f.display()));
        }
    }
    out.push_str("═══════════════════════════════════════════════\n");
    out
}

fn session_line(s: &SelfTestSession) -> String {
    let health = match &s.summary {
        Some(sum) => {
            let flag = if sum.has_sector_errors() { "  ⚠ sector errors" } else { "" };
            format!("health {}{}", sum.overall.label(), flag)
        }
        None => "no final report".to_string(),
    };
    let note = if s.gave_up { "  (status unavailable, gave up)" } else { "" };
    format!(
        "  {:<24} {:<20} {} polls  {}{}\n",
        s.drive.serial, s.drive.address.to_string(), s.polls, health, note
    )
}

/// Same information as `generate`, as a JSON document for scripting.
pub fn to_json(report: &RunReport) -> Value {
    json!({
        "generated_at": chrono::Local::now().to_rfc3339(),
        "bridges":      report.bridges,
        "self_tests":   report.sessions,
        "mappings":     report.mappings,
        "scans":        report.scans,
        "log_dir":      report.log_dir,
        "files":        report.files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::drive::{BayAddress, DriveRecord};
    use crate::models::smart::{HealthSummary, SmartStatus};
    use crate::pipeline::{Mapping, ScanResult};
    use std::path::PathBuf;

    fn sample() -> RunReport {
        let drive = DriveRecord::new("SER-A", BayAddress::new("/dev/sdb", "jmb39x", 0), None, 1).unwrap();
        let mut session = SelfTestSession::new(drive);
        session.polls = 3;
        session.summary = Some(HealthSummary { pending: Some(2), ..HealthSummary::from_attributes(SmartStatus::Passed, &[]) });
        RunReport {
            bridges:  vec!["/dev/sdb".into()],
            sessions: vec![session],
            mappings: vec![Mapping { serial: "SER-A".into(), device: Some("/dev/sdc".into()), detail: "/dev/sdc (off by 0 bytes)".into() }],
            scans:    vec![ScanResult { serial: "SER-A".into(), device: "/dev/sdc".into(), completed: true, bad_blocks: Some(0) }],
            log_dir:  PathBuf::from("logs"),
            files:    vec![PathBuf::from("logs/SER-A_smart_before.txt")],
        }
    }

    #[test]
    fn text_summary_lists_everything() {
        let text = generate(&sample());
        assert!(text.contains("SER-A"));
        assert!(text.contains("health PASSED  ⚠ sector errors"));
        assert!(text.contains("/dev/sdc (off by 0 bytes)"));
        assert!(text.contains("0 bad blocks"));
        assert!(text.contains("logs/SER-A_smart_before.txt"));
    }

    #[test]
    fn json_summary_has_sections() {
        let v = to_json(&sample());
        assert_eq!(v["bridges"][0], "/dev/sdb");
        assert_eq!(v["self_tests"][0]["drive"]["serial"], "SER-A");
        assert_eq!(v["self_tests"][0]["summary"]["pending"], 2);
        assert_eq!(v["mappings"][0]["device"], "/dev/sdc");
        assert_eq!(v["scans"][0]["bad_blocks"], 0);
    }
}
