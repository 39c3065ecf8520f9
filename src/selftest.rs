use crate::collectors::exec::Runner;
use crate::collectors::{smart, smartctl};
use crate::models::drive::DriveRecord;
use crate::models::selftest::{Phase, PollOutcome, SelfTestSession};
use crate::util::logfiles::LogDir;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Blocking wait between polls. Extended tests take hours, so this is a
/// plain sleep rather than anything scheduled.
pub trait Sleeper {
    fn sleep(&mut self, interval: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

fn in_progress_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bin progress\b").expect("static regex"))
}

pub struct Poller<'a> {
    runner:            &'a dyn Runner,
    interval:          Duration,
    /// Consecutive failed polls tolerated before giving up; 0 = never give up.
    max_poll_failures: u32,
}

impl<'a> Poller<'a> {
    pub fn new(runner: &'a dyn Runner, interval: Duration, max_poll_failures: u32) -> Self {
        Self { runner, interval, max_poll_failures }
    }

    /// Start, wait for and summarise the extended self-test of one drive.
    pub fn run(&self, drive: DriveRecord, logs: &mut LogDir, sleeper: &mut dyn Sleeper) -> Result<SelfTestSession> {
        let mut session = SelfTestSession::new(drive);
        self.start(&mut session, logs)?;
        self.wait(&mut session, sleeper);
        self.finish(&mut session, logs)?;
        Ok(session)
    }

    /// Write the initial report, then issue `smartctl -t long` and append its
    /// output. A failed start is reported but not fatal: a test left running
    /// by an earlier invocation makes smartctl refuse a new one.
    pub fn start(&self, session: &mut SelfTestSession, logs: &mut LogDir) -> Result<()> {
        let drive = &session.drive;
        let path = logs.before_path(drive);

        let report = match smartctl::full_report(self.runner, &drive.address) {
            Ok(out) => out.combined(),
            Err(e)  => format!("smartctl -a failed: {:#}\n", e),
        };
        logs.write(&path, &format!("SMART report before self-test: {}", drive.serial), &report)?;

        println!("  Starting extended self-test on {} ({})", drive.serial, drive.address);
        let started = match smartctl::start_long_test(self.runner, &drive.address) {
            Ok(out) => {
                logs.append(&path, "smartctl -t long", &out.combined())?;
                if smartctl::command_failed(&out) {
                    println!("  Warning: self-test start returned {:?}; it may already be running", out.code);
                    false
                } else {
                    true
                }
            }
            Err(e) => {
                logs.append(&path, "smartctl -t long", &format!("failed: {:#}\n", e))?;
                println!("  Warning: could not start self-test: {:#}", e);
                false
            }
        };
        debug!(serial = %drive.serial, started, "self-test start issued");

        session.phase = Phase::Running;
        Ok(())
    }

    /// One status round: structured percentage first, free-text phrase second.
    pub fn poll_once(&self, drive: &DriveRecord) -> PollOutcome {
        let json = smartctl::status_json(self.runner, &drive.address);
        if let Some(pct) = json.as_ref().and_then(smart::percent_remaining) {
            return PollOutcome::InProgress(Some(pct));
        }

        let text = smartctl::status_text(self.runner, &drive.address);
        if let Some(t) = &text {
            if in_progress_re().is_match(t) {
                return PollOutcome::InProgress(None);
            }
        }

        if json.is_none() && text.is_none() {
            PollOutcome::QueryFailed
        } else {
            PollOutcome::Done
        }
    }

    /// Poll until the drive stops reporting a running test. There is no
    /// timeout; only `max_poll_failures` can end the loop early.
    pub fn wait(&self, session: &mut SelfTestSession, sleeper: &mut dyn Sleeper) {
        let mut failures = 0u32;
        loop {
            session.polls += 1;
            match self.poll_once(&session.drive) {
                PollOutcome::InProgress(pct) => {
                    failures = 0;
                    session.progress.push(pct);
                    if pct.is_some() {
                        session.last_percent_remaining = pct;
                    }
                    let shown = pct.map(|p| format!("{}%", p)).unwrap_or_else(|| "unknown".into());
                    println!(
                        "  [{}] {}: self-test in progress, {} remaining",
                        chrono::Local::now().format("%H:%M:%S"), session.drive.serial, shown
                    );
                }
                PollOutcome::QueryFailed => {
                    failures += 1;
                    warn!(serial = %session.drive.serial, failures, "status query returned nothing");
                    if self.max_poll_failures > 0 && failures >= self.max_poll_failures {
                        println!(
                            "  {}: giving up after {} failed status queries",
                            session.drive.serial, failures
                        );
                        session.gave_up = true;
                        return;
                    }
                }
                PollOutcome::Done => return,
            }
            session.waits += 1;
            sleeper.sleep(self.interval);
        }
    }

    /// Capture the final report and print the key health fields. Runs once
    /// per session; later calls are no-ops.
    pub fn finish(&self, session: &mut SelfTestSession, logs: &mut LogDir) -> Result<()> {
        if session.final_report_captured {
            return Ok(());
        }
        let drive = &session.drive;
        let path = logs.after_path(drive);
        let report = match smartctl::full_report(self.runner, &drive.address) {
            Ok(out) => out.combined(),
            Err(e)  => format!("smartctl -a failed: {:#}\n", e),
        };
        logs.write(&path, &format!("SMART report after self-test: {}", drive.serial), &report)?;

        let summary = smartctl::full_json(self.runner, &drive.address)
            .map(|v| smart::summarize(&v))
            .unwrap_or_default();
        println!("  Self-test finished for {}:", drive.serial);
        println!("{}", summary);

        session.summary = Some(summary);
        session.final_report_captured = true;
        session.phase = Phase::Completed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::exec::testing::ScriptedRunner;
    use crate::collectors::exec::CmdOutput;
    use crate::models::drive::BayAddress;
    use crate::models::smart::SmartStatus;

    const JSON_STATUS: &str = "smartctl --json=c -c -d jmb39x,0 /dev/sdb";
    const TEXT_STATUS: &str = "smartctl -c -d jmb39x,0 /dev/sdb";
    const FULL_TEXT:   &str = "smartctl -a -d jmb39x,0 /dev/sdb";
    const FULL_JSON:   &str = "smartctl --json=c -a -d jmb39x,0 /dev/sdb";
    const START:       &str = "smartctl -t long -d jmb39x,0 /dev/sdb";

    #[derive(Default)]
    struct CountingSleeper {
        waits: Vec<Duration>,
    }

    impl Sleeper for CountingSleeper {
        fn sleep(&mut self, interval: Duration) {
            self.waits.push(interval);
        }
    }

    fn drive() -> DriveRecord {
        DriveRecord::new("WD-1", BayAddress::new("/dev/sdb", "jmb39x", 0), None, 1000).unwrap()
    }

    fn running(pct: u8) -> String {
        format!(r#"{{"ata_smart_data":{{"self_test":{{"status":{{"value":241,"remaining_percent":{}}}}}}}}}"#, pct)
    }

    const IDLE_JSON: &str = r#"{"ata_smart_data":{"self_test":{"status":{"value":0,"passed":true}}}}"#;
    const RUNNING_TEXT: &str = "Self-test execution status: (249) Self-test routine in progress...\n";
    const IDLE_TEXT: &str = "Self-test execution status: (0) The previous self-test routine completed\n";

    fn scripted() -> ScriptedRunner {
        let r = ScriptedRunner::new();
        r.on_ok(FULL_TEXT, "=== START OF INFORMATION SECTION ===\n");
        r.on_ok(FULL_JSON, r#"{"smart_status":{"passed":true},"ata_smart_attributes":{"table":[{"id":5,"raw":{"value":0}}]}}"#);
        r.on_ok(START, "Testing has begun.\n");
        r
    }

    #[test]
    fn scripted_sequence_waits_between_in_progress_polls() {
        let r = scripted();
        r.on_ok(JSON_STATUS, &running(40));
        r.on_ok(JSON_STATUS, &running(10));
        r.on_ok(JSON_STATUS, IDLE_JSON);
        r.on_ok(TEXT_STATUS, RUNNING_TEXT);
        r.on_ok(TEXT_STATUS, IDLE_TEXT);

        let dir = tempfile::tempdir().unwrap();
        let mut logs = LogDir::create(dir.path()).unwrap();
        let mut sleeper = CountingSleeper::default();
        let poller = Poller::new(&r, Duration::from_secs(60), 0);

        let session = poller.run(drive(), &mut logs, &mut sleeper).unwrap();

        assert_eq!(sleeper.waits, vec![Duration::from_secs(60); 3]);
        assert_eq!(session.progress, vec![Some(40), Some(10), None]);
        assert_eq!(session.last_percent_remaining, Some(10));
        assert_eq!(session.polls, 4);
        assert_eq!(session.phase, Phase::Completed);
        assert!(session.final_report_captured);
        assert_eq!(r.count(FULL_JSON), 1);
        // Once for the before log, once for the after log.
        assert_eq!(r.count(FULL_TEXT), 2);
        assert_eq!(session.summary.unwrap().overall, SmartStatus::Passed);
    }

    #[test]
    fn finish_captures_only_once() {
        let r = scripted();
        let dir = tempfile::tempdir().unwrap();
        let mut logs = LogDir::create(dir.path()).unwrap();
        let poller = Poller::new(&r, Duration::from_secs(1), 0);
        let mut session = SelfTestSession::new(drive());
        poller.finish(&mut session, &mut logs).unwrap();
        poller.finish(&mut session, &mut logs).unwrap();
        assert_eq!(r.count(FULL_JSON), 1);
    }

    #[test]
    fn poll_prefers_json_percentage() {
        let r = ScriptedRunner::new();
        r.on_ok(JSON_STATUS, &running(70));
        r.on_ok(TEXT_STATUS, IDLE_TEXT);
        let poller = Poller::new(&r, Duration::from_secs(1), 0);
        assert_eq!(poller.poll_once(&drive()), PollOutcome::InProgress(Some(70)));
        assert_eq!(r.count(TEXT_STATUS), 0);
    }

    #[test]
    fn poll_falls_back_to_text_then_done() {
        let r = ScriptedRunner::new();
        r.on_ok(JSON_STATUS, "garbage");
        r.on_ok(TEXT_STATUS, RUNNING_TEXT);
        r.on_ok(TEXT_STATUS, IDLE_TEXT);
        let poller = Poller::new(&r, Duration::from_secs(1), 0);
        assert_eq!(poller.poll_once(&drive()), PollOutcome::InProgress(None));
        assert_eq!(poller.poll_once(&drive()), PollOutcome::Done);
    }

    #[test]
    fn no_output_at_all_is_a_query_failure() {
        let r = ScriptedRunner::new();
        let poller = Poller::new(&r, Duration::from_secs(1), 0);
        assert_eq!(poller.poll_once(&drive()), PollOutcome::QueryFailed);
    }

    #[test]
    fn bounded_failures_give_up() {
        let r = ScriptedRunner::new();
        let poller = Poller::new(&r, Duration::from_secs(5), 3);
        let mut session = SelfTestSession::new(drive());
        let mut sleeper = CountingSleeper::default();
        poller.wait(&mut session, &mut sleeper);
        assert!(session.gave_up);
        assert_eq!(session.polls, 3);
        assert_eq!(sleeper.waits.len(), 2);
    }

    fn failing(stdout: &str) -> CmdOutput {
        CmdOutput { code: Some(2), stdout: stdout.as_bytes().to_vec(), stderr: Vec::new() }
    }

    const JSON_ERROR: &str = r#"{"smartctl":{"exit_status":2,"messages":[{"string":"Read Device Identity failed","severity":"error"}]}}"#;
    const TEXT_ERROR: &str = "smartctl 7.3 2022-02-28\nRead Device Identity failed: scsi error unsupported field in scsi command\n";

    #[test]
    fn failing_query_with_output_is_not_done() {
        let r = ScriptedRunner::new();
        r.on(JSON_STATUS, failing(JSON_ERROR));
        r.on(TEXT_STATUS, failing(TEXT_ERROR));
        let poller = Poller::new(&r, Duration::from_secs(1), 0);
        assert_eq!(poller.poll_once(&drive()), PollOutcome::QueryFailed);
    }

    #[test]
    fn unbounded_failures_keep_polling_until_done() {
        let r = ScriptedRunner::new();
        r.on_ok(JSON_STATUS, &running(60));
        r.on(JSON_STATUS, failing(JSON_ERROR));
        r.on(JSON_STATUS, failing(JSON_ERROR));
        r.on(JSON_STATUS, failing(JSON_ERROR));
        r.on_ok(JSON_STATUS, IDLE_JSON);
        r.on(TEXT_STATUS, failing(TEXT_ERROR));
        r.on(TEXT_STATUS, failing(TEXT_ERROR));
        r.on(TEXT_STATUS, failing(TEXT_ERROR));
        r.on_ok(TEXT_STATUS, IDLE_TEXT);

        let poller = Poller::new(&r, Duration::from_secs(60), 0);
        let mut session = SelfTestSession::new(drive());
        let mut sleeper = CountingSleeper::default();
        poller.wait(&mut session, &mut sleeper);

        assert!(!session.gave_up);
        assert_eq!(session.polls, 5);
        assert_eq!(sleeper.waits.len(), 4);
        assert_eq!(session.progress, vec![Some(60)]);
    }

    #[test]
    fn failed_start_still_polls() {
        let r = ScriptedRunner::new();
        r.on_ok(FULL_TEXT, "report\n");
        r.on(START, CmdOutput { code: Some(4), stdout: b"Can't start self-test\n".to_vec(), stderr: Vec::new() });
        let dir = tempfile::tempdir().unwrap();
        let mut logs = LogDir::create(dir.path()).unwrap();
        let poller = Poller::new(&r, Duration::from_secs(1), 0);
        let mut session = SelfTestSession::new(drive());
        poller.start(&mut session, &mut logs).unwrap();
        assert_eq!(session.phase, Phase::Running);

        let text = std::fs::read_to_string(logs.before_path(&session.drive)).unwrap();
        assert!(text.contains("report"));
        assert!(text.contains("Can't start self-test"));
    }
}
