use anyhow::{Context, Result};
use std::process::Command;
use tracing::debug;

/// Captured result of one external command.
#[derive(Debug, Clone, Default)]
pub struct CmdOutput {
    /// Exit code; None if the process was killed by a signal.
    pub code:   Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CmdOutput {
    #[cfg(test)]
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self { code: Some(0), stdout: stdout.into(), stderr: Vec::new() }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// stdout followed by stderr, for writing tool output verbatim to a log.
    pub fn combined(&self) -> String {
        let mut text = self.stdout_str();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&String::from_utf8_lossy(&self.stderr));
        }
        text
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.iter().all(u8::is_ascii_whitespace)
    }
}

/// Launches external programs. Every smartctl / lsblk / badblocks call goes
/// through this so the pipeline can be driven from scripted output in tests.
pub trait Runner {
    fn run(&self, program: &str, args: &[String]) -> Result<CmdOutput>;
}

/// Runs commands on the host and waits for them to exit.
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CmdOutput> {
        debug!(program, ?args, "exec");
        let out = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to launch {}", program))?;
        // smartctl encodes SMART findings in its exit status bits, so callers
        // inspect the output rather than treating non-zero as failure.
        debug!(program, code = ?out.status.code(), bytes = out.stdout.len(), "exit");
        Ok(CmdOutput { code: out.status.code(), stdout: out.stdout, stderr: out.stderr })
    }
}

pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_appends_stderr_on_new_line() {
        let out = CmdOutput { code: Some(1), stdout: b"a".to_vec(), stderr: b"b\n".to_vec() };
        assert_eq!(out.combined(), "a\nb\n");
        assert!(!out.success());
    }

    #[test]
    fn whitespace_only_stdout_counts_as_empty() {
        assert!(CmdOutput::ok(" \n\t").is_empty());
        assert!(!CmdOutput::ok("{}").is_empty());
    }
}
