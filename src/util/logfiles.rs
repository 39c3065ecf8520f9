use crate::models::drive::DriveRecord;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-run log directory. File names are keyed by serial, so reruns
/// overwrite the previous run's files.
#[derive(Debug)]
pub struct LogDir {
    root:     PathBuf,
    produced: Vec<PathBuf>,
}

impl LogDir {
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("cannot create log directory {}", root.display()))?;
        Ok(Self { root, produced: Vec::new() })
    }

    pub fn before_path(&self, drive: &DriveRecord) -> PathBuf {
        self.root.join(format!("{}_smart_before.txt", drive.file_stem()))
    }

    pub fn after_path(&self, drive: &DriveRecord) -> PathBuf {
        self.root.join(format!("{}_smart_after.txt", drive.file_stem()))
    }

    pub fn badblocks_path(&self, drive: &DriveRecord) -> PathBuf {
        self.root.join(format!("{}_badblocks.log", drive.file_stem()))
    }

    /// Truncate `path` and write a timestamped header followed by `body`.
    pub fn write(&mut self, path: &Path, title: &str, body: &str) -> Result<()> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let text = format!("# {} — {}\n\n{}", title, now, body);
        fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
        self.record(path);
        Ok(())
    }

    /// Append a titled section to an existing log.
    pub fn append(&mut self, path: &Path, title: &str, body: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        write!(file, "\n# {}\n\n{}", title, body)
            .with_context(|| format!("cannot write {}", path.display()))?;
        self.record(path);
        Ok(())
    }

    /// Every file written during this run, in first-write order.
    pub fn produced(&self) -> &[PathBuf] {
        &self.produced
    }

    fn record(&mut self, path: &Path) {
        if !self.produced.iter().any(|p| p == path) {
            self.produced.push(path.to_path_buf());
        }
    }
}
