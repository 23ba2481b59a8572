//! Append-only JSONL journal of finished loop runs.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::LoopReport;
use crate::error::{DeskloopError, Result};

/// Journal file inside the journal directory
const JOURNAL_FILE: &str = "runs.jsonl";

pub struct JsonlJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlJournal {
    /// Open (or create) a journal in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(JOURNAL_FILE),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one report as a single line.
    pub fn append(&self, report: &LoopReport) -> Result<()> {
        let line = serde_json::to_string(report)?;
        let _guard = self.write_lock.lock().map_err(|e| DeskloopError::Journal(e.to_string()))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// All reports, oldest first.
    pub fn list(&self) -> Result<Vec<LoopReport>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut reports = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let report = serde_json::from_str(&line).map_err(|e| {
                DeskloopError::Journal(format!("{}:{}: {}", self.path.display(), lineno + 1, e))
            })?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// The most recent `n` reports, oldest first.
    pub fn recent(&self, n: usize) -> Result<Vec<LoopReport>> {
        let mut all = self.list()?;
        let skip = all.len().saturating_sub(n);
        Ok(all.split_off(skip))
    }

    /// Report for a task id, if journaled.
    pub fn get(&self, task_id: &str) -> Result<Option<LoopReport>> {
        Ok(self.list()?.into_iter().find(|r| r.task.id() == task_id))
    }
}
