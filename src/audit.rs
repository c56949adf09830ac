//! Append-only, human-readable action log. One timestamped line per
//! significant action; written best-effort so a read-only filesystem or
//! missing privileges never turn an otherwise-successful run into a failure.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_LOG_PATH: &str = "/var/log/portctl.log";

pub struct AuditLog {
    path: PathBuf,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}

impl AuditLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one timestamped line. Failures degrade to a warning.
    pub fn record(&self, message: &str) {
        let line = format!(
            "{} {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            warn!("Could not write audit log {}: {}", self.path.display(), e);
        }
    }
}
