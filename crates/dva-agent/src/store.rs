//! On-disk artifacts: the per-run results file and the request history.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::Value;

use dva_core::RequestRecord;

/// Append-only history of every request made during the run. Flushed to
/// `request_history.json` at shutdown.
pub struct RequestHistory {
    entries: Mutex<Vec<RequestRecord>>,
}

impl RequestHistory {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append one record.
    pub fn record(&self, record: RequestRecord) {
        self.entries.lock().unwrap().push(record);
    }

    /// Number of recorded requests.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Write the history file into `dir`.
    pub fn save(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join("request_history.json");
        let entries = self.entries.lock().unwrap();
        fs::write(&path, serde_json::to_string_pretty(&*entries)?)?;
        Ok(path)
    }
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects server responses and writes them to
/// `results/dva_results_<stamp>.json` at shutdown.
pub struct ResultStore {
    dir: PathBuf,
    results: Mutex<Vec<Value>>,
}

impl ResultStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("results"),
            results: Mutex::new(Vec::new()),
        }
    }

    /// Record one accepted server response.
    pub fn push(&self, response: Value) {
        self.results.lock().unwrap().push(response);
    }

    /// Number of collected responses.
    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    /// Write the results file for this run.
    pub fn save(&self) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("dva_results_{stamp}.json"));
        let results = self.results.lock().unwrap();
        fs::write(&path, serde_json::to_string_pretty(&*results)?)?;
        Ok(path)
    }
}
