//! JSON persistence for result sets, consensus output and the debug report.
//!
//! Layout under the output directory:
//!
//! - `<engine>_results.json`: one file per engine, name lowercased
//! - `ocr_results.json`: the consensus output
//! - `consensus_report.json`: per-item scores, written in debug mode

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::model::{ConsensusResult, ExtractionResult, ItemReport, ResultSet};
use crate::core::{ConsensusError, Result};

pub const CONSENSUS_FILE: &str = "ocr_results.json";
pub const REPORT_FILE: &str = "consensus_report.json";

#[derive(Debug, Clone)]
pub struct ResultStore {
    out_dir: PathBuf,
}

impl ResultStore {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn result_path(&self, engine: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}_results.json", engine.to_lowercase()))
    }

    pub fn consensus_path(&self) -> PathBuf {
        self.out_dir.join(CONSENSUS_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.out_dir.join(REPORT_FILE)
    }

    pub fn has_results(&self, engine: &str) -> bool {
        self.result_path(engine).is_file()
    }

    /// Writes a result set, replacing any earlier run of the same engine.
    pub fn save_results(&self, set: &ResultSet) -> Result<PathBuf> {
        let path = self.result_path(&set.engine);
        self.write_json(&path, &set.results)?;
        info!(engine = %set.engine, items = set.len(), path = %path.display(), "saved result set");
        Ok(path)
    }

    pub fn load_results(&self, engine: &str) -> Result<ResultSet> {
        let path = self.result_path(engine);
        let results: Vec<ExtractionResult> = self.read_json(&path)?;
        debug!(engine, items = results.len(), "loaded result set");
        Ok(ResultSet::new(engine, results))
    }

    pub fn save_consensus(&self, results: &[ConsensusResult]) -> Result<PathBuf> {
        let path = self.consensus_path();
        self.write_json(&path, results)?;
        info!(items = results.len(), path = %path.display(), "saved consensus results");
        Ok(path)
    }

    pub fn load_consensus(&self) -> Result<Vec<ConsensusResult>> {
        self.read_json(&self.consensus_path())
    }

    pub fn save_report(&self, report: &[ItemReport]) -> Result<PathBuf> {
        let path = self.report_path();
        self.write_json(&path, report)?;
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .map_err(|e| ConsensusError::persistence(&self.out_dir, e))?;
        let data =
            serde_json::to_string_pretty(value).map_err(|e| ConsensusError::persistence(path, e))?;
        fs::write(path, data).map_err(|e| ConsensusError::persistence(path, e))
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let data = fs::read_to_string(path).map_err(|e| ConsensusError::persistence(path, e))?;
        serde_json::from_str(&data).map_err(|e| ConsensusError::persistence(path, e))
    }
}
