use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consensus::ConsensusEngine;
use crate::core::{ConsensusError, Result};
use crate::extract::{
    collect_inputs, ExtractionOrchestrator, Extractor, ProcessingStrategy, ScriptExtractor,
    TesseractExtractor,
};
use crate::store::ResultStore;

pub const TESSERACT: &str = "tesseract";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub tesseract_cmd: PathBuf,
    pub tesseract_lang: String,
    pub python: PathBuf,
    /// Helper script for Python-hosted engines. Not bundled; point this at
    /// your own script.
    pub bridge_script: PathBuf,
    pub timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            tesseract_lang: "eng".to_string(),
            python: PathBuf::from("python3"),
            bridge_script: PathBuf::from("ocr/bridge/ocr_bridge.py"),
            timeout_secs: 120,
        }
    }
}

/// Settings for both pipeline stages. Loadable from TOML; every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Engines to reconcile. Order matters: ties go to the earlier engine.
    pub engine_names: Vec<String>,
    /// `None` runs sequentially, `0` always in parallel, `n` in parallel above n items.
    pub parallel_threshold: Option<usize>,
    pub engines: EngineSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/selected_images"),
            output_dir: PathBuf::from("data"),
            engine_names: vec![
                "easyocr".to_string(),
                TESSERACT.to_string(),
                "trocr".to_string(),
            ],
            parallel_threshold: None,
            engines: EngineSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, engine_names: Vec<String>) -> Self {
        Self {
            input_dir,
            output_dir,
            engine_names,
            ..Self::default()
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConsensusError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| ConsensusError::config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConsensusError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine_names.is_empty() {
            return Err(ConsensusError::config("engine_names must not be empty"));
        }
        let mut seen = HashSet::new();
        for name in &self.engine_names {
            if name.trim().is_empty() {
                return Err(ConsensusError::config("engine names must not be blank"));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ConsensusError::config(format!(
                    "engine '{name}' listed more than once"
                )));
            }
        }
        if self.engines.timeout_secs == 0 {
            return Err(ConsensusError::config("engines.timeout_secs must be positive"));
        }
        Ok(())
    }

    pub fn strategy(&self) -> ProcessingStrategy {
        match self.parallel_threshold {
            None => ProcessingStrategy::Sequential,
            Some(0) => ProcessingStrategy::Parallel,
            Some(n) => ProcessingStrategy::Auto(n),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.engines.timeout_secs)
    }

    pub fn store(&self) -> ResultStore {
        ResultStore::new(self.output_dir.clone())
    }
}

/// Builds the extractor for an engine name.
///
/// `tesseract` drives the binary directly; every other name is handed to the
/// bridge script, which selects the engine from its `--engine` argument.
pub fn build_extractor(config: &PipelineConfig, engine: &str) -> Box<dyn Extractor> {
    let settings = &config.engines;
    if engine.eq_ignore_ascii_case(TESSERACT) {
        Box::new(
            TesseractExtractor::new(settings.tesseract_cmd.clone())
                .with_name(engine.to_lowercase())
                .with_lang(settings.tesseract_lang.clone())
                .with_timeout(config.timeout()),
        )
    } else {
        Box::new(
            ScriptExtractor::new(engine.to_lowercase())
                .with_python(settings.python.clone())
                .with_script(settings.bridge_script.clone())
                .with_timeout(config.timeout()),
        )
    }
}

/// Runs one engine over the input directory and writes its result set.
pub fn run_extraction(config: &PipelineConfig, extractor: &dyn Extractor) -> Result<PathBuf> {
    let items = collect_inputs(&config.input_dir)?;
    info!(input = %config.input_dir.display(), items = items.len(), "collected input images");
    ExtractionOrchestrator::new(config.store())
        .with_strategy(config.strategy())
        .run(extractor, &items)
}

/// Reconciles the configured engines' result sets and writes the consensus file.
pub fn run_consensus(config: &PipelineConfig, with_report: bool) -> Result<PathBuf> {
    config.validate()?;
    ConsensusEngine::new(config.store())
        .with_strategy(config.strategy())
        .run_and_persist(&config.engine_names, with_report)
}

/// Extracts with every configured engine, then reconciles.
pub fn run_all(config: &PipelineConfig, with_report: bool) -> Result<PathBuf> {
    config.validate()?;
    for engine in &config.engine_names {
        let extractor = build_extractor(config, engine);
        run_extraction(config, extractor.as_ref())?;
    }
    run_consensus(config, with_report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConsensusResult;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Returns a fixed text per file stem.
    struct TableExtractor {
        name: &'static str,
        table: Vec<(&'static str, &'static str)>,
    }

    impl Extractor for TableExtractor {
        fn name(&self) -> &str {
            self.name
        }

        fn extract(&self, image: &Path) -> anyhow::Result<String> {
            let stem = image.file_stem().unwrap().to_string_lossy().into_owned();
            self.table
                .iter()
                .find(|(key, _)| *key == stem)
                .map(|(_, text)| text.to_string())
                .ok_or_else(|| anyhow::anyhow!("no text for {stem}"))
        }
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            input_dir = "scans"
            engine_names = ["tesseract", "easyocr"]
            parallel_threshold = 8

            [engines]
            tesseract_lang = "deu"
            "#,
        )
        .unwrap();

        assert_eq!(config.input_dir, PathBuf::from("scans"));
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert_eq!(config.engine_names, vec!["tesseract", "easyocr"]);
        assert_eq!(config.strategy(), ProcessingStrategy::Auto(8));
        assert_eq!(config.engines.tesseract_lang, "deu");
        assert_eq!(config.engines.timeout_secs, 120);
    }

    #[test]
    fn rejects_invalid_engine_lists() {
        assert!(PipelineConfig::from_toml_str("engine_names = []").is_err());
        assert!(PipelineConfig::from_toml_str(r#"engine_names = ["trocr", "TrOCR"]"#).is_err());
        assert!(PipelineConfig::from_toml_str("[engines]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn strategy_follows_threshold() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.strategy(), ProcessingStrategy::Sequential);
        config.parallel_threshold = Some(0);
        assert_eq!(config.strategy(), ProcessingStrategy::Parallel);
    }

    #[test]
    fn builds_extractor_per_engine_family() {
        let config = PipelineConfig::default();
        assert_eq!(build_extractor(&config, "Tesseract").name(), "tesseract");
        assert_eq!(build_extractor(&config, "EasyOCR").name(), "easyocr");
    }

    #[test]
    fn extraction_then_consensus() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("images");
        fs::create_dir_all(&input).unwrap();
        for name in ["1.jpg", "2.jpg", "ignored.txt"] {
            fs::write(input.join(name), b"x").unwrap();
        }
        let config = PipelineConfig::new(
            input,
            dir.path().join("out"),
            vec!["first".to_string(), "second".to_string(), "third".to_string()],
        );

        let engines = [
            TableExtractor {
                name: "first",
                table: vec![("1", "Hello Wrold"), ("2", "Invoice 1043")],
            },
            TableExtractor {
                name: "second",
                table: vec![("1", "Hello World"), ("2", "Invoice 1O43")],
            },
            TableExtractor {
                name: "third",
                table: vec![("1", "Hello World"), ("2", "Invoice 1043")],
            },
        ];
        for engine in &engines {
            run_extraction(&config, engine).unwrap();
        }

        let path = run_consensus(&config, false).unwrap();
        let results: Vec<ConsensusResult> =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(
            results,
            vec![
                ConsensusResult {
                    item_id: "1.jpg".to_string(),
                    text: "Hello World".to_string(),
                },
                ConsensusResult {
                    item_id: "2.jpg".to_string(),
                    text: "Invoice 1043".to_string(),
                },
            ]
        );
    }
}
