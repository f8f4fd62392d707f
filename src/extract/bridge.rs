use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::info;

use crate::extract::process::run_with_timeout;
use crate::extract::Extractor;

/// What the bridge script prints on stdout.
///
/// Either an object with the full text, or a list of detected segments which
/// are joined with single spaces.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BridgeOutput {
    Text { text: String },
    Segments(Vec<String>),
}

impl BridgeOutput {
    pub fn into_text(self) -> String {
        match self {
            BridgeOutput::Text { text } => text,
            BridgeOutput::Segments(segments) => segments.join(" "),
        }
    }
}

/// Runs a Python-hosted engine through a helper script.
///
/// The script is called as
/// `<python> <script> --engine <engine> --image <path> [--lang <lang>]`
/// and must print a [`BridgeOutput`] as JSON.
///
/// The script is not shipped with this crate. Point `with_script` (or the
/// `engines.bridge_script` setting / `--script` flag) at your own wrapper
/// around the engine; the default `ocr/bridge/ocr_bridge.py` is only a
/// conventional location.
#[derive(Debug, Clone)]
pub struct ScriptExtractor {
    engine: String,
    python: PathBuf,
    script_path: PathBuf,
    lang: Option<String>,
    timeout: Duration,
}

impl ScriptExtractor {
    pub fn new(engine: impl Into<String>) -> Self {
        let engine = engine.into();
        let script_path = PathBuf::from("ocr/bridge/ocr_bridge.py");
        info!(engine = %engine, script = %script_path.display(), "script extractor initialized");
        Self {
            engine,
            python: PathBuf::from("python3"),
            script_path,
            lang: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_script(mut self, script_path: PathBuf) -> Self {
        self.script_path = script_path;
        self
    }

    pub fn with_python(mut self, python: PathBuf) -> Self {
        self.python = python;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = Some(lang);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, image: &Path) -> Command {
        let mut command = Command::new(&self.python);
        command
            .arg(&self.script_path)
            .arg("--engine")
            .arg(&self.engine)
            .arg("--image")
            .arg(image);
        if let Some(lang) = &self.lang {
            command.arg("--lang").arg(lang);
        }
        command
    }
}

impl Extractor for ScriptExtractor {
    fn name(&self) -> &str {
        &self.engine
    }

    fn extract(&self, image: &Path) -> Result<String> {
        if !self.script_path.is_file() {
            anyhow::bail!(
                "{} bridge script not found at {}; supply one via --script or engines.bridge_script",
                self.engine,
                self.script_path.display()
            );
        }
        let output = run_with_timeout(&mut self.command(image), self.timeout)
            .with_context(|| format!("{} bridge failed on {}", self.engine, image.display()))?;
        let parsed: BridgeOutput = serde_json::from_str(output.stdout.trim())
            .with_context(|| format!("failed to parse {} bridge JSON response", self.engine))?;
        Ok(parsed.into_text())
    }
}
