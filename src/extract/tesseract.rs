use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::info;

use crate::extract::process::run_with_timeout;
use crate::extract::Extractor;

/// Drives the `tesseract` command-line binary.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    name: String,
    cmd: PathBuf,
    lang: String,
    timeout: Duration,
}

impl TesseractExtractor {
    pub fn new(cmd: PathBuf) -> Self {
        info!(cmd = %cmd.display(), "tesseract extractor initialized");
        Self {
            name: "tesseract".to_string(),
            cmd,
            lang: "eng".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Extractor for TesseractExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, image: &Path) -> Result<String> {
        let mut command = Command::new(&self.cmd);
        command.arg(image).arg("stdout").arg("-l").arg(&self.lang);
        let output = run_with_timeout(&mut command, self.timeout)
            .with_context(|| format!("tesseract failed on {}", image.display()))?;
        Ok(output.stdout)
    }
}
