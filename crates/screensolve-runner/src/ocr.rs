use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use screensolve_core::{OcrConfig, Result, TextExtractor};
use tokio::process::Command;

/// Shells out to the `tesseract` binary. Failures are logged and come back
/// as empty text; an empty OCR result is valid parser input.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
        }
    }

    async fn run(&self, image: &Path) -> std::result::Result<String, String> {
        if !image.exists() {
            return Err(format!("image not found: {}", image.display()));
        }

        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} exited with {}: {}", self.command, output.status, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl TextExtractor for TesseractOcr {
    async fn extract_text(&self, image: &Path) -> Result<String> {
        match self.run(image).await {
            Ok(text) => {
                tracing::info!("OCR read {} chars from {}", text.len(), image.display());
                Ok(text)
            }
            Err(e) => {
                tracing::warn!("OCR failed: {}", e);
                Ok(String::new())
            }
        }
    }
}
