use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use screensolve_core::{CaptureConfig, Result, ScreenCapture, SolverError};
use tokio::process::Command;

const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Takes screenshots with an external tool (`grim`, `screencapture`, ...).
#[derive(Debug, Clone)]
pub struct CommandCapture {
    argv: Vec<String>,
}

impl CommandCapture {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            argv: config.resolved_command(),
        }
    }

    fn argv_for(&self, output: &Path) -> Vec<String> {
        let target = output.to_string_lossy();
        self.argv
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &target))
            .collect()
    }
}

#[async_trait]
impl ScreenCapture for CommandCapture {
    async fn capture(&self, output: &Path) -> Result<PathBuf> {
        let argv = self.argv_for(output);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SolverError::Capture("empty capture command".to_string()))?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::info!("Capturing screen with {}", program);
        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SolverError::Capture(format!("failed to run {}: {}", program, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(SolverError::Capture(format!(
                "{} exited with {}: {}",
                program,
                result.status,
                stderr.trim()
            )));
        }

        if !output.exists() {
            return Err(SolverError::Capture(format!(
                "{} did not write {}",
                program,
                output.display()
            )));
        }

        Ok(output.to_path_buf())
    }
}
