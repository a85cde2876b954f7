//! Narrow interfaces to the pieces that live outside the parser and harness:
//! the OS screenshot facility, the OCR engine and the hosted language model.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{Language, Result};

#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Saves a screenshot to `output` and returns the path written.
    async fn capture(&self, output: &Path) -> Result<PathBuf>;
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Returns the recognised text, or an empty string when nothing was read.
    async fn extract_text(&self, image: &Path) -> Result<String>;
}

#[async_trait]
pub trait SolutionGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Returns program source that reads stdin and writes stdout.
    async fn generate_solution(&self, problem_text: &str, language: Language) -> Result<String>;
}
