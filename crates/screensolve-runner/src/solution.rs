use std::path::Path;

use screensolve_core::{Example, Result};

/// Overwrites the solution artifact, creating its directory if needed.
pub async fn write_solution(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, source).await?;
    tracing::info!("Solution written to {}", path.display());
    Ok(())
}

/// Reads a JSON array of `{"input": ..., "output": ...}` objects.
pub fn load_examples(path: &Path) -> Result<Vec<Example>> {
    let content = std::fs::read_to_string(path)?;
    let examples: Vec<Example> = serde_json::from_str(&content)?;
    Ok(examples
        .into_iter()
        .map(|ex| Example::new(ex.input, ex.output))
        .collect())
}
