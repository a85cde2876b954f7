use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Language, Result, SolverError};

const CONFIG_DIR: &str = "screensolve";
const CONFIG_FILE: &str = "config.json";

/// Per-example time limit used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Seconds; fractions allowed.
    pub timeout_secs: f64,
    pub language: Language,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            language: Language::Python,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub screenshot: PathBuf,
    pub solution: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            screenshot: PathBuf::from("screenshots").join("screenshot.png"),
            solution: PathBuf::from("solutions").join("solution.py"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn parse(value: &str) -> Option<LlmProvider> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(LlmProvider::OpenAi),
            "ollama" => Some(LlmProvider::Ollama),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub ollama_host: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: None,
            ollama_host: "http://localhost:11434".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub command: String,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

/// Screenshot command; `{output}` is replaced with the target path.
/// An empty list selects the platform default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub command: Vec<String>,
}

impl CaptureConfig {
    pub fn resolved_command(&self) -> Vec<String> {
        if !self.command.is_empty() {
            return self.command.clone();
        }

        let default: &[&str] = match cfg!(target_os = "macos") {
            true => &["screencapture", "-x", "{output}"],
            false => &["grim", "{output}"],
        };
        default.iter().map(|s| s.to_string()).collect()
    }
}

/// A positive, finite number of seconds.
pub fn parse_timeout_secs(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}

impl SolverConfig {
    /// Per-example time limit for the harness.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.defaults.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    /// Solution artifact path with the extension of the configured language.
    pub fn solution_path(&self) -> PathBuf {
        self.paths
            .solution
            .with_extension(self.defaults.language.file_extension())
    }

    /// `<config_dir>/screensolve/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SolverError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Defaults, then the config file (explicit path or the default location
    /// when it exists), then environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let secs = self.defaults.timeout_secs;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(SolverError::Config(format!(
                "timeout_secs must be a positive number of seconds, got {}",
                secs
            )));
        }
        Ok(())
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(model) = var("SCREENSOLVE_MODEL") {
            self.llm.model = model;
        }

        if let Some(provider) = var("SCREENSOLVE_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider).ok_or_else(|| {
                SolverError::Config(format!("Unknown SCREENSOLVE_PROVIDER: {}", provider))
            })?;
        }

        if let Some(host) = var("OLLAMA_HOST") {
            self.llm.ollama_host = host;
        }

        if let Some(timeout) = var("SCREENSOLVE_TIMEOUT") {
            self.defaults.timeout_secs = parse_timeout_secs(&timeout).ok_or_else(|| {
                SolverError::Config(format!("Invalid SCREENSOLVE_TIMEOUT: {}", timeout))
            })?;
        }

        tracing::debug!(
            "Config: provider={:?} model={} timeout={}s",
            self.llm.provider,
            self.llm.model,
            self.defaults.timeout_secs
        );
        Ok(())
    }
}
