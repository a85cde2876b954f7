// Domain modules
pub mod collaborators;
pub mod config;
pub mod error;
pub mod execution;
pub mod language;
pub mod problem;

pub use collaborators::{ScreenCapture, SolutionGenerator, TextExtractor};
pub use config::{
    parse_timeout_secs, CaptureConfig, DefaultsConfig, LlmConfig, LlmProvider, OcrConfig, PathsConfig,
    SolverConfig, DEFAULT_TIMEOUT_SECS,
};
pub use error::{Result, SolverError};
pub use execution::{ExecutionResult, ExecutionSummary, HarnessFault};
pub use language::Language;
pub use problem::{Example, ProblemRecord};
