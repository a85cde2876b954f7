use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Solution generation failed: {0}")]
    Generation(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SolverError>;
