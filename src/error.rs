//! Error handling and custom error types
//!
//! One enum carries the whole failure taxonomy: validation errors rejected
//! before any capability call, upstream capability failures surfaced as
//! gateway-class errors, and internal faults that must never leak detail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// The generation capability answered without a usable image payload.
    #[error("no output image in generation response")]
    NoOutput,

    #[error("llm failed: {0}")]
    LlmFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::UploadFailed(_) => "upload_failed",
            Error::AnalysisFailed(_) => "analysis_failed",
            Error::GenerationFailed(_) => "generation_failed",
            Error::NoOutput => "no_output",
            Error::LlmFailed(_) => "llm_failed",
            _ => "internal_error",
        }
    }

    /// Detail string safe to return to the caller. Internal variants get
    /// none: their context goes to the logs, not the response body.
    pub fn public_detail(&self) -> Option<String> {
        match self {
            Error::Validation(detail)
            | Error::UploadFailed(detail)
            | Error::AnalysisFailed(detail)
            | Error::GenerationFailed(detail)
            | Error::LlmFailed(detail) => Some(detail.clone()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
