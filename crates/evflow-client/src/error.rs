//! Client error types

use evflow_core::EvflowError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by the flow API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// A path id was not a UUID; raised before any request is built
    #[error("invalid {field}: `{value}` is not a UUID")]
    InvalidId { field: &'static str, value: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] EvflowError),
}

impl ApiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status for backend rejections
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
