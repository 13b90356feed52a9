//! Client error types.
//!
//! Defines `ClientError` for every way a call through the transport can fail.
//! The three server-driven kinds map directly onto what the response
//! interceptor observed:
//! - HTTP status other than 200 → `Transport`
//! - envelope `code == 401` → `Unauthenticated`
//! - any other envelope `code != 200` → `Application`
//!
//! `Cancelled` is raised when the caller's cancellation token fires first.

use thiserror::Error;

/// Message used when the server sent an envelope without `msg`.
pub const DEFAULT_MESSAGE: &str = "Error";

/// Message shown for HTTP-level failures.
pub const NETWORK_ERROR_MESSAGE: &str = "Network connection error";

#[derive(Error, Debug)]
pub enum ClientError {
    /// `message` is the rejected body's `msg` when it has one.
    #[error("{message} (HTTP {status})")]
    Transport { status: u16, message: String, body: String },

    #[error("{message}")]
    Unauthenticated { message: String },

    #[error("{message}")]
    Application { code: i64, message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Envelope code that produced this error, if the server got that far.
    pub fn code(&self) -> Option<i64> {
        match self {
            ClientError::Unauthenticated { .. } => Some(401),
            ClientError::Application { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ClientError::Unauthenticated { .. })
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
