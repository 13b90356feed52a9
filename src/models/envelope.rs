use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DEFAULT_MESSAGE;

/// Envelope code for a successful call.
pub const CODE_OK: i64 = 200;

/// Envelope code for a missing or expired session.
pub const CODE_UNAUTHENTICATED: i64 = 401;

/// The `{code, data, msg}` wrapper the server puts around every response.
///
/// `data` may be absent on failures, so it defaults to `Value::Null` when
/// decoding the untyped form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub code: i64,
    #[serde(default)]
    pub data: T,
    #[serde(rename = "msg", default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.code == CODE_UNAUTHENTICATED
    }

    /// Server message, or the generic fallback when `msg` was null or missing.
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_MESSAGE)
    }
}
