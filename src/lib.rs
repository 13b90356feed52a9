//! Client for the go-sync review server.
//!
//! Everything goes through one shared [`Transport`]:
//! - `config`: base address and session token, read once at startup
//! - `transport`: HTTP client with request/response interception, login redirect, notifications
//! - `dispatch`: `Call` descriptors and the `get`/`post`/`dispatch` entry points
//! - `api`: typed operations (login, repositories, commit history, revert)
//! - `models`: wire DTOs, including the `{code, data, msg}` envelope

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod transport;

pub use api::ReviewApi;
pub use config::ClientConfig;
pub use dispatch::{Body, Call, Method, Payload};
pub use error::{ClientError, Result};
pub use transport::{LOGIN_PATH, Navigator, Notifier, Progress, RequestInterceptor, Transport};
