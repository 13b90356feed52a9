//! Request interception.
//!
//! Every outgoing request passes through one [`RequestInterceptor`] before it
//! is sent. This is where auth headers get attached.

use reqwest::RequestBuilder;
use reqwest::header::{COOKIE, HeaderValue};

use crate::error::{ClientError, Result};

pub trait RequestInterceptor: Send + Sync {
    /// Adjust the pending request. An error aborts the call and is returned
    /// to the caller unchanged.
    fn on_request(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request)
    }
}

/// Sends requests as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl RequestInterceptor for PassThrough {}

/// Attaches a session token as the `token` cookie the server checks.
#[derive(Clone)]
pub struct SessionCookie {
    header: HeaderValue,
}

impl SessionCookie {
    pub fn new(token: &str) -> Result<Self> {
        let mut header = HeaderValue::from_str(&format!("token={}", token))
            .map_err(|e| ClientError::InvalidRequest(format!("session token is not a valid cookie: {}", e)))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl RequestInterceptor for SessionCookie {
    fn on_request(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.header(COOKIE, self.header.clone()))
    }
}
