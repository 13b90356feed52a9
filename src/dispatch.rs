//! Dispatch layer: turns one [`Call`] into one network call and one outcome.
//!
//! - `before_call` runs first, unconditionally
//! - the body is resolved at dispatch time (a lazy body is invoked exactly once)
//! - GET sends the body as query parameters and ignores custom headers;
//!   POST sends it as a JSON body with the custom headers
//! - success resolves with `envelope.data` decoded as `T`
//! - any failure runs `after_call` once, then returns the error
//!
//! A cancellation token (or a timeout, which is a timer on a child of that token)
//! aborts the in-flight request and yields [`ClientError::Cancelled`].

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::models::Envelope;
use crate::transport::{Progress, ProgressFn, Transport};

/// Key/value data sent with a call.
pub type Payload = Map<String, Value>;

pub type Hook = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Request data, either fixed up front or computed when the call is dispatched.
pub enum Body {
    Literal(Payload),
    Lazy(Box<dyn FnOnce() -> Payload + Send>),
}

impl Body {
    pub fn lazy(f: impl FnOnce() -> Payload + Send + 'static) -> Self {
        Body::Lazy(Box::new(f))
    }

    /// Literal body from any value that serializes to a JSON object.
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Body::Literal(map)),
            Value::Null => Ok(Body::default()),
            _ => Err(serde_json::Error::custom("call data must serialize to a JSON object").into()),
        }
    }

    fn resolve(self) -> Payload {
        match self {
            Body::Literal(payload) => payload,
            Body::Lazy(f) => f(),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Literal(Payload::new())
    }
}

impl From<Payload> for Body {
    fn from(payload: Payload) -> Self {
        Body::Literal(payload)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Literal(payload) => f.debug_tuple("Literal").field(payload).finish(),
            Body::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Everything needed to issue one call.
pub struct Call {
    url: String,
    method: Method,
    body: Body,
    headers: HeaderMap,
    on_progress: Option<ProgressFn>,
    cancel: Option<CancellationToken>,
    timeout: Option<Duration>,
    before_call: Option<Hook>,
    after_call: Option<Hook>,
}

impl Call {
    /// A GET call to `url`, relative to the transport's base address.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::default(),
            body: Body::default(),
            headers: HeaderMap::new(),
            on_progress: None,
            cancel: None,
            timeout: None,
            before_call: None,
            after_call: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::Get)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::Post)
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn lazy_body(self, f: impl FnOnce() -> Payload + Send + 'static) -> Self {
        self.body(Body::lazy(f))
    }

    /// Only sent with POST.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(Progress) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Cancel the call if it has not settled after `duration`.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn before_call(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.before_call = Some(Box::new(f));
        self
    }

    pub fn after_call(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.after_call = Some(Box::new(f));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("cancel", &self.cancel.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Dispatch `call` as a GET.
    pub async fn get<T: DeserializeOwned>(&self, call: Call) -> Result<T> {
        self.dispatch(call.method(Method::Get)).await
    }

    /// Dispatch `call` as a POST.
    pub async fn post<T: DeserializeOwned>(&self, call: Call) -> Result<T> {
        self.dispatch(call.method(Method::Post)).await
    }

    pub async fn dispatch<T: DeserializeOwned>(&self, call: Call) -> Result<T> {
        let Call {
            url,
            method,
            body,
            headers,
            on_progress,
            cancel,
            timeout,
            before_call,
            after_call,
        } = call;

        if let Some(hook) = before_call {
            hook();
        }

        // the timer fires a per-call child so the caller's token stays usable
        let cancel = match timeout {
            Some(_) => Some(cancel.map(|token| token.child_token()).unwrap_or_default()),
            None => cancel,
        };
        let timer = timeout.zip(cancel.clone()).map(|(duration, token)| cancel_after(token, duration));

        let payload = body.resolve();
        debug!(%method, %url, "dispatching call");

        let exchange = self.exchange(method, &url, payload, headers, on_progress);
        let outcome = match &cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(ClientError::Cancelled),
                res = exchange => res,
            },
            None => exchange.await,
        };

        if let Some(timer) = timer {
            timer.abort();
        }

        let outcome = outcome.and_then(unwrap_data::<T>);
        if let Err(err) = &outcome {
            debug!(%method, %url, error = %err, "call failed");
            if let Some(hook) = after_call {
                hook();
            }
        }
        outcome
    }

    async fn exchange(
        &self,
        method: Method,
        url: &str,
        payload: Payload,
        headers: HeaderMap,
        on_progress: Option<ProgressFn>,
    ) -> Result<Envelope> {
        let request = self.request(method.into(), url)?;
        let request = match method {
            Method::Get => {
                if !headers.is_empty() {
                    debug!(%url, count = headers.len(), "custom headers are not sent with GET");
                }
                request.query(&query_pairs(&payload))
            }
            Method::Post => request.headers(headers).json(&payload),
        };
        self.send(request, on_progress).await
    }
}

/// Second check on the envelope before handing `data` to the caller.
fn unwrap_data<T: DeserializeOwned>(envelope: Envelope) -> Result<T> {
    if !envelope.is_ok() {
        return Err(ClientError::Application {
            code: envelope.code,
            message: envelope.message_or_default().to_string(),
        });
    }
    Ok(serde_json::from_value(envelope.data)?)
}

/// Flatten a payload into query pairs: strings as-is, nulls dropped,
/// everything else as JSON text.
fn query_pairs(payload: &Payload) -> Vec<(String, String)> {
    payload
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key.clone(), s.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}

fn cancel_after(token: CancellationToken, duration: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        debug!(?duration, "call timed out");
        token.cancel();
    })
}
