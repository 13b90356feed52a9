//! Transport core: the single shared HTTP client every call goes through.
//!
//! Owns the fixed base address and both interception stages:
//! - request: [`RequestInterceptor`] (pass-through unless a session token is configured)
//! - response: HTTP status check, envelope unwrap, 401 redirect, error notification
//!
//! Cloning a `Transport` is cheap and shares the same client, cookie store
//! and redirect state.

pub mod interceptor;
pub mod notify;
pub mod session;

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode, Url};
use tracing::{trace, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, DEFAULT_MESSAGE, NETWORK_ERROR_MESSAGE, Result};
use crate::models::{CODE_OK, CODE_UNAUTHENTICATED, Envelope};

pub use interceptor::{PassThrough, RequestInterceptor, SessionCookie};
pub use notify::{LogNotifier, Notifier};
pub use session::{LOGIN_PATH, LogNavigator, Navigator, SessionRedirect};

/// Download progress for one response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes received so far.
    pub loaded: u64,
    /// `Content-Length`, when the server sent one.
    pub total: Option<u64>,
}

impl Progress {
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some(self.loaded as f64 / total as f64),
            None => None,
        }
    }
}

pub type ProgressFn = Box<dyn FnMut(Progress) + Send>;

#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    http: reqwest::Client,
    interceptor: Arc<dyn RequestInterceptor>,
    notifier: Arc<dyn Notifier>,
    session: SessionRedirect,
}

pub struct TransportBuilder {
    config: ClientConfig,
    interceptor: Option<Arc<dyn RequestInterceptor>>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl TransportBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Replace the request interceptor. Overrides the session cookie derived
    /// from the configured token.
    pub fn interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn build(self) -> Result<Transport> {
        Url::parse(&self.config.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("{}: {}", self.config.base_url, e)))?;

        let http = reqwest::Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .cookie_store(true)
            .build()?;

        let interceptor: Arc<dyn RequestInterceptor> = match (self.interceptor, &self.config.token) {
            (Some(interceptor), _) => interceptor,
            (None, Some(token)) => Arc::new(SessionCookie::new(token)?),
            (None, None) => Arc::new(PassThrough),
        };

        Ok(Transport {
            inner: Arc::new(Inner {
                config: self.config,
                http,
                interceptor,
                notifier: self.notifier,
                session: SessionRedirect::new(self.navigator),
            }),
        })
    }
}

impl Transport {
    pub fn builder(config: ClientConfig) -> TransportBuilder {
        TransportBuilder {
            config,
            interceptor: None,
            notifier: Arc::new(LogNotifier),
            navigator: Arc::new(LogNavigator),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &SessionRedirect {
        &self.inner.session
    }

    /// Start a request for `path` relative to the base address.
    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder> {
        let endpoint = self.inner.config.endpoint(path);
        let url = Url::parse(&endpoint).map_err(|e| ClientError::InvalidRequest(format!("{}: {}", endpoint, e)))?;
        Ok(self.inner.http.request(method, url))
    }

    /// Run request interception, send, read the body and run response
    /// interception. Resolves with the whole envelope; callers take `data`.
    pub(crate) async fn send(&self, request: RequestBuilder, on_progress: Option<ProgressFn>) -> Result<Envelope> {
        let request = self.inner.interceptor.on_request(request)?;
        let response = request.send().await?;
        let status = response.status();
        let body = read_body(response, on_progress).await?;
        self.intercept_response(status, &body)
    }

    /// Response interception, applied to every response in order:
    /// 1. HTTP status other than 200 → notify, `Transport`
    /// 2. body is not an envelope → notify, `Decode`
    /// 3. envelope code 401 → notify, redirect to login, `Unauthenticated`
    /// 4. envelope code other than 200 → notify, `Application`
    /// 5. otherwise the envelope itself
    pub fn intercept_response(&self, status: StatusCode, body: &[u8]) -> Result<Envelope> {
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "unexpected HTTP status");
            self.inner.notifier.error(NETWORK_ERROR_MESSAGE);
            return Err(ClientError::Transport {
                status: status.as_u16(),
                message: body_message(body).unwrap_or_else(|| NETWORK_ERROR_MESSAGE.to_string()),
                body: String::from_utf8_lossy(body).into_owned(),
            });
        }

        let envelope: Envelope = match serde_json::from_slice(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                let message = body_message(body).unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
                warn!(error = %e, %message, "response is not an envelope");
                self.inner.notifier.error(&message);
                return Err(e.into());
            }
        };
        match envelope.code {
            CODE_OK => {
                self.inner.session.clear();
                Ok(envelope)
            }
            CODE_UNAUTHENTICATED => {
                let message = envelope.message_or_default().to_string();
                warn!(%message, "unauthenticated");
                self.inner.notifier.error(&message);
                self.inner.session.trigger();
                Err(ClientError::Unauthenticated { message })
            }
            code => {
                let message = envelope.message_or_default().to_string();
                warn!(code, %message, "server rejected call");
                self.inner.notifier.error(&message);
                Err(ClientError::Application { code, message })
            }
        }
    }
}

/// `msg` of a body that is JSON but not necessarily a well-formed envelope.
fn body_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("msg")?
        .as_str()
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

async fn read_body(mut response: Response, mut on_progress: Option<ProgressFn>) -> Result<Vec<u8>> {
    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0).min(1 << 20) as usize);
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        let progress = Progress {
            loaded: body.len() as u64,
            total,
        };
        trace!(loaded = progress.loaded, total = ?progress.total, "response chunk");
        if let Some(callback) = on_progress.as_mut() {
            callback(progress);
        }
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Notifier for Recorder {
        fn error(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    impl Navigator for Recorder {
        fn navigate(&self, path: &str) {
            self.0.lock().unwrap().push(path.to_string());
        }
    }

    fn transport() -> (Transport, Arc<Recorder>, Arc<Recorder>) {
        let notes = Arc::new(Recorder::default());
        let nav = Arc::new(Recorder::default());
        let transport = Transport::builder(ClientConfig::new("http://127.0.0.1:1/api"))
            .notifier(notes.clone())
            .navigator(nav.clone())
            .build()
            .unwrap();
        (transport, notes, nav)
    }

    #[test]
    fn ok_envelope_passes_through_whole() {
        let (t, notes, nav) = transport();
        let env = t
            .intercept_response(StatusCode::OK, br#"{"code":200,"data":{"token":"t1"},"msg":null}"#)
            .unwrap();
        assert_eq!(env.code, 200);
        assert_eq!(env.data["token"], "t1");
        assert!(notes.0.lock().unwrap().is_empty());
        assert!(nav.0.lock().unwrap().is_empty());
    }

    #[test]
    fn non_ok_status_is_transport_error_regardless_of_body() {
        let (t, notes, nav) = transport();
        let err = t
            .intercept_response(StatusCode::UNAUTHORIZED, br#"{"code":401,"msg":"auth failed"}"#)
            .unwrap_err();
        match &err {
            ClientError::Transport { status, message, body } => {
                assert_eq!(*status, 401);
                assert_eq!(message, "auth failed");
                assert!(body.contains("auth failed"));
                assert_eq!(err.to_string(), "auth failed (HTTP 401)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*notes.0.lock().unwrap(), vec![NETWORK_ERROR_MESSAGE.to_string()]);
        assert!(nav.0.lock().unwrap().is_empty());
    }

    #[test]
    fn unauthenticated_notifies_and_redirects_once() {
        let (t, notes, nav) = transport();
        for _ in 0..3 {
            let err = t
                .intercept_response(StatusCode::OK, br#"{"code":401,"msg":"expired"}"#)
                .unwrap_err();
            assert!(err.is_unauthenticated());
            assert_eq!(err.to_string(), "expired");
        }
        assert_eq!(*nav.0.lock().unwrap(), vec![LOGIN_PATH.to_string()]);
        assert_eq!(notes.0.lock().unwrap().len(), 3);
    }

    #[test]
    fn success_rearms_redirect() {
        let (t, _, nav) = transport();
        let _ = t.intercept_response(StatusCode::OK, br#"{"code":401,"msg":"expired"}"#);
        t.intercept_response(StatusCode::OK, br#"{"code":200,"data":"t2","msg":"ok"}"#)
            .unwrap();
        let _ = t.intercept_response(StatusCode::OK, br#"{"code":401,"msg":"expired"}"#);
        assert_eq!(nav.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn failed_relogin_keeps_redirect_pending() {
        let (t, notes, nav) = transport();
        let _ = t.intercept_response(StatusCode::OK, br#"{"code":401,"msg":"expired"}"#);
        let _ = t.intercept_response(StatusCode::OK, br#"{"code":300,"msg":"wrong password"}"#);
        let _ = t.intercept_response(StatusCode::BAD_GATEWAY, b"");
        let _ = t.intercept_response(StatusCode::OK, br#"{"code":401,"msg":"expired"}"#);

        assert_eq!(*nav.0.lock().unwrap(), vec![LOGIN_PATH.to_string()]);
        assert!(t.session().is_pending());
        assert_eq!(notes.0.lock().unwrap().len(), 4);
    }

    #[test]
    fn application_error_keeps_code_and_message() {
        let (t, notes, nav) = transport();
        let err = t
            .intercept_response(StatusCode::OK, br#"{"code":300,"data":null,"msg":"id not found"}"#)
            .unwrap_err();
        assert_eq!(err.code(), Some(300));
        assert_eq!(err.to_string(), "id not found");
        assert_eq!(*notes.0.lock().unwrap(), vec!["id not found".to_string()]);
        assert!(nav.0.lock().unwrap().is_empty());
    }

    #[test]
    fn non_ok_status_without_envelope_uses_network_message() {
        let (t, notes, _) = transport();
        let err = t
            .intercept_response(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>")
            .unwrap_err();
        assert_eq!(err.to_string(), "Network connection error (HTTP 502)");
        assert_eq!(*notes.0.lock().unwrap(), vec![NETWORK_ERROR_MESSAGE.to_string()]);
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let (t, notes, nav) = transport();
        let err = t.intercept_response(StatusCode::OK, b"<html>").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(*notes.0.lock().unwrap(), vec![DEFAULT_MESSAGE.to_string()]);
        assert!(nav.0.lock().unwrap().is_empty());
    }

    #[test]
    fn envelope_without_code_notifies_its_message() {
        let (t, notes, _) = transport();
        let err = t
            .intercept_response(StatusCode::OK, br#"{"msg":"server broke"}"#)
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(*notes.0.lock().unwrap(), vec!["server broke".to_string()]);
    }

    #[test]
    fn progress_fraction() {
        let p = Progress { loaded: 50, total: Some(200) };
        assert_eq!(p.fraction(), Some(0.25));
        assert_eq!(Progress { loaded: 5, total: None }.fraction(), None);
    }

    #[test]
    fn builder_rejects_bad_base_url() {
        let res = Transport::builder(ClientConfig::new("not a url")).build();
        assert!(matches!(res, Err(ClientError::InvalidRequest(_))));
    }
}
