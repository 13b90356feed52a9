//! In-process fake of the go-sync server plus recording doubles for the
//! transport's notifier and navigator.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use sync_viewer::{ClientConfig, Navigator, Notifier, ReviewApi, Transport};

pub const API_PREFIX: &str = "/api";

/// A request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path below the API prefix, e.g. `/commits`.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Clone, Default)]
struct ServerState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    replies: Arc<Mutex<HashMap<String, Reply>>>,
}

pub struct FakeServer {
    pub base_url: String,
    state: ServerState,
}

impl FakeServer {
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}{}", addr, API_PREFIX),
            state,
        }
    }

    /// Answer every request to `path` with `reply`.
    pub fn reply(&self, path: &str, reply: Reply) {
        self.state.replies.lock().unwrap().insert(path.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone())
    }
}

async fn handle(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or(uri.path())
        .to_string();

    state.requests.lock().unwrap().push(Recorded {
        method,
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let reply = state.replies.lock().unwrap().get(&path).cloned();
    let Some(reply) = reply else {
        return (StatusCode::NOT_FOUND, "no reply configured").into_response();
    };
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    (reply.status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response()
}

/// Records every notification and navigation the transport performs.
#[derive(Default)]
pub struct Recorder {
    pub notifications: Mutex<Vec<String>>,
    pub navigations: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

impl Notifier for Recorder {
    fn error(&self, message: &str) {
        self.notifications.lock().unwrap().push(message.to_string());
    }
}

impl Navigator for Recorder {
    fn navigate(&self, path: &str) {
        self.navigations.lock().unwrap().push(path.to_string());
    }
}

pub fn transport(server: &FakeServer, recorder: &Arc<Recorder>) -> Transport {
    transport_with(server.config(), recorder)
}

pub fn transport_with(config: ClientConfig, recorder: &Arc<Recorder>) -> Transport {
    Transport::builder(config)
        .notifier(recorder.clone())
        .navigator(recorder.clone())
        .build()
        .unwrap()
}

pub fn api(server: &FakeServer, recorder: &Arc<Recorder>) -> ReviewApi {
    ReviewApi::new(transport(server, recorder))
}
