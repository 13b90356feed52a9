//! Typed API surface over the dispatch layer.
//!
//! - POST /login   `{username, password}` → caller-chosen payload (a token string today)
//! - POST /repos   `{}` → caller-chosen payload (a list of [`Repository`](crate::models::Repository))
//! - POST /commits `{id, pager}` → [`CommitsResult`]
//! - POST /revert  `{id, hash, file}` → untyped payload
//!
//! Errors are exactly those of [`Transport::dispatch`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::dispatch::{Body, Call};
use crate::error::Result;
use crate::models::{CommitsQuery, CommitsResult, Credentials, RevertRequest};
use crate::transport::Transport;

#[derive(Clone)]
pub struct ReviewApi {
    transport: Transport,
}

impl ReviewApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// API over a transport with the default notifier and navigator.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(Transport::builder(config).build()?))
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub async fn login<T: DeserializeOwned>(&self, credentials: &Credentials) -> Result<T> {
        let call = Call::post("/login").body(Body::from_value(credentials)?);
        self.transport.post(call).await
    }

    pub async fn list_repositories<T: DeserializeOwned>(&self) -> Result<T> {
        self.transport.post(Call::post("/repos")).await
    }

    pub async fn list_commits(&self, query: &CommitsQuery) -> Result<CommitsResult> {
        self.transport.post(commits_call(query)?).await
    }

    /// Like [`list_commits`](Self::list_commits), but abandoned when `cancel`
    /// fires, e.g. because a newer page was requested.
    pub async fn list_commits_cancellable(
        &self,
        query: &CommitsQuery,
        cancel: CancellationToken,
    ) -> Result<CommitsResult> {
        self.transport.post(commits_call(query)?.cancel_token(cancel)).await
    }

    /// The success payload of `/revert` has no fixed shape, so it is
    /// returned as raw JSON.
    pub async fn revert(&self, request: &RevertRequest) -> Result<Value> {
        let call = Call::post("/revert").body(Body::from_value(request)?);
        self.transport.post(call).await
    }
}

fn commits_call(query: &CommitsQuery) -> Result<Call> {
    Ok(Call::post("/commits").body(Body::from_value(query)?))
}
