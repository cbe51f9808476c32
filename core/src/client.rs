//! Caller-facing operations against the device/cloud API.
//!
//! # Design
//! `RestClient` assembles requests (URL, JSON body, headers) and hands them to
//! a shared `RequestExecutor`. Synchronous calls collapse every negative
//! outcome into `None`; callers that need to tell a terminal failure from
//! exhausted retries use `execute` directly.

use std::sync::Arc;

use tracing::debug;

use crate::document::Document;
use crate::executor::{ExecutionMode, OnDisconnected, Outcome, RequestExecutor};
use crate::http::{HttpMethod, HttpRequest};
use crate::store::FlagStore;
use crate::tls::TlsCapabilityGate;
use crate::transport::TransportClient;

/// Blocking client for the remote API.
pub struct RestClient<T: ?Sized> {
    executor: RequestExecutor<T>,
}

impl<T: TransportClient + ?Sized> RestClient<T> {
    pub fn new(executor: RequestExecutor<T>) -> Self {
        Self { executor }
    }

    /// Client with default retry policy, persisting the TLS flag in `store`.
    pub fn with_store(transport: Arc<T>, store: Arc<dyn FlagStore>) -> Self {
        Self::new(RequestExecutor::new(transport, TlsCapabilityGate::new(store)))
    }

    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    pub fn get(&self, url: &str, headers: &[(&str, &str)]) -> Option<Document> {
        self.call(build_request(HttpMethod::Get, url, None, headers))
    }

    /// GET carrying a JSON body, which some device endpoints expect.
    pub fn get_with_body(
        &self,
        url: &str,
        body: Option<&Document>,
        headers: &[(&str, &str)],
    ) -> Option<Document> {
        self.call(build_request(HttpMethod::Get, url, body, headers))
    }

    pub fn post(
        &self,
        url: &str,
        body: Option<&Document>,
        headers: &[(&str, &str)],
    ) -> Option<Document> {
        self.call(build_request(HttpMethod::Post, url, body, headers))
    }

    /// POST without reading the response. `on_disconnected` fires once if
    /// the device could not be reached within the retry budget.
    pub fn post_fire_and_forget(
        &self,
        url: &str,
        body: Option<&Document>,
        on_disconnected: Option<OnDisconnected>,
        headers: &[(&str, &str)],
    ) {
        let request = build_request(HttpMethod::Post, url, body, headers);
        debug!(curl = %request.to_curl(), "fire-and-forget");
        let on_disconnected = on_disconnected.unwrap_or_else(OnDisconnected::noop);
        self.executor
            .execute(&request, ExecutionMode::FireAndForget, Some(on_disconnected));
    }

    pub fn execute(
        &self,
        request: &HttpRequest,
        mode: ExecutionMode,
        on_disconnected: Option<OnDisconnected>,
    ) -> Outcome {
        self.executor.execute(request, mode, on_disconnected)
    }

    fn call(&self, request: HttpRequest) -> Option<Document> {
        let curl = request.to_curl();
        debug!(curl = %curl, "request");
        let result = self
            .executor
            .execute(&request, ExecutionMode::Synchronous, None)
            .into_document();
        debug!(curl = %curl, result = ?result, "result");
        result
    }
}

impl<T: ?Sized> Clone for RestClient<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
        }
    }
}

fn build_request(
    method: HttpMethod,
    url: &str,
    body: Option<&Document>,
    headers: &[(&str, &str)],
) -> HttpRequest {
    let mut request = HttpRequest::new(method, url);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    if let Some(body) = body {
        let json = serde_json::Value::Object(body.as_map().clone()).to_string();
        request = request.header("Content-Type", "application/json").body(json);
    }
    request
}
