//! The network boundary of the executor.
//!
//! # Design
//! `TransportClient` is the only thing the executor knows about the network.
//! It is shared by every caller, so implementations must be `Send + Sync`;
//! their internal thread-safety is their own business. Failures come back
//! classified as a `FailureKind` so that retry decisions are a plain `match`.

use std::io;

use tracing::trace;

use crate::config::TransportConfig;
use crate::error::{FailureKind, TransportError};
use crate::executor::ExecutionMode;
use crate::http::{Entity, HttpMethod, HttpRequest, HttpResponse};

/// Executes prepared requests.
pub trait TransportClient: Send + Sync {
    fn execute(
        &self,
        request: &HttpRequest,
        mode: ExecutionMode,
    ) -> Result<HttpResponse, TransportError>;

    /// Abort and release whatever the transport holds for `request`.
    /// Called exactly once per executed call, after the last attempt.
    fn release(&self, request: &HttpRequest) {
        let _ = request;
    }
}

/// `TransportClient` over a shared `ureq::Agent`.
///
/// Status codes are returned as data; only failures to complete the
/// exchange become `TransportError`s.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(config.connect_timeout()))
            .timeout_global(Some(config.timeout()))
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl TransportClient for UreqTransport {
    fn execute(
        &self,
        request: &HttpRequest,
        mode: ExecutionMode,
    ) -> Result<HttpResponse, TransportError> {
        trace!(url = %request.url, ?mode, "dispatching");
        let url = request.url.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, None) => self.headers(self.agent.get(url), request).call(),
            (HttpMethod::Get, Some(body)) => self
                .headers(self.agent.get(url).force_send_body(), request)
                .send(body.as_bytes()),
            (HttpMethod::Post, Some(body)) => {
                self.headers(self.agent.post(url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => self.headers(self.agent.post(url), request).send_empty(),
        };
        let response = result.map_err(|e| TransportError::new(classify(&e), e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let entity = if matches!(status, 204 | 304) {
            None
        } else {
            let content_length = response.body().content_length();
            let reader = response.into_body().into_reader();
            Some(Entity::new(content_length, Box::new(reader)))
        };

        Ok(HttpResponse {
            status,
            headers,
            entity,
        })
    }

    fn release(&self, request: &HttpRequest) {
        trace!(url = %request.url, "released");
    }
}

impl UreqTransport {
    fn headers<B>(
        &self,
        mut builder: ureq::RequestBuilder<B>,
        request: &HttpRequest,
    ) -> ureq::RequestBuilder<B> {
        builder = builder.header("User-Agent", self.user_agent.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}

/// Map a ureq failure onto the executor's failure taxonomy.
pub fn classify(err: &ureq::Error) -> FailureKind {
    match err {
        ureq::Error::Timeout(ureq::Timeout::Connect) => FailureKind::ConnectTimeout,
        ureq::Error::ConnectionFailed => FailureKind::Connect,
        ureq::Error::Io(e) => classify_io(e),
        ureq::Error::Tls(_) | ureq::Error::Rustls(_) => FailureKind::Certificate,
        ureq::Error::Protocol(_)
        | ureq::Error::Http(_)
        | ureq::Error::BadUri(_)
        | ureq::Error::TooManyRedirects
        | ureq::Error::RedirectFailed => FailureKind::Protocol,
        _ => FailureKind::Io,
    }
}

// rustls handshake failures can surface wrapped in an io::Error.
fn classify_io(e: &io::Error) -> FailureKind {
    match e.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::HostUnreachable => FailureKind::Connect,
        io::ErrorKind::InvalidData if e.to_string().contains("certificate") => {
            FailureKind::Certificate
        }
        _ => FailureKind::Io,
    }
}
