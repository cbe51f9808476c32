//! Retry-aware execution of prepared requests.
//!
//! # Design
//! `RequestExecutor::execute` blocks the calling thread for the whole call,
//! including the delay between attempts, and never spawns threads. Only
//! `Connect` and `ConnectTimeout` failures are retried. A certificate failure
//! downgrades the shared `TlsCapabilityGate` and ends the call. A body that
//! fails to decode is not retried: the same server state would produce it
//! again.
//!
//! The request is released through a drop guard, so the transport sees
//! exactly one `release` per call whichever way the loop exits.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::ExecutorConfig;
use crate::document::{self, Document};
use crate::error::{Failure, FailureKind, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::rewrite;
use crate::tls::TlsCapabilityGate;
use crate::transport::TransportClient;

/// How the caller consumes the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// The caller waits for and receives the decoded body.
    Synchronous,
    /// The body is never read; the caller only learns about disconnects.
    FireAndForget,
}

/// Result of one `execute` call.
#[derive(Debug)]
pub enum Outcome {
    /// Possibly empty, never absent.
    Document(Document),
    /// Terminal failure, not retried.
    Failure(Failure),
    /// Every attempt hit a transient failure, or the retry delay was
    /// interrupted.
    Exhausted,
}

impl Outcome {
    pub fn is_document(&self) -> bool {
        matches!(self, Outcome::Document(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Outcome::Exhausted)
    }

    /// Collapse `Failure` and `Exhausted` into "no result".
    pub fn into_document(self) -> Option<Document> {
        match self {
            Outcome::Document(doc) => Some(doc),
            Outcome::Failure(_) | Outcome::Exhausted => None,
        }
    }
}

/// Single-shot handler run when a fire-and-forget call runs out of retries.
///
/// `fire` consumes the handler, so it can run at most once.
pub struct OnDisconnected(Box<dyn FnOnce() + Send>);

impl OnDisconnected {
    pub fn new(handler: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(handler))
    }

    pub fn noop() -> Self {
        Self::new(|| {})
    }

    pub fn fire(self) {
        (self.0)()
    }
}

impl fmt::Debug for OnDisconnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnDisconnected")
    }
}

/// The retry delay was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Blocks between attempts.
pub trait Pause: Send + Sync {
    fn pause(&self, delay: Duration) -> Result<(), Interrupted>;
}

/// Sleeps on the calling thread. Never interrupted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, delay: Duration) -> Result<(), Interrupted> {
        thread::sleep(delay);
        Ok(())
    }
}

enum Step {
    Done(Outcome),
    Retry(TransportError),
}

struct ReleaseGuard<'a, T: TransportClient + ?Sized> {
    transport: &'a T,
    request: &'a HttpRequest,
}

impl<T: TransportClient + ?Sized> Drop for ReleaseGuard<'_, T> {
    fn drop(&mut self) {
        self.transport.release(self.request);
    }
}

/// Drives a shared `TransportClient` through the bounded retry loop.
pub struct RequestExecutor<T: ?Sized> {
    transport: Arc<T>,
    gate: TlsCapabilityGate,
    config: ExecutorConfig,
    pause: Arc<dyn Pause>,
}

impl<T: TransportClient + ?Sized> RequestExecutor<T> {
    pub fn new(transport: Arc<T>, gate: TlsCapabilityGate) -> Self {
        Self {
            transport,
            gate,
            config: ExecutorConfig::default(),
            pause: Arc::new(ThreadPause),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn gate(&self) -> &TlsCapabilityGate {
        &self.gate
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute `request`, retrying transient connect failures.
    ///
    /// `on_disconnected` is ignored in synchronous mode. In fire-and-forget
    /// mode it fires once if the call ends `Exhausted`.
    pub fn execute(
        &self,
        request: &HttpRequest,
        mode: ExecutionMode,
        on_disconnected: Option<OnDisconnected>,
    ) -> Outcome {
        let span = info_span!("http_request", id = %Uuid::new_v4(), method = request.method.as_str());
        let _enter = span.enter();

        let prepared = rewrite::prepare(request, &self.gate);
        let outcome = {
            let guard = ReleaseGuard {
                transport: &*self.transport,
                request: &prepared,
            };
            self.run(guard.request, mode)
        };

        if outcome.is_exhausted() && mode == ExecutionMode::FireAndForget {
            info!("retries exhausted, signalling disconnect");
            if let Some(handler) = on_disconnected {
                handler.fire();
            }
        }
        outcome
    }

    fn run(&self, request: &HttpRequest, mode: ExecutionMode) -> Outcome {
        let attempts = self.config.attempts();
        for attempt in 0..attempts {
            if attempt > 0 && self.pause.pause(self.config.retry_delay()).is_err() {
                warn!(attempt, "retry delay interrupted, abandoning request");
                return Outcome::Exhausted;
            }
            match self.attempt(request, mode) {
                Step::Done(outcome) => return outcome,
                Step::Retry(err) => {
                    info!(attempt = attempt + 1, attempts, error = %err, "transient failure");
                }
            }
        }
        Outcome::Exhausted
    }

    fn attempt(&self, request: &HttpRequest, mode: ExecutionMode) -> Step {
        match self.transport.execute(request, mode) {
            Ok(response) => self.on_response(response, mode),
            Err(err) => self.on_transport_error(err),
        }
    }

    fn on_response(&self, response: HttpResponse, mode: ExecutionMode) -> Step {
        debug!(
            status = response.status,
            content_type = response.header("content-type"),
            "response received"
        );
        let entity = match (response.entity, mode) {
            (_, ExecutionMode::FireAndForget) => {
                return Step::Done(Outcome::Document(Document::new()));
            }
            (None, ExecutionMode::Synchronous) => {
                warn!("response carried no entity");
                return Step::Done(Outcome::Failure(Failure::MissingEntity));
            }
            (Some(entity), ExecutionMode::Synchronous) => entity,
        };

        let content_length = entity.content_length();
        let body = match entity.read_to_string() {
            Ok(body) => body,
            Err(err) => return self.on_transport_error(err),
        };
        debug!(body = %body, "response body");
        match document::decode(&body, content_length) {
            Ok(doc) => Step::Done(Outcome::Document(doc)),
            Err(err) => {
                warn!(error = %err, "response body did not decode");
                Step::Done(Outcome::Failure(err.into()))
            }
        }
    }

    fn on_transport_error(&self, err: TransportError) -> Step {
        match err.kind {
            kind if kind.is_retryable() => Step::Retry(err),
            FailureKind::Certificate => {
                self.gate.disable();
                Step::Done(Outcome::Failure(err.into()))
            }
            _ => {
                warn!(error = %err, "transport failure");
                Step::Done(Outcome::Failure(err.into()))
            }
        }
    }
}

impl<T: ?Sized> Clone for RequestExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            gate: self.gate.clone(),
            config: self.config.clone(),
            pause: Arc::clone(&self.pause),
        }
    }
}
