//! Retry-aware HTTP request execution for a device/cloud API client.
//!
//! # Overview
//! Callers hand a prepared `HttpRequest` to a `RequestExecutor`, which
//! normalizes its URL, dispatches it through a shared `TransportClient` in a
//! bounded retry loop and decodes the body into a JSON `Document`.
//!
//! # Design
//! - Transport failures are classified by `FailureKind`; only connect
//!   failures and connect timeouts are retried (3 attempts, 100ms apart).
//! - A certificate failure permanently downgrades requests from `https` to
//!   `http` through the persisted `TlsCapabilityGate`.
//! - Fire-and-forget calls never read the body and report exhausted retries
//!   through a single-shot `OnDisconnected`.
//! - `execute` blocks the calling thread and spawns nothing.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod executor;
pub mod http;
pub mod rewrite;
pub mod store;
pub mod tls;
pub mod transport;

pub use client::RestClient;
pub use config::{ExecutorConfig, TransportConfig};
pub use document::{decode, Document};
pub use error::{DecodeError, Failure, FailureKind, StoreError, TransportError};
pub use executor::{
    ExecutionMode, Interrupted, OnDisconnected, Outcome, Pause, RequestExecutor, ThreadPause,
};
pub use http::{Entity, HttpMethod, HttpRequest, HttpResponse};
pub use store::{FileFlagStore, FlagStore, MemoryFlagStore};
pub use tls::{TlsCapabilityGate, HTTPS_SUPPORT_KEY, SYSTEM_CONFIG_NAMESPACE};
pub use transport::{TransportClient, UreqTransport};
