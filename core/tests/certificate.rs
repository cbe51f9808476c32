//! Certificate verification failures against a live TLS listener.
//!
//! # Design
//! Serves a freshly generated self-signed certificate with rustls, so the
//! handshake fails inside `UreqTransport` exactly as it would against a
//! device with an untrusted certificate, and the real error path feeds the
//! downgrade.

use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use device_http::{
    ExecutionMode, ExecutorConfig, Failure, FailureKind, HttpMethod, HttpRequest,
    MemoryFlagStore, Outcome, RequestExecutor, RestClient, TlsCapabilityGate, TransportConfig,
    TransportError, UreqTransport,
};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};

/// Start a TLS listener presenting a self-signed certificate.
fn start_self_signed_server() -> SocketAddr {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(vec![cert.der().clone()], key)
    .unwrap();
    let config = Arc::new(config);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut tcp) = stream else { continue };
            let Ok(mut conn) = rustls::ServerConnection::new(Arc::clone(&config)) else {
                continue;
            };
            // The client aborts the handshake; the read only drives it.
            let mut tls = rustls::Stream::new(&mut conn, &mut tcp);
            let mut buf = [0u8; 1024];
            let _ = tls.read(&mut buf);
        }
    });

    addr
}

fn client(gate: TlsCapabilityGate) -> RestClient<UreqTransport> {
    let transport = Arc::new(UreqTransport::new(&TransportConfig {
        connect_timeout_ms: 1_000,
        timeout_ms: 5_000,
        ..TransportConfig::default()
    }));
    let config = ExecutorConfig {
        max_attempts: 3,
        retry_delay_ms: 10,
    };
    RestClient::new(RequestExecutor::new(transport, gate).with_config(config))
}

#[test]
fn untrusted_certificate_disables_tls() {
    let addr = start_self_signed_server();
    let gate = TlsCapabilityGate::new(Arc::new(MemoryFlagStore::new()));
    let client = client(gate.clone());
    let request = HttpRequest::new(HttpMethod::Get, format!("https://{addr}/v1/device/status"));

    let outcome = client.execute(&request, ExecutionMode::Synchronous, None);

    assert!(
        matches!(
            outcome,
            Outcome::Failure(Failure::Transport(TransportError {
                kind: FailureKind::Certificate,
                ..
            }))
        ),
        "unexpected outcome {outcome:?}"
    );
    assert!(!gate.is_enabled());
}

#[test]
fn untrusted_certificate_is_not_retried_in_fire_and_forget() {
    let addr = start_self_signed_server();
    let gate = TlsCapabilityGate::new(Arc::new(MemoryFlagStore::new()));
    let client = client(gate.clone());
    let request = HttpRequest::new(HttpMethod::Post, format!("https://{addr}/v1/device/actions"))
        .header("Content-Type", "application/json")
        .body("{}");

    let outcome = client.execute(&request, ExecutionMode::FireAndForget, None);

    assert!(outcome.is_failure(), "unexpected outcome {outcome:?}");
    assert!(!gate.is_enabled());
}
