//! URL normalization applied to every request before dispatch.

use crate::http::HttpRequest;
use crate::tls::TlsCapabilityGate;

/// Percent-escape literal `+`, which some transports read as a space.
pub fn escape_plus(url: &str) -> String {
    url.replace('+', "%2B")
}

/// Replace every occurrence of the `https` token with `http`.
pub fn downgrade_scheme(url: &str) -> String {
    url.replace("https", "http")
}

/// Build the request that is actually dispatched.
pub fn prepare(request: &HttpRequest, gate: &TlsCapabilityGate) -> HttpRequest {
    let mut url = escape_plus(&request.url);
    if !gate.is_enabled() {
        url = downgrade_scheme(&url);
    }
    HttpRequest {
        url,
        ..request.clone()
    }
}
