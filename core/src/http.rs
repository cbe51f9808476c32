//! HTTP request and response types exchanged with a `TransportClient`.
//!
//! # Design
//! Requests are plain data: the executor never mutates one after it has been
//! handed over, it derives a normalized copy before dispatch. Responses keep
//! their entity as an unread stream so that fire-and-forget calls can drop it
//! without ever touching the body.

use std::fmt;
use std::io::{Cursor, Read};

use crate::error::{FailureKind, TransportError};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A prepared HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Render the request as an equivalent curl command line, for logs.
    pub fn to_curl(&self) -> String {
        let mut cmd = format!("curl -X {}", self.method.as_str());
        for (name, value) in &self.headers {
            cmd.push_str(&format!(" -H \"{name}: {value}\""));
        }
        if let Some(body) = &self.body {
            cmd.push_str(&format!(" -d '{body}'"));
        }
        cmd.push_str(&format!(" \"{}\"", self.url));
        cmd
    }
}

/// The body of a response, not yet read.
pub struct Entity {
    content_length: Option<u64>,
    reader: Box<dyn Read>,
}

impl Entity {
    pub fn new(content_length: Option<u64>, reader: Box<dyn Read>) -> Self {
        Self {
            content_length,
            reader,
        }
    }

    /// An in-memory entity with an exact content length.
    pub fn from_string(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(Some(body.len() as u64), Box::new(Cursor::new(body.into_bytes())))
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Read the whole body as UTF-8. A failing read is an I/O failure.
    pub fn read_to_string(mut self) -> Result<String, TransportError> {
        let mut body = String::new();
        self.reader
            .read_to_string(&mut body)
            .map_err(|e| TransportError::new(FailureKind::Io, format!("reading entity: {e}")))?;
        Ok(body)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// A response returned by a `TransportClient`.
///
/// `entity` is `None` when the server sent no body at all (e.g. 204), which
/// is distinct from an empty body.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub entity: Option<Entity>,
}

impl HttpResponse {
    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
