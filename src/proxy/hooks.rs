//! Forwarding lifecycle hooks.
//!
//! The engine invokes `before_forward` after preparing the outbound request
//! and `after_forward` once the upstream response headers have arrived. Both
//! are plain trait methods, so invocation order is explicit and a
//! `before_forward` error fails the request before anything is sent.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};

use crate::proxy::rewrite::{serialize_body, ParsedBody};
use crate::proxy::url::concat_path;
use crate::proxy::ForwardError;

/// The outbound request being prepared for the upstream.
///
/// Lives for one forwarding operation; the payload starts as the original
/// inbound bytes and is only replaced when a hook rewrites it.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: ParsedBody,
    payload: Bytes,
}

impl OutboundRequest {
    pub fn new(
        method: Method,
        path_and_query: String,
        headers: HeaderMap,
        body: ParsedBody,
        payload: Bytes,
    ) -> Self {
        Self {
            method,
            path_and_query,
            headers,
            body,
            payload,
        }
    }

    /// The outbound Host header, or empty if unset.
    pub fn host(&self) -> &str {
        self.headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
    }

    /// Replace the payload with re-serialized text.
    ///
    /// Sets Content-Length to the exact byte length of the text, keeping the
    /// declared length and the bytes written in lockstep.
    pub fn set_payload(&mut self, text: String) {
        let bytes = Bytes::from(text);
        self.headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        self.payload = bytes;
    }

    /// The bytes that will be written upstream.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_parts(self) -> (Method, String, HeaderMap, Bytes) {
        (self.method, self.path_and_query, self.headers, self.payload)
    }
}

/// Correlation data for a completed upstream exchange.
#[derive(Debug)]
pub struct InboundResponse {
    pub method: Method,
    /// Host header of the request actually sent upstream.
    pub host: String,
    /// Path of the original inbound request.
    pub path: String,
    pub status: StatusCode,
}

/// Extension points on the forwarding path.
pub trait ForwardHooks: Send + Sync {
    /// Invoked before the request is sent upstream. May mutate headers and
    /// payload; an error fails the request.
    fn before_forward(&self, request: &mut OutboundRequest) -> Result<(), ForwardError>;

    /// Invoked after the upstream response headers are received.
    fn after_forward(&self, response: &InboundResponse);
}

/// Default hooks: log each phase and re-serialize parsed bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHooks;

impl ForwardHooks for LoggingHooks {
    fn before_forward(&self, request: &mut OutboundRequest) -> Result<(), ForwardError> {
        let url = concat_path(request.host(), &request.path_and_query);
        tracing::info!("Sending {} {}", request.method, url);

        if request.body.is_empty() {
            return Ok(());
        }

        if let Some(text) = serialize_body(&request.body)? {
            request.set_payload(text);
        }
        Ok(())
    }

    fn after_forward(&self, response: &InboundResponse) {
        let url = concat_path(&response.host, &response.path);
        tracing::info!("Received {} {}", response.method, url);
    }
}
