//! Inbound request parsing.
//!
//! # Responsibilities
//! - Buffer the inbound body under the configured size cap
//! - Parse the body per the declared content type into a [`ParsedBody`]
//! - Preserve the original bytes for the pass-through path
//!
//! # Design Decisions
//! - A declared JSON body that fails to parse is rejected with 400 rather
//!   than forwarded corrupted
//! - Only a body over the size cap maps to 413; other read failures (an
//!   aborted upload, a broken connection) map to 400
//! - Zero-length bodies are empty regardless of declared content type
//! - Content type matching ignores parameters (`; charset=...`)

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::proxy::rewrite::ParsedBody;

/// One inbound request, as delivered to the forwarding engine.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub client_addr: Option<SocketAddr>,
    /// Parsed view of the body.
    pub body: ParsedBody,
    /// Original body bytes; forwarded untouched unless a hook rewrites them.
    pub payload: Bytes,
}

/// Error type for inbound request parsing.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request body exceeds the configured size limit: {0}")]
    TooLarge(axum::Error),

    #[error("request body could not be read: {0}")]
    Read(axum::Error),

    #[error("request body is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Rejecting inbound request");
        match self {
            RequestError::TooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
            }
            RequestError::Read(_) => {
                (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
            }
            RequestError::InvalidJson(_) => {
                (StatusCode::BAD_REQUEST, "Malformed request body").into_response()
            }
        }
    }
}

/// True when the read failure was the size cap, not a transport problem.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Buffer and parse one inbound request.
pub async fn parse_inbound(
    request: Request<Body>,
    client_addr: Option<SocketAddr>,
    max_body_size: usize,
) -> Result<InboundRequest, RequestError> {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let payload = axum::body::to_bytes(body, max_body_size)
        .await
        .map_err(|err| {
            if is_length_limit(&err) {
                RequestError::TooLarge(err)
            } else {
                RequestError::Read(err)
            }
        })?;

    let body = parse_body(&parts.headers, &payload)?;

    Ok(InboundRequest {
        method: parts.method,
        path_and_query,
        headers: parts.headers,
        client_addr,
        body,
        payload,
    })
}

fn parse_body(headers: &HeaderMap, payload: &Bytes) -> Result<ParsedBody, RequestError> {
    if payload.is_empty() {
        return Ok(ParsedBody::Empty);
    }

    match media_type(headers).as_deref() {
        Some("application/json") => {
            let value = serde_json::from_slice(payload).map_err(RequestError::InvalidJson)?;
            Ok(ParsedBody::Json(value))
        }
        Some("application/x-www-form-urlencoded") => {
            let pairs = url::form_urlencoded::parse(payload).into_owned().collect();
            Ok(ParsedBody::Form(pairs))
        }
        _ => Ok(ParsedBody::Raw(payload.clone())),
    }
}

/// The declared media type, lowercased and stripped of parameters.
fn media_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or(value)
                .trim()
                .to_ascii_lowercase()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(content_type: Option<&str>, body: &'static str) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri("/api/x?v=1");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_is_parsed() {
        let inbound = parse_inbound(request(Some("application/json"), r#"{"a": 1}"#), None, 1024)
            .await
            .unwrap();
        assert_eq!(inbound.body, ParsedBody::Json(json!({"a": 1})));
        assert_eq!(inbound.path_and_query, "/api/x?v=1");
        assert_eq!(inbound.payload.as_ref(), br#"{"a": 1}"#);
    }

    #[tokio::test]
    async fn test_charset_parameter_is_ignored() {
        let inbound = parse_inbound(
            request(Some("application/json; charset=utf-8"), r#"{"a":1}"#),
            None,
            1024,
        )
        .await
        .unwrap();
        assert!(matches!(inbound.body, ParsedBody::Json(_)));
    }

    #[tokio::test]
    async fn test_form_body_preserves_order() {
        let inbound = parse_inbound(
            request(Some("application/x-www-form-urlencoded"), "b=2&a=1"),
            None,
            1024,
        )
        .await
        .unwrap();
        assert_eq!(
            inbound.body,
            ParsedBody::Form(vec![("b".into(), "2".into()), ("a".into(), "1".into())])
        );
    }

    #[tokio::test]
    async fn test_unknown_content_type_is_raw() {
        let inbound = parse_inbound(request(Some("text/plain"), "hello"), None, 1024)
            .await
            .unwrap();
        assert_eq!(inbound.body, ParsedBody::Raw(Bytes::from_static(b"hello")));
    }

    #[tokio::test]
    async fn test_empty_body_with_json_content_type() {
        let inbound = parse_inbound(request(Some("application/json"), ""), None, 1024)
            .await
            .unwrap();
        assert_eq!(inbound.body, ParsedBody::Empty);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let err = parse_inbound(request(Some("application/json"), "{not json"), None, 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let err = parse_inbound(request(Some("text/plain"), "0123456789"), None, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::TooLarge(_)));
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_aborted_body_is_a_read_error_not_too_large() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )),
        ];
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/x")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();

        let err = parse_inbound(request, None, 1024).await.unwrap_err();
        assert!(matches!(err, RequestError::Read(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
