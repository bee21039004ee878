//! Request body re-serialization.
//!
//! # Responsibilities
//! - Represent the inbound body as a parsed, content-type-tagged value
//! - Re-serialize JSON and urlencoded-form bodies into wire format
//! - Leave every other content type untouched (explicit pass-through)
//!
//! # Design Decisions
//! - Form pairs keep insertion order, so re-serialization is order-preserving
//! - An empty JSON object or empty form counts as an empty body; the
//!   forwarding path treats it as pass-through
//! - Unrecognized content types carry the original bytes so the upstream
//!   receives them unmodified

use axum::body::Bytes;
use serde_json::Value;

use crate::proxy::ForwardError;

/// Parsed view of an inbound request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParsedBody {
    /// No body, or a body with no fields.
    #[default]
    Empty,

    /// `application/json` body.
    Json(Value),

    /// `application/x-www-form-urlencoded` body, in insertion order.
    Form(Vec<(String, String)>),

    /// Any other content type; forwarded untouched.
    Raw(Bytes),
}

impl ParsedBody {
    /// True when there is nothing to rewrite.
    ///
    /// A JSON object or form with no fields is empty, matching the
    /// pass-through rule for field-less bodies.
    pub fn is_empty(&self) -> bool {
        match self {
            ParsedBody::Empty => true,
            ParsedBody::Json(Value::Object(map)) => map.is_empty(),
            ParsedBody::Json(_) => false,
            ParsedBody::Form(pairs) => pairs.is_empty(),
            ParsedBody::Raw(bytes) => bytes.is_empty(),
        }
    }
}

/// Re-serialize a parsed body into its outbound wire format.
///
/// Returns `None` for bodies that are forwarded untouched (empty bodies and
/// unrecognized content types).
pub fn serialize_body(body: &ParsedBody) -> Result<Option<String>, ForwardError> {
    match body {
        ParsedBody::Json(value) => Ok(Some(serde_json::to_string(value)?)),
        ParsedBody::Form(pairs) => {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (name, value) in pairs {
                serializer.append_pair(name, value);
            }
            Ok(Some(serializer.finish()))
        }
        ParsedBody::Empty | ParsedBody::Raw(_) => Ok(None),
    }
}
