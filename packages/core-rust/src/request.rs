//! Request adaptation layer.
//!
//! The activity pipeline consumes requests through the narrow [`RequestLike`]
//! trait rather than any particular framework's request type. The concrete
//! [`AdaptedRequest`] is built once per request by the transport, from
//! headers and an already-read body buffer; the transport stream is never
//! re-read.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use thiserror::Error;
use serde_json::Value;

use crate::claims::ClaimsIdentity;

/// Failure to interpret the request body.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body is not valid UTF-8 text.
    #[error("body is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    /// The body is not valid JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// The narrow request surface the activity pipeline consumes.
///
/// All body accessors derive from one buffered read, so they are idempotent
/// and can be called in any order or combination.
pub trait RequestLike {
    /// The HTTP method.
    fn method(&self) -> &Method;

    /// Case-insensitive header lookup. Any casing of `name` resolves to the
    /// same value.
    fn header(&self, name: &str) -> Option<&str>;

    /// The raw body bytes.
    fn body(&self) -> &Bytes;

    /// The body decoded as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::Utf8`] when the body is not valid UTF-8.
    fn text(&self) -> Result<&str, BodyError>;

    /// The body decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::Json`] when the body is not valid JSON. The
    /// failure propagates to the caller; it is never swallowed.
    fn json(&self) -> Result<Value, BodyError>;
}

/// A framework-neutral view of one inbound request.
///
/// Carries the resolved [`ClaimsIdentity`] from the auth gate and a
/// key/value bag for handles injected by the transport (agent configuration
/// and the like). Created per request, discarded after the response; never
/// shared across requests.
#[derive(Debug)]
pub struct AdaptedRequest {
    method: Method,
    headers: HeaderMap,
    body: Bytes,
    identity: Option<ClaimsIdentity>,
    bag: HashMap<String, Value>,
}

impl AdaptedRequest {
    /// Wraps an already-read request.
    ///
    /// If no `Content-Type` header is present in any casing it is defaulted
    /// to `application/json`, matching what the activity pipeline expects
    /// from channel traffic.
    #[must_use]
    pub fn new(method: Method, mut headers: HeaderMap, body: Bytes) -> Self {
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));

        Self {
            method,
            headers,
            body,
            identity: None,
            bag: HashMap::new(),
        }
    }

    /// Attaches the identity resolved by the auth gate.
    pub fn set_identity(&mut self, identity: ClaimsIdentity) {
        self.identity = Some(identity);
    }

    /// The identity resolved by the auth gate, if one was attached.
    #[must_use]
    pub fn identity(&self) -> Option<&ClaimsIdentity> {
        self.identity.as_ref()
    }

    /// Stores an injected handle or configuration value in the data bag.
    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) {
        self.bag.insert(key.into(), value);
    }

    /// Reads a value from the data bag.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.bag.get(key)
    }
}

impl RequestLike for AdaptedRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn body(&self) -> &Bytes {
        &self.body
    }

    fn text(&self) -> Result<&str, BodyError> {
        Ok(std::str::from_utf8(&self.body)?)
    }

    fn json(&self) -> Result<Value, BodyError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderName;
    use proptest::prelude::*;
    use serde_json::json;

    fn request_with_header(name: &str, value: &str) -> AdaptedRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            name.parse::<HeaderName>().unwrap(),
            value.parse::<HeaderValue>().unwrap(),
        );
        AdaptedRequest::new(Method::POST, headers, Bytes::new())
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = request_with_header("content-type", "text/plain");

        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert_eq!(request.header("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn missing_content_type_defaults_to_json() {
        let request = AdaptedRequest::new(Method::POST, HeaderMap::new(), Bytes::new());
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn present_content_type_is_not_overridden() {
        let request = request_with_header("Content-Type", "application/xml");
        assert_eq!(request.header("content-type"), Some("application/xml"));
    }

    #[test]
    fn body_text_and_json_agree_on_one_buffer() {
        let payload = json!({"type": "message", "text": "hello"});
        let raw = Bytes::from(payload.to_string());
        let request = AdaptedRequest::new(Method::POST, HeaderMap::new(), raw.clone());

        assert_eq!(request.body(), &raw);
        assert_eq!(
            serde_json::from_str::<Value>(request.text().unwrap()).unwrap(),
            payload
        );
        assert_eq!(request.json().unwrap(), payload);
        // Idempotent: a second read decodes to the same structure.
        assert_eq!(request.json().unwrap(), payload);
    }

    #[test]
    fn invalid_json_propagates_as_error() {
        let request = AdaptedRequest::new(
            Method::POST,
            HeaderMap::new(),
            Bytes::from_static(b"{not json"),
        );
        assert!(matches!(request.json(), Err(BodyError::Json(_))));
    }

    #[test]
    fn invalid_utf8_propagates_as_error() {
        let request = AdaptedRequest::new(
            Method::POST,
            HeaderMap::new(),
            Bytes::from_static(&[0xff, 0xfe]),
        );
        assert!(matches!(request.text(), Err(BodyError::Utf8(_))));
    }

    #[test]
    fn identity_slot_holds_exactly_one_identity() {
        let mut request = AdaptedRequest::new(Method::POST, HeaderMap::new(), Bytes::new());
        assert!(request.identity().is_none());

        request.set_identity(ClaimsIdentity::anonymous());
        assert!(!request.identity().unwrap().is_authenticated());
    }

    #[test]
    fn data_bag_round_trips_values() {
        let mut request = AdaptedRequest::new(Method::POST, HeaderMap::new(), Bytes::new());
        request.insert_value("agent_configuration", json!({"graph": "GRAPH"}));

        assert_eq!(
            request.value("agent_configuration"),
            Some(&json!({"graph": "GRAPH"}))
        );
        assert_eq!(request.value("missing"), None);
    }

    proptest! {
        /// Any ASCII casing of a header name resolves to the same value.
        #[test]
        fn header_lookup_ignores_ascii_case(mask in any::<u32>()) {
            let request = request_with_header("x-custom-header", "abc123");

            let cased: String = "x-custom-header"
                .chars()
                .enumerate()
                .map(|(i, c)| {
                    if mask >> (i % 32) & 1 == 1 {
                        c.to_ascii_uppercase()
                    } else {
                        c
                    }
                })
                .collect();

            prop_assert_eq!(request.header(&cased), Some("abc123"));
        }
    }
}
