//! Buffered HTTP response.
//!
//! [`Response`] gives access to the status line, headers, and the fully read
//! body, plus decoding helpers driven by the declared content type.

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};

use crate::{ContentType, Error, Result};

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response {
    version: Version,
    status: u16,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Creates a new HTTP/1.1 response.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            version: Version::HTTP_11,
            status,
            headers,
            body,
        }
    }

    /// Sets the protocol version the response was received with.
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Protocol version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Single header value by name; `None` when absent or not visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The declared `Content-Type`, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Turns a 4xx/5xx response into [`Error::Http`] carrying the body.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status < 400 {
            return Ok(self);
        }
        let message = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unknown status");
        Err(Error::http_with_body(self.status, message, self.body))
    }

    /// Decodes the body according to its declared content type.
    ///
    /// An empty body yields `Ok(None)`. JSON is decoded when declared or when
    /// no content type is present; any other declared type is rejected with
    /// [`Error::UnsupportedContentType`].
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>> {
        if self.body.is_empty() {
            return Ok(None);
        }
        match self.content_type() {
            None => crate::from_json(&self.body).map(Some),
            Some(declared) => match ContentType::from_header(declared) {
                Some(ContentType::Json) => crate::from_json(&self.body).map(Some),
                _ => Err(Error::UnsupportedContentType(declared.to_string())),
            },
        }
    }

    /// Deserialize the body as JSON regardless of the declared content type.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        crate::from_json(&self.body)
    }

    /// Body as UTF-8 text.
    pub fn text(self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(Into::into)
    }
}

impl From<http::Response<Bytes>> for Response {
    fn from(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            version: parts.version,
            status: parts.status.as_u16(),
            headers: parts.headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Reading {
        value: i64,
    }

    fn json_response(status: u16, body: &'static str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        Response::new(status, headers, Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn decode_json() {
        let response = json_response(200, r#"{"value":42}"#);
        assert_eq!(
            response.decode::<Reading>().expect("decode"),
            Some(Reading { value: 42 })
        );
    }

    #[test]
    fn decode_without_content_type_assumes_json() {
        let response = Response::new(200, HeaderMap::new(), Bytes::from_static(br#"{"value":7}"#));
        assert_eq!(
            response.decode::<Reading>().expect("decode"),
            Some(Reading { value: 7 })
        );
    }

    #[test]
    fn decode_empty_body_is_none() {
        let response = json_response(204, "");
        assert_eq!(response.decode::<Reading>().expect("decode"), None);
    }

    #[test]
    fn decode_rejects_other_content_types() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        let response = Response::new(200, headers, Bytes::from_static(b"<html></html>"));

        let err = response.decode::<Reading>().expect_err("unsupported");
        assert!(matches!(err, Error::UnsupportedContentType(ref t) if t == "text/html"));
        assert!(err.is_decode());
    }

    #[test]
    fn error_for_status_keeps_body() {
        let err = json_response(404, r#"{"error":"missing"}"#)
            .error_for_status()
            .expect_err("404");

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert_eq!(
            err.body().map(|b| b.to_vec()),
            Some(br#"{"error":"missing"}"#.to_vec())
        );
    }

    #[test]
    fn from_http_response() {
        let response = http::Response::builder()
            .status(201)
            .version(Version::HTTP_2)
            .header("x-request-id", "abc123")
            .body(Bytes::from_static(b"created"))
            .expect("response");

        let response = Response::from(response);
        assert_eq!(response.status(), 201);
        assert_eq!(response.version(), Version::HTTP_2);
        assert_eq!(response.header("X-Request-Id"), Some("abc123"));
        assert_eq!(response.text().expect("utf8"), "created");
    }
}
