//! Wire-format dumps of requests and responses.
//!
//! Output mirrors what goes over an HTTP/1.1 connection: a start line, one
//! header per line, a blank line, then the body as lossy UTF-8. Lines are
//! separated by `\r\n`.

use std::fmt::Write;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HOST};

use crate::Response;

/// Renders an outgoing request.
///
/// A `host` line is derived from the URI when no `Host` header is set, and a
/// `content-length` line when the body is non-empty and none is set.
#[must_use]
pub fn request(request: &http::Request<Bytes>) -> String {
    let uri = request.uri();
    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());

    let mut out = String::new();
    let _ = write!(out, "{} {target} {:?}\r\n", request.method(), request.version());

    let headers = request.headers();
    if let Some(authority) = uri.authority().filter(|_| !headers.contains_key(HOST)) {
        let _ = write!(out, "host: {authority}\r\n");
    }
    for (name, value) in headers {
        let _ = write!(out, "{name}: {}\r\n", String::from_utf8_lossy(value.as_bytes()));
    }
    let body = request.body();
    if !body.is_empty() && !headers.contains_key(CONTENT_LENGTH) {
        let _ = write!(out, "{CONTENT_LENGTH}: {}\r\n", body.len());
    }

    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));
    out
}

/// Renders a received response with headers sorted by name.
#[must_use]
pub fn response(response: &Response) -> String {
    let reason = http::StatusCode::from_u16(response.status())
        .ok()
        .and_then(|status| status.canonical_reason());

    let mut out = String::new();
    let _ = write!(out, "{:?} {}", response.version(), response.status());
    if let Some(reason) = reason {
        let _ = write!(out, " {reason}");
    }
    out.push_str("\r\n");

    let mut headers: Vec<_> = response.headers().iter().collect();
    headers.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
    for (name, value) in headers {
        let _ = write!(out, "{name}: {}\r\n", String::from_utf8_lossy(value.as_bytes()));
    }

    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(response.body()));
    out
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue, Version};

    use super::*;

    #[test]
    fn request_dump_layout() {
        let request = http::Request::builder()
            .method("POST")
            .uri("http://127.0.0.1:8080/v1/current.json?key=abc&q=Athens")
            .header("content-type", "application/json")
            .header("x-trace", "1")
            .body(Bytes::from_static(br#"{"a":1}"#))
            .expect("request");

        assert_eq!(
            request_dump(&request),
            "POST /v1/current.json?key=abc&q=Athens HTTP/1.1\r\n\
             host: 127.0.0.1:8080\r\n\
             content-type: application/json\r\n\
             x-trace: 1\r\n\
             content-length: 7\r\n\
             \r\n\
             {\"a\":1}"
        );
    }

    #[test]
    fn request_dump_without_body() {
        let request = http::Request::builder()
            .uri("https://example.com")
            .body(Bytes::new())
            .expect("request");

        assert_eq!(
            request_dump(&request),
            "GET / HTTP/1.1\r\nhost: example.com\r\n\r\n"
        );
    }

    #[test]
    fn response_dump_sorts_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("42"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("content-length", HeaderValue::from_static("12"));
        let response = Response::new(200, headers, Bytes::from_static(br#"{"value":42}"#));

        assert_eq!(
            response_dump(&response),
            "HTTP/1.1 200 OK\r\n\
             content-length: 12\r\n\
             content-type: application/json\r\n\
             x-request-id: 42\r\n\
             \r\n\
             {\"value\":42}"
        );
    }

    #[test]
    fn response_dump_keeps_version_and_unknown_status() {
        let response = Response::new(599, HeaderMap::new(), Bytes::new()).with_version(Version::HTTP_2);
        assert_eq!(response_dump(&response), "HTTP/2.0 599\r\n\r\n");
    }

    fn request_dump(request: &http::Request<Bytes>) -> String {
        super::request(request)
    }

    fn response_dump(response: &Response) -> String {
        super::response(response)
    }
}
