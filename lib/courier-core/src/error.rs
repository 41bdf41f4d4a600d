//! Error types for courier.

use derive_more::{Display, Error, From};

/// Every failure a call can report.
///
/// Errors are grouped by where in the request pipeline they arise:
///
/// - building the request: [`Error::InvalidUrl`], [`Error::InvalidRequest`],
///   [`Error::JsonSerialization`], [`Error::FormSerialization`]
/// - waiting on the call context: [`Error::Cancelled`],
///   [`Error::DeadlineExceeded`]
/// - lifecycle hooks: [`Error::Hook`]
/// - sending: [`Error::Connection`], [`Error::Tls`], [`Error::Timeout`]
/// - reading the response: [`Error::Http`], [`Error::JsonDeserialization`],
///   [`Error::UnsupportedContentType`], [`Error::Utf8`]
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The server answered with a 4xx or 5xx status.
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Canonical reason or server-provided message.
        message: String,
        /// Response body, if any.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// The client timeout elapsed before the response was read.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The call context was cancelled.
    #[display("call cancelled")]
    #[from(skip)]
    Cancelled,

    /// The call context deadline passed.
    #[display("call deadline exceeded")]
    #[from(skip)]
    DeadlineExceeded,

    /// A lifecycle hook rejected the request or reported a failure while
    /// observing the response.
    #[display("lifecycle hook failed: {_0}")]
    #[from(skip)]
    Hook(#[error(not(source))] String),

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "current.temp_c").
        path: String,
        /// Error message.
        message: String,
    },

    /// The response declared a content type that cannot be decoded.
    #[display("cannot decode response with content type '{_0}'")]
    #[from(skip)]
    UnsupportedContentType(#[error(not(source))] String),

    /// Response text was not valid UTF-8.
    #[display("response body is not valid UTF-8: {_0}")]
    #[from]
    Utf8(std::string::FromUtf8Error),

    /// Form or query serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_html_form::ser::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create a lifecycle hook error.
    #[must_use]
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the client timeout elapsed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the call context was cancelled or its deadline passed.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns `true` if a lifecycle hook failed.
    #[must_use]
    pub const fn is_hook(&self) -> bool {
        matches!(self, Self::Hook(_))
    }

    /// Returns `true` if the response body could not be decoded.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::JsonDeserialization { .. } | Self::UnsupportedContentType(_) | Self::Utf8(_)
        )
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not an HTTP error.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Debug, Deserialize)]
    /// struct ApiError {
    ///     code: u32,
    ///     message: String,
    /// }
    ///
    /// if let Err(err) = client.read_json::<Forecast>(&cx, Method::Get, "/current.json", Body::empty(), &[]).await {
    ///     if let Some(Ok(api)) = err.decode_body::<ApiError>() {
    ///         eprintln!("{}: {}", api.code, api.message);
    ///     }
    /// }
    /// ```
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn error_display() {
        check!(Error::http(404, "Not Found").to_string() == "HTTP error 404: Not Found");
        check!(Error::Timeout.to_string() == "request timeout");
        check!(Error::Cancelled.to_string() == "call cancelled");
        check!(Error::hook("rejected").to_string() == "lifecycle hook failed: rejected");
        check!(
            Error::json_deserialization("current.temp_c", "invalid type").to_string()
                == "JSON deserialization error at 'current.temp_c': invalid type"
        );
    }

    #[test]
    fn error_kinds_are_distinct() {
        check!(Error::Cancelled.is_cancelled());
        check!(Error::DeadlineExceeded.is_cancelled());
        check!(!Error::Timeout.is_cancelled());
        check!(Error::Timeout.is_timeout());
        check!(Error::connection("refused").is_connection());
        check!(Error::hook("nope").is_hook());
        check!(Error::UnsupportedContentType("text/html".into()).is_decode());
        check!(!Error::connection("refused").is_decode());
    }

    #[test]
    fn error_status() {
        let err = Error::http(404, "Not Found");
        check!(err.status() == Some(404));
        check!(err.is_client_error());
        check!(!err.is_server_error());

        let err = Error::http(503, "Service Unavailable");
        check!(err.is_server_error());

        check!(Error::Timeout.status().is_none());
    }

    #[test]
    fn error_decode_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct ApiError {
            code: u32,
            message: String,
        }

        let body = bytes::Bytes::from(r#"{"code":1006,"message":"No matching location found."}"#);
        let err = Error::http_with_body(400, "Bad Request", body);

        let_assert!(Some(Ok(api)) = err.decode_body::<ApiError>());
        check!(api.code == 1006);
        check!(api.message == "No matching location found.");

        check!(Error::http(400, "Bad Request").decode_body::<ApiError>().is_none());
        check!(Error::Timeout.decode_body::<ApiError>().is_none());
    }
}
