//! Request bodies and (de)serialization helpers.

use bytes::Bytes;

use crate::Result;

/// Declared content type of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded,
    /// `text/plain`
    PlainText,
    /// `application/octet-stream`
    OctetStream,
}

impl ContentType {
    /// MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }

    /// Recognizes a `Content-Type` header value, ignoring parameters such as
    /// `charset`. Structured syntax suffixes (`application/problem+json`) count
    /// as JSON.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        let essence = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/json" => Some(Self::Json),
            "application/x-www-form-urlencoded" => Some(Self::FormUrlEncoded),
            "text/plain" => Some(Self::PlainText),
            "application/octet-stream" => Some(Self::OctetStream),
            other if other.starts_with("application/") && other.ends_with("+json") => {
                Some(Self::Json)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of an outgoing request: raw bytes plus an optional declared content
/// type.
///
/// The content type is sent as the `Content-Type` header unless a request
/// option set that header explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    bytes: Bytes,
    content_type: Option<ContentType>,
}

impl Body {
    /// No body.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bytes: Bytes::new(),
            content_type: None,
        }
    }

    /// JSON-encoded body.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_core::{Body, ContentType};
    ///
    /// let body = Body::json(&serde_json::json!({"firstname": "Makis"})).expect("json");
    /// assert_eq!(body.content_type(), Some(ContentType::Json));
    /// assert_eq!(body.as_bytes().as_ref(), br#"{"firstname":"Makis"}"#);
    /// ```
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self {
            bytes: to_json(value)?,
            content_type: Some(ContentType::Json),
        })
    }

    /// Form URL-encoded body.
    pub fn form<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self {
            bytes: to_form(value)?,
            content_type: Some(ContentType::FormUrlEncoded),
        })
    }

    /// Plain text body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            bytes: Bytes::from(text.into()),
            content_type: Some(ContentType::PlainText),
        }
    }

    /// Binary body.
    #[must_use]
    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: Some(ContentType::OctetStream),
        }
    }

    /// Overrides the declared content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Declared content type, if any.
    #[must_use]
    pub const fn content_type(&self) -> Option<ContentType> {
        self.content_type
    }

    /// Body bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consumes into the body bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Whether the body has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            bytes,
            content_type: None,
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::text(text)
    }
}

/// Serializes a value to JSON bytes.
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serializes a value to form URL-encoded bytes.
///
/// Sequences become repeated fields (`tags=a&tags=b`).
pub fn to_form<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Deserializes JSON bytes, reporting the path of the failing field.
///
/// # Example
///
/// ```
/// use courier_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Reading { value: i64 }
///
/// let reading: Reading = from_json(br#"{"value":42}"#).expect("deserialize");
/// assert_eq!(reading, Reading { value: 42 });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_header() {
        assert_eq!(
            ContentType::from_header("application/json; charset=utf-8"),
            Some(ContentType::Json)
        );
        assert_eq!(
            ContentType::from_header("Application/Problem+JSON"),
            Some(ContentType::Json)
        );
        assert_eq!(
            ContentType::from_header("text/plain"),
            Some(ContentType::PlainText)
        );
        assert_eq!(ContentType::from_header("text/html"), None);
    }

    #[test]
    fn json_body_declares_content_type() {
        #[derive(serde::Serialize)]
        struct User {
            firstname: String,
        }

        let body = Body::json(&User {
            firstname: "Makis".to_string(),
        })
        .expect("serialize");

        assert_eq!(body.content_type(), Some(ContentType::Json));
        assert_eq!(body.as_bytes().as_ref(), br#"{"firstname":"Makis"}"#);
    }

    #[test]
    fn form_body_repeats_sequences() {
        #[derive(serde::Serialize)]
        struct Tagged {
            name: String,
            tags: Vec<String>,
        }

        let body = Body::form(&Tagged {
            name: "test".to_string(),
            tags: vec!["rust".to_string(), "http".to_string()],
        })
        .expect("serialize");

        assert_eq!(body.content_type(), Some(ContentType::FormUrlEncoded));
        assert_eq!(body.as_bytes().as_ref(), b"name=test&tags=rust&tags=http");
    }

    #[test]
    fn raw_bytes_have_no_content_type() {
        let body = Body::from(Bytes::from_static(b"raw"));
        assert_eq!(body.content_type(), None);
        assert!(!body.is_empty());
        assert!(Body::empty().is_empty());
    }

    #[test]
    fn from_json_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Current {
            #[allow(dead_code)]
            temp_c: f64,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Forecast {
            #[allow(dead_code)]
            current: Current,
        }

        let err = from_json::<Forecast>(br#"{"current":{"temp_c":"hot"}}"#)
            .expect_err("should fail");
        let msg = err.to_string();

        assert!(msg.contains("current.temp_c"), "missing path in: {msg}");
        assert!(err.is_decode());
    }
}
