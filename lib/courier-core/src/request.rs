//! Outgoing request description.
//!
//! A [`Request`] is what [`RequestOption`](crate::RequestOption)s mutate before
//! a call is sent. The URL is kept apart from its query so options can set or
//! override individual parameters; both are joined again by
//! [`Request::full_url`].
//!
//! The URL text is sent exactly as given. The query is re-encoded (keys
//! sorted) only once something goes through [`Request::query_mut`].
//!
//! # Example
//!
//! ```
//! use courier_core::{Body, Method, Request};
//!
//! let mut request = Request::parse(
//!     Method::Get,
//!     "https://api.weatherapi.com/v1/current.json?aqi=no",
//!     Body::empty(),
//! )
//! .expect("valid URL");
//! request.query_mut().set("q", "Athens");
//! request.set_header("Accept", "application/json");
//!
//! assert_eq!(
//!     request.full_url().as_str(),
//!     "https://api.weatherapi.com/v1/current.json?aqi=no&q=Athens"
//! );
//! ```

use bytes::Bytes;
use url::Url;

use crate::{Body, Error, Method, QueryValues, Result};

/// An outgoing HTTP request description.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    raw_url: Option<String>,
    raw_query: Option<String>,
    query: QueryValues,
    query_changed: bool,
    headers: Vec<(String, String)>,
    body: Body,
}

impl Request {
    /// Creates a request; any query already present in `url` seeds
    /// [`Request::query`].
    #[must_use]
    pub fn new(method: Method, url: Url, body: Body) -> Self {
        let raw = url.to_string();
        Self::from_raw(method, url, &raw, body)
    }

    /// Parses `url` and creates a request.
    ///
    /// `url` is validated but kept verbatim: dot-segments and query encoding
    /// are left alone.
    pub fn parse(method: Method, url: &str, body: Body) -> Result<Self> {
        Ok(Self::from_raw(method, Url::parse(url)?, url, body))
    }

    fn from_raw(method: Method, mut url: Url, raw: &str, body: Body) -> Self {
        let query = url.query().map(QueryValues::parse).unwrap_or_default();
        let raw_query = url.query().map(str::to_owned);
        url.set_query(None);
        url.set_fragment(None);

        // Text the `http` crate would reject falls back to the parsed form
        let raw = raw.split_once('#').map_or(raw, |(head, _)| head);
        let raw_url = http::Uri::try_from(raw)
            .is_ok()
            .then(|| raw.split_once('?').map_or(raw, |(head, _)| head).to_owned());

        Self {
            method,
            url,
            raw_url,
            raw_query,
            query,
            query_changed: false,
            headers: Vec::new(),
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Replaces the HTTP method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Parsed URL without its query string.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Mutable access to the URL (without its query string).
    ///
    /// The parsed form replaces the verbatim text from then on.
    pub fn url_mut(&mut self) -> &mut Url {
        self.raw_url = None;
        &mut self.url
    }

    /// Query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryValues {
        &self.query
    }

    /// Mutable access to the query parameters.
    ///
    /// The query is re-encoded from these values from then on.
    pub fn query_mut(&mut self) -> &mut QueryValues {
        self.query_changed = true;
        &mut self.query
    }

    /// The URL with its query appended.
    ///
    /// Until [`Request::query_mut`] is used this is the original text.
    #[must_use]
    pub fn full_url(&self) -> String {
        let mut full = self
            .raw_url
            .clone()
            .unwrap_or_else(|| self.url.to_string());

        let query = if self.query_changed {
            (!self.query.is_empty()).then(|| self.query.encode())
        } else {
            self.raw_query.clone()
        };
        if let Some(query) = query {
            full.push('?');
            full.push_str(&query);
        }
        full
    }

    /// Headers in the order they were first set.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing every existing value with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter().position(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(index) => {
                self.headers.retain({
                    let mut seen = 0_usize;
                    move |(n, _)| {
                        if n.eq_ignore_ascii_case(&name) {
                            seen += 1;
                            seen == 1
                        } else {
                            true
                        }
                    }
                });
                if let Some(slot) = self.headers.get_mut(index) {
                    slot.1 = value;
                }
            }
            None => self.headers.push((name, value)),
        }
    }

    /// Appends a header value without touching existing ones.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Removes every value of a header.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Converts into an [`http::Request`] ready to send.
    ///
    /// The body's declared content type becomes the `Content-Type` header
    /// unless one was set explicitly. Invalid header names or values surface
    /// here as [`Error::InvalidRequest`].
    pub fn into_http(self) -> Result<http::Request<Bytes>> {
        let url = self.full_url();
        let mut builder = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(url);

        let explicit_content_type = self
            .headers
            .iter()
            .any(|(n, _)| n.eq_ignore_ascii_case(http::header::CONTENT_TYPE.as_str()));

        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(content_type) = self.body.content_type().filter(|_| !explicit_content_type) {
            builder = builder.header(http::header::CONTENT_TYPE, content_type.as_str());
        }

        builder
            .body(self.body.into_bytes())
            .map_err(|e| Error::invalid_request(e.to_string()))
    }
}
