//! Per-call request modifiers.
//!
//! A [`RequestOption`] mutates a [`Request`] before it is sent. Clients apply
//! their persistent options first and the call-specific ones afterwards, so a
//! call can override anything a persistent option set.
//!
//! # Example
//!
//! ```
//! use courier_core::{Body, Method, Request, request_option};
//!
//! let persistent = request_option::param("key", ["abc"]);
//! let per_call = request_option::param("key", ["override"]);
//!
//! let mut request = Request::parse(Method::Get, "https://example.com/current.json", Body::empty())
//!     .expect("valid URL");
//! request_option::apply_all(&mut request, [&persistent, &per_call]);
//!
//! assert_eq!(request.query().get("key"), Some("override"));
//! ```

use std::fmt;
use std::sync::Arc;

use base64::Engine;

use crate::{Body, QueryValues, Request, Result};

/// A reusable, shareable request modifier.
#[derive(Clone)]
pub struct RequestOption(Arc<dyn Fn(&mut Request) + Send + Sync>);

impl RequestOption {
    /// Wraps a closure as a request option.
    pub fn new(apply: impl Fn(&mut Request) + Send + Sync + 'static) -> Self {
        Self(Arc::new(apply))
    }

    /// Applies the option to a request.
    pub fn apply(&self, request: &mut Request) {
        (self.0)(request);
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOption").finish_non_exhaustive()
    }
}

/// Applies options in iteration order.
pub fn apply_all<'a>(request: &mut Request, options: impl IntoIterator<Item = &'a RequestOption>) {
    for option in options {
        option.apply(request);
    }
}

/// Sets a query parameter, replacing any previous values of `key`.
///
/// Passing no values removes the parameter.
pub fn param<V: Into<String>>(
    key: impl Into<String>,
    values: impl IntoIterator<Item = V>,
) -> RequestOption {
    let key = key.into();
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    RequestOption::new(move |request| {
        request.query_mut().set_all(key.clone(), values.iter().cloned());
    })
}

/// Merges query values into the request, replacing values per key.
pub fn query(values: QueryValues) -> RequestOption {
    RequestOption::new(move |request| request.query_mut().merge(&values))
}

/// Serializes a struct into query parameters (see [`QueryValues::from_serialize`]).
pub fn query_serialize<T: serde::Serialize>(value: &T) -> Result<RequestOption> {
    QueryValues::from_serialize(value).map(query)
}

/// Sets a header, replacing existing values with the same name.
pub fn header(name: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let name = name.into();
    let value = value.into();
    RequestOption::new(move |request| request.set_header(name.clone(), value.clone()))
}

/// Sets `Authorization: Bearer <token>`.
pub fn bearer_auth(token: impl AsRef<str>) -> RequestOption {
    header(
        http::header::AUTHORIZATION.as_str(),
        format!("Bearer {}", token.as_ref()),
    )
}

/// Sets `Authorization: Basic <base64(username:password)>`.
pub fn basic_auth(username: impl AsRef<str>, password: impl AsRef<str>) -> RequestOption {
    let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    header(http::header::AUTHORIZATION.as_str(), format!("Basic {encoded}"))
}

/// Replaces the request body.
pub fn body(body: Body) -> RequestOption {
    RequestOption::new(move |request| request.set_body(body.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    fn request() -> Request {
        Request::parse(Method::Get, "https://example.com/v1/current.json", Body::empty())
            .expect("valid URL")
    }

    #[test]
    fn later_options_override_earlier_ones() {
        let mut request = request();
        apply_all(
            &mut request,
            [
                &param("key", ["abc"]),
                &header("Accept", "text/plain"),
                &param("key", ["xyz"]),
                &header("accept", "application/json"),
            ],
        );

        assert_eq!(request.query().get_all("key"), ["xyz"]);
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn query_merges_without_dropping_other_keys() {
        let mut request = request();
        param("key", ["abc"]).apply(&mut request);

        let values: QueryValues = [("q", "Greece/Athens"), ("aqi", "no")].into_iter().collect();
        query(values).apply(&mut request);

        assert_eq!(
            request.full_url().as_str(),
            "https://example.com/v1/current.json?aqi=no&key=abc&q=Greece%2FAthens"
        );
    }

    #[test]
    fn param_without_values_removes_key() {
        let mut request = request();
        param("key", ["abc"]).apply(&mut request);
        param("key", Vec::<String>::new()).apply(&mut request);

        assert!(request.query().is_empty());
    }

    #[test]
    fn query_serialize_from_struct() {
        #[derive(serde::Serialize)]
        struct Search {
            q: String,
            days: u8,
        }

        let option = query_serialize(&Search {
            q: "Athens".to_string(),
            days: 3,
        })
        .expect("serialize");

        let mut request = request();
        option.apply(&mut request);
        assert_eq!(request.query().encode(), "days=3&q=Athens");
    }

    #[test]
    fn auth_headers() {
        let mut request = request();
        bearer_auth("token123").apply(&mut request);
        assert_eq!(request.header("authorization"), Some("Bearer token123"));

        basic_auth("user", "pass").apply(&mut request);
        assert_eq!(request.header("Authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn body_option_replaces_body() {
        let mut request = request();
        body(Body::text("payload")).apply(&mut request);

        assert_eq!(request.body().as_bytes().as_ref(), b"payload");
    }

    #[test]
    fn options_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RequestOption>();
    }
}
