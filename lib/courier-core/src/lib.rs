//! Core types for the courier HTTP client.
//!
//! This crate holds everything that does not need a network stack:
//! - [`Request`] - the outgoing request description options mutate
//! - [`RequestOption`] and the [`request_option`] combinators
//! - [`QueryValues`] - multi-valued query parameters
//! - [`Body`] and [`ContentType`] - request bodies
//! - [`Response`] - buffered response with content-type driven decoding
//! - [`Method`] - HTTP method enum
//! - [`Error`] and [`Result`] - error handling

mod body;
mod error;
mod method;
pub mod prelude;
mod query;
mod request;
pub mod request_option;
mod response;

pub use body::{Body, ContentType, from_json, to_form, to_json};
pub use error::{Error, Result};
pub use method::Method;
pub use query::QueryValues;
pub use request::Request;
pub use request_option::RequestOption;
pub use response::Response;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
