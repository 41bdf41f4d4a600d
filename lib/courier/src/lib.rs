//! Configurable HTTP client for Rust.
//!
//! Build a [`Client`] from composable [`option`]s, attach persistent and
//! per-call [`RequestOption`]s, optionally gate calls with a [`RateLimiter`],
//! and observe every request/response pair with [`LifecycleHook`]s.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use courier::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct Current {
//!     temp_c: f64,
//! }
//!
//! let client = Client::new([
//!     option::base_url("https://api.weatherapi.com/v1"),
//!     option::persistent_request_options([request_option::param("key", [api_key])]),
//!     option::rate_limit(5),
//!     option::debug(TracingLogger),
//! ]);
//!
//! let cx = CallContext::with_timeout(Duration::from_secs(10));
//! let current: Option<Current> = client
//!     .read_json(&cx, Method::Get, "/current.json", Body::empty(), &[
//!         request_option::param("q", ["Greece/Athens"]),
//!     ])
//!     .await?;
//! ```
//!
//! # Pipeline
//!
//! Every call goes through the same steps, in order:
//!
//! 1. build the URL as `base_url + path`
//! 2. apply persistent request options, then the call's own
//! 3. wait on the rate limiter, if any
//! 4. run every hook's begin phase; the first error aborts the call
//! 5. send through the transport within the client timeout
//! 6. run every hook's end phase
//!
//! The [`CallContext`] can cancel the call at steps 3 and 5.

mod client;
mod config;
mod connector;
mod context;
pub mod debug;
pub mod dump;
mod hook;
pub mod option;
pub mod prelude;
mod rate_limit;
mod transport;

// Re-export client types
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ClientSettings, DEFAULT_TIMEOUT};
pub use context::CallContext;
pub use debug::{DebugHook, DebugLogger, TracingLogger};
pub use hook::{LifecycleHook, RequestSummary};
pub use option::ClientOption;
pub use rate_limit::RateLimiter;
pub use transport::{HandlerService, Transport};

// Re-export core types
pub use courier_core::{
    Body, ContentType, Error, Method, QueryValues, Request, RequestOption, Response, Result,
    from_json, request_option, to_form, to_json,
};

// Re-export http types for status codes and headers
pub use courier_core::{StatusCode, header};

// Re-export crates used in public signatures
pub use governor::Quota;
pub use tokio_util::sync::CancellationToken;
pub use tower;
pub use tower::service_fn;
