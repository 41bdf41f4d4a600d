//! Construction-time client options.
//!
//! Each function returns a [`ClientOption`] mutating the [`ClientConfig`]. The
//! options are applied once, in the order given: scalar settings are last
//! write wins, while persistent request options and hooks accumulate.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use courier::{Client, option, request_option};
//!
//! let client = Client::new([
//!     option::base_url("https://api.weatherapi.com/v1"),
//!     option::timeout(Duration::from_secs(5)),
//!     option::persistent_request_options([request_option::param("key", ["abc"])]),
//!     option::rate_limit(10),
//! ]);
//! assert_eq!(client.base_url(), "https://api.weatherapi.com/v1");
//! ```

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tower_service::Service;

use crate::debug::{DebugHook, DebugLogger};
use crate::hook::LifecycleHook;
use crate::{ClientConfig, RateLimiter, RequestOption, Transport};

/// A construction-time mutation of [`ClientConfig`].
pub struct ClientOption(Box<dyn FnOnce(&mut ClientConfig) + Send>);

impl ClientOption {
    /// Wraps a closure as a client option.
    pub fn new(apply: impl FnOnce(&mut ClientConfig) + Send + 'static) -> Self {
        Self(Box::new(apply))
    }

    /// Applies the option.
    pub fn apply(self, config: &mut ClientConfig) {
        (self.0)(config);
    }
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOption").finish_non_exhaustive()
    }
}

/// Sets the prefix joined with every call path.
///
/// The value is not validated here; a malformed URL fails each call with
/// [`Error::InvalidUrl`](crate::Error::InvalidUrl).
pub fn base_url(uri: impl Into<String>) -> ClientOption {
    let uri = uri.into();
    ClientOption::new(move |config| config.base_url = uri)
}

/// Bounds a whole call, connection to last body byte. Zero means unbounded.
#[must_use]
pub fn timeout(timeout: Duration) -> ClientOption {
    ClientOption::new(move |config| config.timeout = timeout)
}

/// Uses the network transport with a bound on connection establishment.
///
/// Replaces any previously configured transport, including a handler.
#[must_use]
pub fn dial_timeout(timeout: Duration) -> ClientOption {
    ClientOption::new(move |config| {
        config.transport = Transport::Network {
            dial_timeout: Some(timeout),
        };
    })
}

/// Serves every request in-process through `service`.
///
/// Replaces any previously configured transport, including one set by
/// [`dial_timeout`].
pub fn handler<S>(service: S) -> ClientOption
where
    S: Service<http::Request<Bytes>, Response = http::Response<Bytes>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    ClientOption::new(move |config| config.transport = Transport::handler(service))
}

/// Sets the transport directly.
#[must_use]
pub fn transport(transport: Transport) -> ClientOption {
    ClientOption::new(move |config| config.transport = transport)
}

/// Appends request options applied to every call, before the call's own.
pub fn persistent_request_options(options: impl IntoIterator<Item = RequestOption>) -> ClientOption {
    let options: Vec<RequestOption> = options.into_iter().collect();
    ClientOption::new(move |config| config.persistent_request_options.extend(options))
}

/// Limits calls to `per_second` per second. Zero removes any limiter.
#[must_use]
pub fn rate_limit(per_second: u32) -> ClientOption {
    ClientOption::new(move |config| config.rate_limiter = RateLimiter::per_second(per_second))
}

/// Limits calls to `per_minute` per minute. Zero removes any limiter.
#[must_use]
pub fn rate_limit_per_minute(per_minute: u32) -> ClientOption {
    ClientOption::new(move |config| config.rate_limiter = RateLimiter::per_minute(per_minute))
}

/// Appends a [`DebugHook`] writing wire dumps to `logger`.
pub fn debug(logger: impl DebugLogger + 'static) -> ClientOption {
    hook(DebugHook::new(logger))
}

/// Appends a lifecycle hook.
pub fn hook(hook: impl LifecycleHook + 'static) -> ClientOption {
    let hook: Arc<dyn LifecycleHook> = Arc::new(hook);
    ClientOption::new(move |config| config.hooks.push(hook))
}

/// Sets how long idle pooled connections are kept.
#[must_use]
pub fn pool_idle_timeout(timeout: Duration) -> ClientOption {
    ClientOption::new(move |config| config.pool_idle_timeout = timeout)
}

/// Sets the maximum number of idle pooled connections per host.
#[must_use]
pub fn pool_max_idle_per_host(max: usize) -> ClientOption {
    ClientOption::new(move |config| config.pool_max_idle_per_host = max)
}
