//! Client configuration types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::hook::LifecycleHook;
use crate::option::{self, ClientOption};
use crate::{RateLimiter, RequestOption, Transport};

/// Default bound on a whole call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Construction state of a [`Client`](crate::Client).
///
/// [`ClientOption`]s mutate it in order; the client is built from the result.
#[derive(Clone)]
pub struct ClientConfig {
    /// Prefix joined with every call path.
    pub base_url: String,
    /// Bound on a whole call, connect to last body byte. Zero means unbounded.
    pub timeout: Duration,
    /// Where requests are sent.
    pub transport: Transport,
    /// Idle connection timeout (network transport only).
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (network transport only).
    pub pool_max_idle_per_host: usize,
    /// Request options applied to every call before the call's own.
    pub persistent_request_options: Vec<RequestOption>,
    /// Optional gate on call throughput.
    pub rate_limiter: Option<RateLimiter>,
    /// Lifecycle hooks in registration order.
    pub hooks: Vec<Arc<dyn LifecycleHook>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            transport: Transport::default(),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            persistent_request_options: Vec::new(),
            rate_limiter: None,
            hooks: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Applies options in order to the default configuration.
    pub fn from_options(options: impl IntoIterator<Item = ClientOption>) -> Self {
        let mut config = Self::default();
        for option in options {
            option.apply(&mut config);
        }
        config
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("transport", &self.transport)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field(
                "persistent_request_options",
                &self.persistent_request_options.len(),
            )
            .field("rate_limiter", &self.rate_limiter.as_ref().map(RateLimiter::quota))
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Client settings loadable from a configuration file.
///
/// Absent fields keep the defaults. When both rate limits are set the
/// per-minute one wins.
///
/// # Example
///
/// ```
/// use courier::{Client, ClientSettings};
///
/// let settings: ClientSettings = serde_json::from_str(
///     r#"{ "base_url": "https://api.weatherapi.com/v1", "timeout_ms": 5000, "rate_limit": 10 }"#,
/// ).expect("valid settings");
///
/// let client = Client::new(settings.into_options());
/// assert_eq!(client.base_url(), "https://api.weatherapi.com/v1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    /// Prefix joined with every call path.
    pub base_url: Option<String>,
    /// Whole-call timeout in milliseconds; zero means unbounded.
    pub timeout_ms: Option<u64>,
    /// Connection establishment timeout in milliseconds.
    pub dial_timeout_ms: Option<u64>,
    /// Calls per second; zero disables the limiter.
    pub rate_limit: Option<u32>,
    /// Calls per minute; zero disables the limiter.
    pub rate_limit_per_minute: Option<u32>,
}

impl ClientSettings {
    /// Converts the settings into client options.
    #[must_use]
    pub fn into_options(self) -> Vec<ClientOption> {
        let mut options = Vec::new();
        if let Some(base_url) = self.base_url {
            options.push(option::base_url(base_url));
        }
        if let Some(ms) = self.timeout_ms {
            options.push(option::timeout(Duration::from_millis(ms)));
        }
        if let Some(ms) = self.dial_timeout_ms {
            options.push(option::dial_timeout(Duration::from_millis(ms)));
        }
        if let Some(count) = self.rate_limit {
            options.push(option::rate_limit(count));
        }
        if let Some(count) = self.rate_limit_per_minute {
            options.push(option::rate_limit_per_minute(count));
        }
        options
    }
}
