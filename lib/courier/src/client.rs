//! The client and its request pipeline.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tower_service::Service;
use tracing::{Instrument, Level, debug, span, trace};

use crate::config::ClientConfig;
use crate::debug::DebugLogger;
use crate::hook::{HookChain, LifecycleHook, RequestSummary};
use crate::option::{self, ClientOption};
use crate::transport::Sender;
use crate::{
    Body, CallContext, Error, Method, RateLimiter, Request, RequestOption, Response, Result, Transport,
    request_option,
};

// ============================================================================
// Public Client
// ============================================================================

/// HTTP client with persistent request options, rate limiting, and
/// lifecycle hooks.
///
/// Cloning is cheap; clones share the transport, the rate limiter, and the
/// hooks.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use courier::{Body, CallContext, Client, Method, request_option};
///
/// let client = Client::builder()
///     .base_url("https://api.weatherapi.com/v1")
///     .timeout(Duration::from_secs(10))
///     .persistent_request_options([request_option::param("key", [api_key])])
///     .rate_limit(5)
///     .build();
///
/// let cx = CallContext::with_timeout(Duration::from_secs(30));
/// let current: Option<Current> = client
///     .read_json(&cx, Method::Get, "/current.json", Body::empty(), &[
///         request_option::param("q", ["Greece/Athens"]),
///     ])
///     .await?;
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: String,
    timeout: Option<Duration>,
    sender: Sender,
    persistent_request_options: Vec<RequestOption>,
    rate_limiter: Option<RateLimiter>,
    hooks: HookChain,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("Client")
            .field("base_url", &inner.base_url)
            .field("timeout", &inner.timeout)
            .field("transport", &inner.sender)
            .field(
                "persistent_request_options",
                &inner.persistent_request_options.len(),
            )
            .field("rate_limiter", &inner.rate_limiter.as_ref().map(RateLimiter::quota))
            .field("hooks", &inner.hooks)
            .finish()
    }
}

impl Client {
    /// Creates a client, applying `options` in order to the defaults.
    pub fn new(options: impl IntoIterator<Item = ClientOption>) -> Self {
        Self::with_config(ClientConfig::from_options(options))
    }

    /// Creates a client from a finished configuration.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let ClientConfig {
            base_url,
            timeout,
            transport,
            pool_idle_timeout,
            pool_max_idle_per_host,
            persistent_request_options,
            rate_limiter,
            hooks,
        } = config;

        let inner = ClientInner {
            base_url,
            timeout: (!timeout.is_zero()).then_some(timeout),
            sender: transport.into_sender(pool_idle_timeout, pool_max_idle_per_host),
            persistent_request_options,
            rate_limiter,
            hooks: HookChain::new(hooks),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Prefix joined with every call path.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Whole-call timeout; `None` when unbounded.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    /// Request options applied to every call.
    #[must_use]
    pub fn persistent_request_options(&self) -> &[RequestOption] {
        &self.inner.persistent_request_options
    }

    /// The rate limiter, if one is configured.
    #[must_use]
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.inner.rate_limiter.as_ref()
    }

    /// Runs a call through the full pipeline and returns the raw response.
    ///
    /// The URL is `base_url` followed by `path`. Persistent request options
    /// are applied first, then `options`. A request that cannot be built fails
    /// before the rate limiter is touched. The call then waits on the rate
    /// limiter, runs the begin hooks, sends, and runs the end hooks. Non-2xx
    /// statuses are not errors here.
    pub async fn execute(
        &self,
        cx: &CallContext,
        method: Method,
        path: &str,
        body: Body,
        options: &[RequestOption],
    ) -> Result<Response> {
        let url = format!("{}{path}", self.inner.base_url);
        let span = span!(Level::INFO, "http_request", %method, path = route(path));

        async move {
            let mut request = Request::parse(method, &url, body)?;
            request_option::apply_all(
                &mut request,
                self.inner.persistent_request_options.iter().chain(options),
            );
            let request = request.into_http()?;

            if let Some(limiter) = &self.inner.rate_limiter {
                trace!("waiting for rate limiter");
                limiter
                    .until_ready(cx)
                    .await
                    .inspect_err(|err| debug!(error = %err, "rate limiter wait aborted"))?;
            }

            self.inner
                .hooks
                .begin(cx, &request)
                .inspect_err(|err| debug!(error = %err, "request rejected by begin hook"))?;

            let summary = RequestSummary::from(&request);
            let start = Instant::now();
            let outcome = self.send(cx, request).await;

            // Saturating conversion to u64 (truncates after ~584 million years)
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            match &outcome {
                Ok(response) => debug!(status = response.status(), elapsed_ms, "request completed"),
                Err(err) => debug!(error = %err, elapsed_ms, "request failed"),
            }

            self.inner.hooks.end(cx, &summary, outcome)
        }
        .instrument(span)
        .await
    }

    /// Sends through the transport, bounded by the client timeout and the
    /// call context.
    async fn send(&self, cx: &CallContext, request: http::Request<Bytes>) -> Result<Response> {
        let send = self.inner.sender.send(request);
        let bounded = async {
            match self.inner.timeout {
                Some(timeout) => tokio::time::timeout(timeout, send)
                    .await
                    .unwrap_or(Err(Error::Timeout)),
                None => send.await,
            }
        };

        cx.run(bounded).await?
    }

    /// Runs a call and decodes a JSON response.
    ///
    /// Sends `Accept: application/json` unless `options` override it. A 4xx
    /// or 5xx status fails with [`Error::Http`](crate::Error::Http) carrying
    /// the body. An empty body yields `Ok(None)`.
    pub async fn read_json<T: DeserializeOwned>(
        &self,
        cx: &CallContext,
        method: Method,
        path: &str,
        body: Body,
        options: &[RequestOption],
    ) -> Result<Option<T>> {
        let options: Vec<RequestOption> = std::iter::once(request_option::header(
            http::header::ACCEPT.as_str(),
            "application/json",
        ))
        .chain(options.iter().cloned())
        .collect();

        self.execute(cx, method, path, body, &options)
            .await?
            .error_for_status()?
            .decode()
    }

    /// Runs a call and returns the body as text, failing on 4xx or 5xx.
    pub async fn read_text(
        &self,
        cx: &CallContext,
        method: Method,
        path: &str,
        body: Body,
        options: &[RequestOption],
    ) -> Result<String> {
        self.execute(cx, method, path, body, options)
            .await?
            .error_for_status()?
            .text()
    }

    /// `GET path`.
    pub async fn get(&self, cx: &CallContext, path: &str, options: &[RequestOption]) -> Result<Response> {
        self.execute(cx, Method::Get, path, Body::empty(), options).await
    }

    /// `POST path` with a body.
    pub async fn post(
        &self,
        cx: &CallContext,
        path: &str,
        body: Body,
        options: &[RequestOption],
    ) -> Result<Response> {
        self.execute(cx, Method::Post, path, body, options).await
    }

    /// `PUT path` with a body.
    pub async fn put(
        &self,
        cx: &CallContext,
        path: &str,
        body: Body,
        options: &[RequestOption],
    ) -> Result<Response> {
        self.execute(cx, Method::Put, path, body, options).await
    }

    /// `PATCH path` with a body.
    pub async fn patch(
        &self,
        cx: &CallContext,
        path: &str,
        body: Body,
        options: &[RequestOption],
    ) -> Result<Response> {
        self.execute(cx, Method::Patch, path, body, options).await
    }

    /// `DELETE path`.
    pub async fn delete(
        &self,
        cx: &CallContext,
        path: &str,
        options: &[RequestOption],
    ) -> Result<Response> {
        self.execute(cx, Method::Delete, path, Body::empty(), options)
            .await
    }
}

/// Path without its query, for the request span.
fn route(path: &str) -> &str {
    path.split_once('?').map_or(path, |(route, _)| route)
}

impl Default for Client {
    fn default() -> Self {
        Self::with_config(ClientConfig::default())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder collecting [`ClientOption`]s.
///
/// Every method appends the matching option from [`crate::option`]; they are
/// applied in call order by [`ClientBuilder::build`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use courier::Client;
///
/// let client = Client::builder()
///     .base_url("http://localhost:8080")
///     .timeout(Duration::from_secs(2))
///     .dial_timeout(Duration::from_millis(300))
///     .build();
///
/// assert_eq!(client.timeout(), Some(Duration::from_secs(2)));
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    options: Vec<ClientOption>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("options_count", &self.options.len())
            .finish()
    }
}

impl ClientBuilder {
    /// Appends an arbitrary option.
    #[must_use]
    pub fn option(mut self, option: ClientOption) -> Self {
        self.options.push(option);
        self
    }

    /// See [`option::base_url`].
    #[must_use]
    pub fn base_url(self, uri: impl Into<String>) -> Self {
        self.option(option::base_url(uri))
    }

    /// See [`option::timeout`].
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.option(option::timeout(timeout))
    }

    /// See [`option::dial_timeout`].
    #[must_use]
    pub fn dial_timeout(self, timeout: Duration) -> Self {
        self.option(option::dial_timeout(timeout))
    }

    /// See [`option::handler`].
    #[must_use]
    pub fn handler<S>(self, service: S) -> Self
    where
        S: Service<http::Request<Bytes>, Response = http::Response<Bytes>, Error = Infallible>
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        self.option(option::handler(service))
    }

    /// See [`option::transport`].
    #[must_use]
    pub fn transport(self, transport: Transport) -> Self {
        self.option(option::transport(transport))
    }

    /// See [`option::persistent_request_options`].
    #[must_use]
    pub fn persistent_request_options(self, options: impl IntoIterator<Item = RequestOption>) -> Self {
        self.option(option::persistent_request_options(options))
    }

    /// See [`option::rate_limit`].
    #[must_use]
    pub fn rate_limit(self, per_second: u32) -> Self {
        self.option(option::rate_limit(per_second))
    }

    /// See [`option::rate_limit_per_minute`].
    #[must_use]
    pub fn rate_limit_per_minute(self, per_minute: u32) -> Self {
        self.option(option::rate_limit_per_minute(per_minute))
    }

    /// See [`option::debug`].
    #[must_use]
    pub fn debug(self, logger: impl DebugLogger + 'static) -> Self {
        self.option(option::debug(logger))
    }

    /// See [`option::hook`].
    #[must_use]
    pub fn hook(self, hook: impl LifecycleHook + 'static) -> Self {
        self.option(option::hook(hook))
    }

    /// See [`option::pool_idle_timeout`].
    #[must_use]
    pub fn pool_idle_timeout(self, timeout: Duration) -> Self {
        self.option(option::pool_idle_timeout(timeout))
    }

    /// See [`option::pool_max_idle_per_host`].
    #[must_use]
    pub fn pool_max_idle_per_host(self, max: usize) -> Self {
        self.option(option::pool_max_idle_per_host(max))
    }

    /// Applies the collected options and builds the client.
    #[must_use]
    pub fn build(self) -> Client {
        Client::new(self.options)
    }
}
