//! Transports: the real network or an in-process handler.
//!
//! A client has exactly one transport. [`Transport`] is the configuration-time
//! choice; at construction it is turned into a [`Sender`] that the request
//! pipeline calls.

use std::convert::Infallible;
use std::fmt::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::{TokioExecutor, TokioTimer},
};
use tower::ServiceExt;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::connector::https_connector;
use crate::{Error, Response, Result};

/// Type-erased in-process request handler.
pub type HandlerService = BoxCloneService<http::Request<Bytes>, http::Response<Bytes>, Infallible>;

/// Where requests are sent.
#[derive(Clone)]
pub enum Transport {
    /// Real network access through a pooled hyper client.
    Network {
        /// Bound on connection establishment, including name resolution.
        dial_timeout: Option<Duration>,
    },
    /// Every request is answered in-process by a tower service.
    Handler(HandlerService),
}

impl Transport {
    /// Wraps a tower service as a handler transport.
    ///
    /// # Example
    ///
    /// ```
    /// use std::convert::Infallible;
    /// use bytes::Bytes;
    /// use courier::Transport;
    ///
    /// let transport = Transport::handler(tower::service_fn(|_req: http::Request<Bytes>| async {
    ///     Ok::<_, Infallible>(http::Response::new(Bytes::from_static(br#"{"value":42}"#)))
    /// }));
    /// assert!(!transport.is_network());
    /// ```
    pub fn handler<S>(service: S) -> Self
    where
        S: Service<http::Request<Bytes>, Response = http::Response<Bytes>, Error = Infallible>
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        Self::Handler(BoxCloneService::new(service))
    }

    /// Whether requests go to the network.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Builds the sender for this transport.
    pub(crate) fn into_sender(self, pool_idle_timeout: Duration, pool_max_idle_per_host: usize) -> Sender {
        match self {
            Self::Network { dial_timeout } => Sender::Network(NetworkSender::new(
                dial_timeout,
                pool_idle_timeout,
                pool_max_idle_per_host,
            )),
            Self::Handler(service) => Sender::Handler(SharedHandler::new(service)),
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::Network { dial_timeout: None }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { dial_timeout } => f
                .debug_struct("Network")
                .field("dial_timeout", dial_timeout)
                .finish(),
            Self::Handler(_) => f.debug_tuple("Handler").finish_non_exhaustive(),
        }
    }
}

// ============================================================================
// Senders
// ============================================================================

/// The active transport of a built client.
#[derive(Clone)]
pub(crate) enum Sender {
    Network(NetworkSender),
    Handler(SharedHandler),
}

impl Sender {
    /// Sends a request and buffers the whole response body.
    pub(crate) async fn send(&self, request: http::Request<Bytes>) -> Result<Response> {
        match self {
            Self::Network(sender) => sender.send(request).await,
            Self::Handler(handler) => Ok(handler.call(request).await),
        }
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Network(_) => "Network",
            Self::Handler(_) => "Handler",
        })
    }
}

/// Pooled hyper client over rustls.
#[derive(Clone)]
pub(crate) struct NetworkSender {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl NetworkSender {
    fn new(
        dial_timeout: Option<Duration>,
        pool_idle_timeout: Duration,
        pool_max_idle_per_host: usize,
    ) -> Self {
        let connector = https_connector(dial_timeout);

        let inner = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(pool_idle_timeout)
            .pool_max_idle_per_host(pool_max_idle_per_host)
            .build(connector);

        Self { inner }
    }

    async fn send(&self, request: http::Request<Bytes>) -> Result<Response> {
        let response = self
            .inner
            .request(request.map(Full::new))
            .await
            .map_err(|e| map_hyper_error(&e))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::connection(error_chain(&e)))?
            .to_bytes();

        Ok(Response::from(http::Response::from_parts(parts, body)))
    }
}

fn map_hyper_error(err: &hyper_util::client::legacy::Error) -> Error {
    let msg = error_chain(err);
    let lower = msg.to_ascii_lowercase();

    if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
        return Error::tls(msg);
    }

    Error::connection(msg)
}

/// Joins an error with all of its sources.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(msg, ": {cause}");
        source = cause.source();
    }
    msg
}

/// Thread-safe handle on a [`HandlerService`].
///
/// `BoxCloneService` is not `Sync`; the mutex only guards cloning, each call
/// runs on its own clone.
#[derive(Clone)]
pub(crate) struct SharedHandler {
    inner: Arc<Mutex<HandlerService>>,
}

impl SharedHandler {
    fn new(service: HandlerService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    async fn call(&self, request: http::Request<Bytes>) -> Response {
        // Lock, clone the service, and release the lock immediately
        let service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        match service.oneshot(request).await {
            Ok(response) => Response::from(response),
            Err(never) => match never {},
        }
    }
}
