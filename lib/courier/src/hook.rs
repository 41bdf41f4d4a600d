//! Lifecycle hooks observing every request/response pair.
//!
//! Hooks run in registration order in both phases. A failing begin phase stops
//! the call before anything is sent; every end phase always runs.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::{CallContext, Error, Response, Result};

/// Observer of the request lifecycle.
///
/// Both methods default to doing nothing, so a hook only implements the phase
/// it cares about.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use courier::{CallContext, Error, LifecycleHook, Result};
///
/// struct RequireAuth;
///
/// impl LifecycleHook for RequireAuth {
///     fn begin_request(&self, _cx: &CallContext, request: &http::Request<Bytes>) -> Result<()> {
///         if request.headers().contains_key(http::header::AUTHORIZATION) {
///             Ok(())
///         } else {
///             Err(Error::hook("missing credentials"))
///         }
///     }
/// }
/// ```
pub trait LifecycleHook: Send + Sync {
    /// Called after options are applied and before the request is sent.
    ///
    /// An error aborts the call without sending.
    fn begin_request(&self, cx: &CallContext, request: &http::Request<Bytes>) -> Result<()> {
        let _ = (cx, request);
        Ok(())
    }

    /// Called once the transport finished, successfully or not.
    fn end_request(
        &self,
        cx: &CallContext,
        request: &RequestSummary,
        outcome: std::result::Result<&Response, &Error>,
    ) -> Result<()> {
        let _ = (cx, request, outcome);
        Ok(())
    }
}

/// Method and URI of a request that was handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    method: http::Method,
    uri: http::Uri,
}

impl RequestSummary {
    /// Creates a summary.
    #[must_use]
    pub const fn new(method: http::Method, uri: http::Uri) -> Self {
        Self { method, uri }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &http::Method {
        &self.method
    }

    /// Full request URI.
    #[must_use]
    pub const fn uri(&self) -> &http::Uri {
        &self.uri
    }
}

impl<B> From<&http::Request<B>> for RequestSummary {
    fn from(request: &http::Request<B>) -> Self {
        Self::new(request.method().clone(), request.uri().clone())
    }
}

impl fmt::Display for RequestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

/// Ordered, shared list of hooks.
#[derive(Clone, Default)]
pub(crate) struct HookChain {
    hooks: Arc<[Arc<dyn LifecycleHook>]>,
}

impl HookChain {
    pub(crate) fn new(hooks: Vec<Arc<dyn LifecycleHook>>) -> Self {
        Self {
            hooks: hooks.into(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Runs every begin phase, stopping at the first failure.
    pub(crate) fn begin(&self, cx: &CallContext, request: &http::Request<Bytes>) -> Result<()> {
        for hook in self.hooks.iter() {
            hook.begin_request(cx, request)?;
        }
        Ok(())
    }

    /// Runs every end phase and folds the results into the call outcome.
    ///
    /// A send error is returned as is. Otherwise the first end-hook error is
    /// returned. Errors that lose are logged.
    pub(crate) fn end(
        &self,
        cx: &CallContext,
        request: &RequestSummary,
        outcome: Result<Response>,
    ) -> Result<Response> {
        let mut hook_error = None;
        for hook in self.hooks.iter() {
            if let Err(err) = hook.end_request(cx, request, outcome.as_ref()) {
                if hook_error.is_none() {
                    hook_error = Some(err);
                } else {
                    debug!(error = %err, "discarding end hook error after an earlier one");
                }
            }
        }

        match (outcome, hook_error) {
            (Err(err), Some(hook_err)) => {
                debug!(error = %hook_err, "discarding end hook error in favour of send error");
                Err(err)
            }
            (Err(err), None) => Err(err),
            (Ok(_), Some(hook_err)) => Err(hook_err),
            (Ok(response), None) => Ok(response),
        }
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::HeaderMap;

    use super::*;

    /// Records phase events into a shared log and fails on demand.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_begin: bool,
        fail_end: bool,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                fail_begin: false,
                fail_end: false,
            }
        }

        fn push(&self, event: &str) {
            self.log
                .lock()
                .expect("log lock")
                .push(format!("{}:{event}", self.name));
        }
    }

    impl LifecycleHook for Recorder {
        fn begin_request(&self, _cx: &CallContext, _request: &http::Request<Bytes>) -> Result<()> {
            self.push("begin");
            if self.fail_begin {
                return Err(Error::hook(format!("{} rejected", self.name)));
            }
            Ok(())
        }

        fn end_request(
            &self,
            _cx: &CallContext,
            _request: &RequestSummary,
            outcome: std::result::Result<&Response, &Error>,
        ) -> Result<()> {
            self.push(if outcome.is_ok() { "end:ok" } else { "end:err" });
            if self.fail_end {
                return Err(Error::hook(format!("{} failed", self.name)));
            }
            Ok(())
        }
    }

    fn request() -> http::Request<Bytes> {
        http::Request::builder()
            .uri("http://localhost/test")
            .body(Bytes::new())
            .expect("request")
    }

    fn ok_response() -> Result<Response> {
        Ok(Response::new(200, HeaderMap::new(), Bytes::new()))
    }

    fn chain(hooks: Vec<Recorder>) -> HookChain {
        HookChain::new(
            hooks
                .into_iter()
                .map(|h| Arc::new(h) as Arc<dyn LifecycleHook>)
                .collect(),
        )
    }

    #[test]
    fn begin_runs_in_order_and_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut second = Recorder::new("b", &log);
        second.fail_begin = true;
        let chain = chain(vec![Recorder::new("a", &log), second, Recorder::new("c", &log)]);

        let err = chain
            .begin(&CallContext::new(), &request())
            .expect_err("b rejects");

        assert_eq!(err.to_string(), "lifecycle hook failed: b rejected");
        assert_eq!(*log.lock().expect("log lock"), ["a:begin", "b:begin"]);
    }

    #[test]
    fn end_runs_every_hook_and_returns_first_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut first = Recorder::new("a", &log);
        first.fail_end = true;
        let mut second = Recorder::new("b", &log);
        second.fail_end = true;
        let chain = chain(vec![first, second, Recorder::new("c", &log)]);

        let summary = RequestSummary::from(&request());
        let err = chain
            .end(&CallContext::new(), &summary, ok_response())
            .expect_err("end hook failure");

        assert_eq!(err.to_string(), "lifecycle hook failed: a failed");
        assert_eq!(
            *log.lock().expect("log lock"),
            ["a:end:ok", "b:end:ok", "c:end:ok"]
        );
    }

    #[test]
    fn send_error_outranks_end_hook_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut failing = Recorder::new("a", &log);
        failing.fail_end = true;
        let chain = chain(vec![failing, Recorder::new("b", &log)]);

        let summary = RequestSummary::from(&request());
        let err = chain
            .end(
                &CallContext::new(),
                &summary,
                Err(Error::connection("refused")),
            )
            .expect_err("send failure");

        assert!(err.is_connection());
        assert_eq!(*log.lock().expect("log lock"), ["a:end:err", "b:end:err"]);
    }

    #[test]
    fn empty_chain_passes_outcome_through() {
        let chain = HookChain::default();
        assert_eq!(chain.len(), 0);

        let summary = RequestSummary::from(&request());
        let response = chain
            .end(&CallContext::new(), &summary, ok_response())
            .expect("response");
        assert_eq!(response.status(), 200);
    }

    #[test]
    fn summary_display() {
        let summary = RequestSummary::from(&request());
        assert_eq!(summary.to_string(), "GET http://localhost/test");
    }
}
