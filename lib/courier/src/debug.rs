//! Debug hook writing wire dumps to a logger.
//!
//! # Example
//!
//! ```ignore
//! use courier::{Client, option};
//!
//! // Dumps go to tracing at DEBUG level on target `courier::debug`
//! let client = Client::new([option::debug(courier::TracingLogger)]);
//!
//! // Or to any closure
//! let client = Client::new([option::debug(|line: &str| eprintln!("{line}"))]);
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::hook::{LifecycleHook, RequestSummary};
use crate::{CallContext, Error, Response, Result, dump};

/// Sink for debug output.
pub trait DebugLogger: Send + Sync {
    /// Writes one message.
    fn debug(&self, message: &str);
}

impl<F> DebugLogger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn debug(&self, message: &str) {
        self(message);
    }
}

/// Logger emitting `tracing` events at DEBUG level on target `courier::debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl DebugLogger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "courier::debug", "{message}");
    }
}

/// Lifecycle hook dumping every request and response.
///
/// When the transport fails, a single `METHOD URL: ERR: message` line is
/// written instead of the response dump and the hook reports the failure as
/// [`Error::Hook`].
#[derive(Clone)]
pub struct DebugHook {
    logger: Arc<dyn DebugLogger>,
}

impl DebugHook {
    /// Creates a hook writing to `logger`.
    pub fn new(logger: impl DebugLogger + 'static) -> Self {
        Self {
            logger: Arc::new(logger),
        }
    }
}

impl Default for DebugHook {
    fn default() -> Self {
        Self::new(TracingLogger)
    }
}

impl fmt::Debug for DebugHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugHook").finish_non_exhaustive()
    }
}

impl LifecycleHook for DebugHook {
    fn begin_request(&self, _cx: &CallContext, request: &http::Request<Bytes>) -> Result<()> {
        self.logger.debug(&dump::request(request));
        Ok(())
    }

    fn end_request(
        &self,
        _cx: &CallContext,
        request: &RequestSummary,
        outcome: std::result::Result<&Response, &Error>,
    ) -> Result<()> {
        match outcome {
            Ok(response) => {
                self.logger.debug(&dump::response(response));
                Ok(())
            }
            Err(err) => {
                let line = format!("{request}: ERR: {err}");
                self.logger.debug(&line);
                Err(Error::hook(line))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::HeaderMap;

    use super::*;

    fn capture() -> (Arc<Mutex<Vec<String>>>, DebugHook) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let hook = DebugHook::new(move |line: &str| {
            sink.lock().expect("lines lock").push(line.to_string());
        });
        (lines, hook)
    }

    fn request() -> http::Request<Bytes> {
        http::Request::builder()
            .uri("http://127.0.0.1:1/v1/current.json?key=abc")
            .body(Bytes::new())
            .expect("request")
    }

    #[test]
    fn dumps_request_and_response() {
        let (lines, hook) = capture();
        let cx = CallContext::new();
        let request = request();

        hook.begin_request(&cx, &request).expect("begin");
        let response = Response::new(204, HeaderMap::new(), Bytes::new());
        hook.end_request(&cx, &RequestSummary::from(&request), Ok(&response))
            .expect("end");

        let lines = lines.lock().expect("lines lock");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("GET /v1/current.json?key=abc HTTP/1.1\r\n"));
        assert_eq!(lines[1], "HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[test]
    fn send_failure_logs_single_error_line() {
        let (lines, hook) = capture();
        let request = request();
        let failure = Error::connection("connection refused");

        let err = hook
            .end_request(
                &CallContext::new(),
                &RequestSummary::from(&request),
                Err(&failure),
            )
            .expect_err("relays failure");

        let expected =
            "GET http://127.0.0.1:1/v1/current.json?key=abc: ERR: connection error: connection refused";
        assert!(err.is_hook());
        assert_eq!(*lines.lock().expect("lines lock"), [expected]);
    }

    #[test]
    fn tracing_logger_is_a_logger() {
        fn assert_logger<L: DebugLogger>(_: &L) {}
        assert_logger(&TracingLogger);
        TracingLogger.debug("no subscriber installed");
    }
}
