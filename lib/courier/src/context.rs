//! Per-call cancellation and deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Cancellation token plus optional deadline carried by every call.
///
/// Cloning shares the token: cancelling any clone cancels them all. Use
/// [`CallContext::child`] for a context that is cancelled with its parent but
/// can also be cancelled on its own.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use courier::CallContext;
///
/// let cx = CallContext::with_timeout(Duration::from_secs(5));
/// let forecast = client.read_json::<Forecast>(&cx, Method::Get, "/current.json", Body::empty(), &[]).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and never expires on its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context expiring `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context expiring at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context driven by an existing cancellation token.
    #[must_use]
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A child context: cancelled when `self` is, with the same deadline.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// A child context whose deadline is the earlier of the current one and
    /// `timeout` from now.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    /// The underlying cancellation token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this context and every child.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fails if the context is already cancelled or expired.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `future` until it completes or the context is cancelled or
    /// expires, whichever happens first.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output> {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Error::Cancelled),
            () = expired => Err(Error::DeadlineExceeded),
            output = future => Ok(output),
        }
    }
}
