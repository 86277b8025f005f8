use std::{future::Future, time::Duration};

use tokio::time::error::Elapsed;

/// Timeout helpers for any future, needs to be polled inside a tokio runtime
pub trait FutureTimeoutExt: Future + Sized {
    /// Fails with [`Elapsed`] if the future has not completed after `duration`
    fn with_timeout(self, duration: Duration) -> tokio::time::Timeout<Self> {
        tokio::time::timeout(duration, self)
    }
}

impl<F: Future> FutureTimeoutExt for F {}

/// Like [`FutureTimeoutExt::with_timeout`], but `None` waits forever
pub async fn optional_timeout<F: Future>(
    duration: Option<Duration>,
    fut: F,
) -> Result<F::Output, Elapsed> {
    match duration {
        Some(duration) => tokio::time::timeout(duration, fut).await,
        None => Ok(fut.await),
    }
}
