use std::future::Future;
use std::time::Duration;

/// Returned by [`with_timeout`] when the deadline passes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutError;

/// Asynchronously waits for the provided duration in a platform-compatible way.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }

    sleep_impl(duration).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep_impl(duration: Duration) {
    use gloo_timers::future::sleep;
    sleep(duration).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep_impl(duration: Duration) {
    use tokio::time::sleep;
    sleep(duration).await;
}

/// Runs `future` to completion unless `duration` elapses first.
pub async fn with_timeout<F, T>(future: F, duration: Duration) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    with_timeout_impl(future, duration).await
}

#[cfg(not(target_arch = "wasm32"))]
async fn with_timeout_impl<F, T>(future: F, duration: Duration) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError)
}

#[cfg(target_arch = "wasm32")]
async fn with_timeout_impl<F, T>(future: F, duration: Duration) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    use futures::future::{select, Either};

    let future = Box::pin(future);
    let deadline = Box::pin(gloo_timers::future::sleep(duration));
    match select(future, deadline).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(_) => Err(TimeoutError),
    }
}
