// Per-run cancellation.
//
// Every network call made by a pipeline stage goes through `RunContext::call`,
// so a cancelled run stops at the next suspension point, including while the
// transport is waiting out a rate-limit window or a backoff. Timeouts are a
// transport concern and apply to each HTTP attempt (see `rate_limit::with_retry`).

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::bluesky::graph::XrpcError;
use crate::error::RaffleError;

/// Caller-owned controls for one raffle run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Await one network call unless the run is cancelled first.
    ///
    /// Call errors are turned into a `RaffleError` by `on_error`; cancellation
    /// always yields `RaffleError::Cancelled` and drops the request.
    pub(crate) async fn call<T, Fut, E>(&self, request: Fut, on_error: E) -> Result<T, RaffleError>
    where
        Fut: Future<Output = Result<T, XrpcError>>,
        E: FnOnce(XrpcError) -> RaffleError,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RaffleError::Cancelled),
            result = request => result.map_err(on_error),
        }
    }
}
