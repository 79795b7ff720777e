//! Guarded provider calls and bounded fan-out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use zoneguard_core::gateway::{ExcludedZones, GatewayError, ProviderGateway};

/// Run one provider call under a deadline, giving up early on cancellation.
pub(crate) async fn guarded<T, F>(
    call: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    if cancel.is_cancelled() {
        return Err(GatewayError::Cancelled);
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(GatewayError::Cancelled),
        result = tokio::time::timeout(timeout, call) => match result {
            Ok(inner) => inner,
            Err(_) => Err(GatewayError::timed_out(timeout)),
        },
    }
}

/// Fetch excluded zones for each id with at most `concurrency` calls in
/// flight. Results come back in the order of `ids`.
///
/// Each call owns its inputs; the returned future is `Send`.
pub(crate) async fn fetch_excluded(
    gateway: &Arc<dyn ProviderGateway>,
    ids: &[String],
    concurrency: usize,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Vec<(String, Result<ExcludedZones, GatewayError>)> {
    let calls: Vec<BoxFuture<'static, (String, Result<ExcludedZones, GatewayError>)>> = ids
        .iter()
        .map(|id| {
            let gateway = Arc::clone(gateway);
            let cancel = cancel.clone();
            let id = id.clone();
            async move {
                let result = guarded(gateway.fetch_excluded_zones(&id), timeout, &cancel).await;
                (id, result)
            }
            .boxed()
        })
        .collect();

    stream::iter(calls)
        .buffered(concurrency.max(1))
        .collect()
        .await
}
