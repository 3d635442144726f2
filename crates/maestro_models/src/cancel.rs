//! Combined supersede/deadline cancellation for outbound calls.

use maestro_error::{AbortReason, ClientError, ClientErrorKind, MaestroResult};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run a call future under a derived cancellation signal.
///
/// The signal fires on whichever comes first: the externally supplied token
/// (a newer round superseding this one, or a user stop) or the fixed ceiling
/// timeout. Firing drops the in-flight future, which cancels the pending
/// network operation, and resolves to a distinguished aborted outcome.
///
/// # Examples
///
/// ```
/// use maestro_models::bounded;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let result = bounded(&cancel, Duration::from_millis(10), async {
///     tokio::time::sleep(Duration::from_secs(60)).await;
///     Ok(())
/// })
/// .await;
/// assert!(result.unwrap_err().is_aborted());
/// # }
/// ```
pub async fn bounded<T, F>(
    cancel: &CancellationToken,
    ceiling: Duration,
    fut: F,
) -> MaestroResult<T>
where
    F: Future<Output = MaestroResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("Call superseded before completion");
            Err(ClientError::new(ClientErrorKind::Aborted(AbortReason::Superseded)).into())
        }
        _ = tokio::time::sleep(ceiling) => {
            tracing::debug!(ceiling_ms = ceiling.as_millis() as u64, "Call hit ceiling timeout");
            Err(ClientError::new(ClientErrorKind::Aborted(AbortReason::DeadlineElapsed)).into())
        }
        out = fut => out,
    }
}
