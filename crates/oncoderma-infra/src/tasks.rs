//! Long-lived background jobs bound to a cancellation token

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Run `job` every `period` until `cancel_token` is cancelled.
///
/// The first run happens one full period after spawning. A job that is
/// mid-flight when the token fires is allowed to finish.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel_token: CancellationToken,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let period = period.max(MIN_PERIOD);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        tracing::debug!(task = name, period_secs = period.as_secs_f64(), "Background task started");

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    tracing::debug!(task = name, "Background task stopping");
                    break;
                }
                _ = interval.tick() => {
                    job().await;
                }
            }
        }
    })
}
