//! Supervised periodic tasks
//!
//! Fixed-interval loops that log failures with context and keep going. A
//! failing tick never kills the task and never disappears silently.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Spawn a named periodic task. The first tick fires after one full period;
/// run the closure once by hand first if startup execution is needed.
pub fn spawn_supervised<F, Fut>(name: &'static str, period: Duration, mut task: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), crate::error::BotError>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The immediate first tick is consumed here
        interval.tick().await;

        loop {
            interval.tick().await;
            tracing::debug!(task = name, "Running periodic task");

            if let Err(e) = task().await {
                tracing::error!(task = name, error = %e, "Periodic task failed");
            }
        }
    })
}
