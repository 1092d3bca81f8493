use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

/// Default collection interval: 10 minutes (spec.md Section 4.8).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(600);

/// Handle to a running ticker loop; `stop()` signals it and waits for the
/// in-flight tick (if any) to finish before returning.
pub struct Ticker {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Ticker {
    /// Spawns a background loop that calls `on_tick` every `interval`
    /// until stopped, driving `collectRegions` (C5) from C8's ticker
    /// (spec.md Section 4.8).
    pub fn spawn<F, Fut>(interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately, skip it
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        info!("ticker stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        on_tick().await;
                    }
                }
            }
        });

        Ticker {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn ticker_fires_on_interval_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        let ticker = Ticker::spawn(Duration::from_millis(10), move || {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        ticker.stop().await;

        assert!(count.load(Ordering::SeqCst) >= 2);
    }
}
