//! Fixed-interval poll loop shared by all samplers

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A periodic metrics source driven by [`spawn_sampler`].
///
/// Implementations own their snapshot cache; a failed cycle must leave the
/// cache untouched so readers keep seeing the previous snapshot.
#[async_trait]
pub trait Sampler: Send + Sync + 'static {
    /// Short label used in log output.
    fn name(&self) -> &'static str;

    /// Perform one full poll cycle.
    async fn poll(&self);
}

/// Handle to a running sampler loop.
pub struct SamplerHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SamplerHandle {
    /// Signal the loop to stop and wait for it to exit. An in-flight poll is
    /// not interrupted; the loop exits at its next wakeup.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

/// Spawn a background loop that polls `sampler` once immediately and then on
/// every tick of `interval` until stopped.
///
/// Exactly one poll executes at a time: the loop is sequential, so a cycle
/// that runs longer than the interval delays the next tick instead of
/// running concurrently with it.
pub fn spawn_sampler<S: Sampler>(sampler: Arc<S>, interval: Duration) -> SamplerHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!(
            "starting {} sampler loop (interval {:?})",
            sampler.name(),
            interval
        );

        sampler.poll().await;

        let mut ticker = tokio::time::interval(interval);
        // The first tick of a tokio interval completes immediately; the
        // initial poll above already covered it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => sampler.poll().await,
                _ = shutdown_rx.changed() => break,
            }
        }

        debug!("{} sampler loop stopped", sampler.name());
    });

    SamplerHandle {
        shutdown_tx,
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSampler {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl Sampler for CountingSampler {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn poll(&self) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_and_on_interval() {
        let sampler = Arc::new(CountingSampler {
            polls: AtomicUsize::new(0),
        });
        let handle = spawn_sampler(Arc::clone(&sampler), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let count = sampler.polls.load(Ordering::SeqCst);
        assert!(count >= 3, "expected at least 3 polls, got {}", count);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_polls_after_stop() {
        let sampler = Arc::new(CountingSampler {
            polls: AtomicUsize::new(0),
        });
        let handle = spawn_sampler(Arc::clone(&sampler), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.stop().await;

        let stopped_at = sampler.polls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(stopped_at, sampler.polls.load(Ordering::SeqCst));
    }
}
