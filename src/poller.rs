//! Background interval loops with a shutdown handle

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// `interval_at` rejects a zero period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct PollerHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Run `tick` after `initial_delay`, then every `interval`
    ///
    /// A slow tick delays the next one instead of queueing a burst.
    pub fn spawn<F, Fut>(
        name: &'static str,
        initial_delay: Duration,
        interval: Duration,
        mut tick: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let interval = interval.max(MIN_INTERVAL);
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            info!(poller = name, ?interval, "Poller started");
            let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        debug!(poller = name, "tick");
                        tick().await;
                    }
                }
            }
            info!(poller = name, "Poller stopped");
        });

        Self {
            name,
            shutdown,
            join,
        }
    }

    /// Signal the loop and wait for the in-flight tick to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            warn!(poller = self.name, "Poller task ended abnormally: {}", e);
        }
    }
}
