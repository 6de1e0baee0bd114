use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Banner text shown whenever a liveness probe fails
pub const HEALTH_ERROR_MESSAGE: &str =
    "Backend server is not running or not healthy. Please check the server and refresh this page.";

/// The client's current belief about backend reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Checking,
    Connected,
    Disconnected,
}

/// Published after every probe, not only on change. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthUpdate {
    pub state: ConnectivityState,
    pub message: Option<String>,
}

/// Background liveness prober.
///
/// Probes once immediately on spawn, then on a fixed cadence until dropped or
/// stopped. A failed probe never stops the loop. Out-of-band probes can be
/// requested through the poke channel (used after a send gets no response).
pub struct HealthMonitor {
    poke_tx: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl HealthMonitor {
    /// Spawn the probe loop. Generic over the probe so the backend client can
    /// be swapped out in tests.
    pub fn spawn<P, Fut>(
        probe: P,
        period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<HealthUpdate>)
    where
        P: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send,
    {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (poke_tx, mut poke_rx) = mpsc::unbounded_channel::<()>();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    poked = poke_rx.recv() => {
                        if poked.is_none() {
                            break;
                        }
                    }
                }

                let update = match probe().await {
                    Ok(()) => HealthUpdate {
                        state: ConnectivityState::Connected,
                        message: None,
                    },
                    Err(err) => {
                        log::warn!("health probe failed: {err:#}");
                        HealthUpdate {
                            state: ConnectivityState::Disconnected,
                            message: Some(HEALTH_ERROR_MESSAGE.to_string()),
                        }
                    }
                };

                if update_tx.send(update).is_err() {
                    break;
                }
            }
        });

        (Self { poke_tx, task }, update_rx)
    }

    /// Sender used to request an immediate probe outside the cadence
    pub fn poke_sender(&self) -> mpsc::UnboundedSender<()> {
        self.poke_tx.clone()
    }

    pub fn probe_now(&self) {
        let _ = self.poke_tx.send(());
    }

    /// Cancel the probe loop. Idempotent; pending probes are dropped.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
