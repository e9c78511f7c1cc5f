//! Database liveness monitor.
//!
//! A background task that pings the store on a fixed interval and, when a
//! probe fails, asks the store to reconnect. It runs until
//! [`MonitorHandle::shutdown`] is called.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use clothes_catalog_core::{ConnectionLifecycle, Store, StoreError};

/// Monitor timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Time between probes.
    pub interval: Duration,
    /// Bound on a single probe.
    pub probe_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Periodic ping-and-reconnect loop over a [`Store`].
pub struct LivenessMonitor {
    store: Arc<dyn Store>,
    connection_string: SecretString,
    settings: MonitorSettings,
}

impl LivenessMonitor {
    /// Start the monitor on the current runtime.
    #[must_use]
    pub fn spawn(
        store: Arc<dyn Store>,
        connection_string: SecretString,
        settings: MonitorSettings,
    ) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let monitor = Self {
            store,
            connection_string,
            settings,
        };

        let task = tokio::spawn(monitor.run(cancel.clone()));
        MonitorHandle { cancel, task }
    }

    async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.settings.interval, "database liveness monitor started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.settings.interval) => {}
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = self.check() => {}
            }
        }
        info!("database liveness monitor stopped");
    }

    /// One probe, followed by a reconnect attempt if the probe failed.
    async fn check(&self) {
        let probe = tokio::time::timeout(self.settings.probe_timeout, self.store.ping()).await;
        let err = match probe {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(_) => StoreError::Timeout { op: "ping" },
        };

        warn!(error = %err, "database ping failed, reconnecting");
        match self.store.reconnect(&self.connection_string).await {
            Ok(()) => info!("database reconnected"),
            Err(e) => error!(error = %e, "database reconnect failed"),
        }
    }
}

/// Handle to a running [`LivenessMonitor`].
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the monitor and wait for its task to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "database liveness monitor task failed");
        }
    }

    /// Whether the monitor task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn settings() -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_failed_ping() {
        let store = Arc::new(MemoryStore::new());
        let handle = LivenessMonitor::spawn(
            store.clone(),
            SecretString::from("memory:".to_owned()),
            settings(),
        );

        store.disconnect();
        assert!(store.ping().await.is_err());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(store.is_connected());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reconnect_keeps_monitoring() {
        let store = Arc::new(MemoryStore::new());
        let handle = LivenessMonitor::spawn(
            store.clone(),
            SecretString::from("postgres://unreachable/catalog".to_owned()),
            settings(),
        );

        store.disconnect();
        tokio::time::sleep(Duration::from_secs(35)).await;

        assert!(!store.is_connected());
        assert!(!handle.is_finished());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_store_is_left_alone() {
        let store = Arc::new(MemoryStore::new());
        let handle = LivenessMonitor::spawn(
            store.clone(),
            SecretString::from("memory:".to_owned()),
            settings(),
        );

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(store.is_connected());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_the_loop() {
        let store = Arc::new(MemoryStore::new());
        let handle = LivenessMonitor::spawn(
            store.clone(),
            SecretString::from("memory:".to_owned()),
            settings(),
        );

        handle.shutdown().await;

        store.disconnect();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!store.is_connected());
    }
}
