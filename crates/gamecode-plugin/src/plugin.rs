//! Plugin lifecycle: owns the bridge and runs the expiry sweep while loaded.

use crate::bridge::EventBridge;
use crate::config::PluginConfig;
use crate::host::Worker;
use crate::reservation::ReservationStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Plugin name reported to the host.
pub const PLUGIN_NAME: &str = "hbplugin-custom-gamecode";

/// A running sweep task and the channel that stops it.
struct Sweeper {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Custom game code plugin.
///
/// The host forwards `room.beforecreate` and `worker.beforejoin` events to
/// [`bridge`](Self::bridge) and calls [`on_load`](Self::on_load) /
/// [`on_unload`](Self::on_unload) around the plugin's lifetime.
pub struct CustomGameCodePlugin<W: Worker> {
    bridge: EventBridge<W>,
    sweep_interval: Duration,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<W: Worker> CustomGameCodePlugin<W>
where
    W::Settings: 'static,
{
    pub fn new(worker: Arc<W>, config: PluginConfig) -> Self {
        let store = ReservationStore::new(config.ttl());
        Self {
            bridge: EventBridge::new(store, worker, config.messages.clone()),
            sweep_interval: config.sweep_interval(),
            sweeper: Mutex::new(None),
        }
    }

    pub fn bridge(&self) -> &EventBridge<W> {
        &self.bridge
    }

    pub fn store(&self) -> &ReservationStore<W::Settings> {
        self.bridge.store()
    }

    /// Whether the sweep task is running.
    pub async fn is_loaded(&self) -> bool {
        self.sweeper.lock().await.is_some()
    }

    /// Start the periodic sweep of expired reservations.
    pub async fn on_load(&self) {
        let mut sweeper = self.sweeper.lock().await;
        if sweeper.is_some() {
            warn!(plugin = PLUGIN_NAME, "plugin already loaded");
            return;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run_sweeper(
            self.bridge.store().clone(),
            self.sweep_interval,
            stop_rx,
        ));
        *sweeper = Some(Sweeper { stop_tx, handle });

        info!(
            plugin = PLUGIN_NAME,
            interval_secs = self.sweep_interval.as_secs(),
            "plugin loaded"
        );
    }

    /// Stop the sweep task and wait for it to finish.
    pub async fn on_unload(&self) {
        let Some(Sweeper { stop_tx, handle }) = self.sweeper.lock().await.take() else {
            debug!(plugin = PLUGIN_NAME, "plugin not loaded");
            return;
        };

        let _ = stop_tx.send(());
        if let Err(e) = handle.await {
            warn!(plugin = PLUGIN_NAME, error = %e, "sweep task ended abnormally");
        }
        info!(plugin = PLUGIN_NAME, "plugin unloaded");
    }
}

async fn run_sweeper<S: Clone + Send + Sync>(
    store: ReservationStore<S>,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let Some(start) = Instant::now().checked_add(period) else {
        warn!(?period, "sweep period out of range, expiry is left to lookups");
        let _ = stop_rx.await;
        return;
    };
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                store.sweep(Instant::now()).await;
            }
            _ = &mut stop_rx => break,
        }
    }
    debug!("sweep task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryWorker;
    use crate::reservation::MAX_RESERVATION_TTL;
    use gamecode_core::{fingerprint, ClientInfo};

    fn plugin() -> CustomGameCodePlugin<MemoryWorker<u32>> {
        CustomGameCodePlugin::new(Arc::new(MemoryWorker::new()), PluginConfig::default())
    }

    fn owner() -> gamecode_core::Fingerprint {
        fingerprint(&ClientInfo {
            remote_addr: "192.0.2.50".parse().unwrap(),
            username: "dave".into(),
            client_version: "2021.6.30".into(),
            platform: "Android".into(),
            language: 0,
            mods: Vec::new(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_task_removes_expired_reservations() {
        let plugin = plugin();
        plugin.on_load().await;
        plugin.store().put(owner(), 7).await;

        // Nothing has expired before the first tick.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(plugin.store().len().await, 1);

        // The tick at 60s sees the reservation's deadline and drops it
        // without any lookup happening.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(plugin.store().is_empty().await);

        plugin.on_unload().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unload_stops_sweeping() {
        let plugin = plugin();
        plugin.on_load().await;
        assert!(plugin.is_loaded().await);
        plugin.on_unload().await;
        assert!(!plugin.is_loaded().await);

        plugin.store().put(owner(), 1).await;
        tokio::time::sleep(Duration::from_secs(300)).await;
        // Expired but never swept; the record is still held.
        assert_eq!(plugin.store().len().await, 1);
        assert_eq!(plugin.store().peek(&owner()).await, None);
    }

    #[tokio::test]
    async fn load_and_unload_are_idempotent() {
        let plugin = plugin();
        plugin.on_unload().await;
        plugin.on_load().await;
        plugin.on_load().await;
        assert!(plugin.is_loaded().await);
        plugin.on_unload().await;
        plugin.on_unload().await;
        assert!(!plugin.is_loaded().await);
    }

    #[tokio::test]
    async fn unvalidated_huge_durations_do_not_panic() {
        let mut config = PluginConfig::default();
        config.reservation.ttl_secs = u64::MAX;
        config.reservation.sweep_interval_secs = u64::MAX;
        let plugin = CustomGameCodePlugin::new(Arc::new(MemoryWorker::<u32>::new()), config);

        plugin.on_load().await;
        plugin.store().put(owner(), 3).await;
        assert_eq!(plugin.store().peek(&owner()).await, Some(3));
        assert_eq!(plugin.store().ttl(), MAX_RESERVATION_TTL);
        plugin.on_unload().await;
        assert!(!plugin.is_loaded().await);
    }

    #[tokio::test]
    async fn config_drives_store_ttl() {
        let mut config = PluginConfig::default();
        config.reservation.ttl_secs = 5;
        let plugin = CustomGameCodePlugin::new(Arc::new(MemoryWorker::<u32>::new()), config);
        assert_eq!(plugin.store().ttl(), Duration::from_secs(5));
    }
}
