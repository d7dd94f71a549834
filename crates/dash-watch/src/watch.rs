//! The watch loop: runtime lifecycle, bundle registration and summaries.

use crate::events::{emit, now_iso, EventConnectivity, EventStarted, EventStopped, EventSummary};
use dash_store::{DashRuntime, DashStoreError, RuntimeChannels, RuntimeHandle, StoreChange};
use dash_transport::{FeedConfig, TcpConnector, TopicBundle};
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;

pub struct WatchConfig {
    pub feed: FeedConfig,
    /// Always starts with [`TopicBundle::Main`].
    pub bundles: Vec<TopicBundle>,
    pub summary_interval: Duration,
}

impl WatchConfig {
    /// Bundles the watcher registers itself; main is registered by the
    /// runtime on every connect.
    fn extra_bundles(&self) -> impl Iterator<Item = TopicBundle> + '_ {
        self.bundles
            .iter()
            .copied()
            .filter(|b| *b != TopicBundle::Main)
    }
}

/// A lagged change stream may have skipped a `Connectivity(true)`. If the
/// feed is up, register the extra bundles again; registration is idempotent
/// on the node. Returns whether anything was sent.
async fn resync_after_lag(
    handle: &RuntimeHandle,
    config: &WatchConfig,
) -> Result<bool, DashStoreError> {
    if !handle.is_connected().await {
        return Ok(false);
    }
    for bundle in config.extra_bundles() {
        handle.register_bundle(bundle).await?;
    }
    Ok(true)
}

pub async fn run(config: WatchConfig, start: Instant) -> anyhow::Result<()> {
    let connector = TcpConnector::new(&config.feed);
    let RuntimeChannels {
        handle,
        store,
        mut changes,
        stats,
    } = DashRuntime::spawn(connector, config.feed.clone());

    emit(&EventStarted::new(&config.feed, &config.bundles));
    handle.connect().await?;

    let mut ticker = tokio::time::interval(config.summary_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                eprintln!("\nCtrl+C received, shutting down...");
                break;
            }
            _ = ticker.tick() => {
                let summary = EventSummary::from_store(&store.read(), &stats, start.elapsed().as_secs_f64());
                emit(&summary);
            }
            change = changes.recv() => match change {
                Ok(StoreChange::Connectivity(up)) => {
                    emit(&EventConnectivity::new(up, start.elapsed().as_secs_f64()));
                    if up {
                        for bundle in config.extra_bundles() {
                            handle.register_bundle(bundle).await?;
                        }
                    }
                }
                Ok(StoreChange::Updated(_)) | Ok(StoreChange::Reset) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "store change stream lagged");
                    resync_after_lag(&handle, &config).await?;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    for bundle in config.extra_bundles() {
        let _ = handle.unregister_bundle(bundle).await;
    }
    handle.shutdown().await;

    emit(&EventStopped {
        event: "stopped",
        elapsed_s: start.elapsed().as_secs_f64(),
        timestamp: now_iso(),
    });
    Ok(())
}
