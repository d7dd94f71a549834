/// Feed runtime: drives the transport, the subscription manager and the
/// ingest router from one task.
///
/// The runtime owns the connector and is the only writer of the store. It
/// exposes a channel-based API so the consumer (UI, CLI) never touches raw
/// frames or connection state.
mod executor;
mod r#loop;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use dash_transport::{Connector, FeedConfig, SubscriptionManager, Topic, TopicBundle};

use crate::error::DashStoreError;
use crate::router::{IngestRouter, RouterStats};
use crate::store::{StoreChange, StoreHandle};

// ── Commands (app → runtime) ──────────────────────────────────────────

/// Commands the application sends to the runtime event loop.
#[derive(Debug)]
pub enum RuntimeCommand {
    /// Open the feed connection (no-op if already connecting or connected).
    Connect,
    /// Unregister the main bundle and close. No reconnect follows.
    Disconnect,
    RegisterBundle(TopicBundle),
    UnregisterBundle(TopicBundle),
    RegisterTopic(Topic),
    UnregisterTopic(Topic),
    /// Clear every history in the store and zero the ingest counters.
    Reset,
    /// Query: is the feed connection up?
    IsConnected { reply: oneshot::Sender<bool> },
    /// Query: topics registered on the current connection.
    RegisteredTopics { reply: oneshot::Sender<Vec<Topic>> },
    /// Disconnect and stop the loop.
    Shutdown,
}

// ── RuntimeHandle (app-facing API) ───────────────────────────────────

/// Handle to communicate with a running [`DashRuntime`].
///
/// Cheap to clone. All methods are channel sends.
#[derive(Clone)]
pub struct RuntimeHandle {
    cmd_tx: mpsc::Sender<RuntimeCommand>,
    store: StoreHandle,
}

impl RuntimeHandle {
    /// The store this runtime writes into.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Start connecting. Reconnects after a loss are automatic.
    pub async fn connect(&self) -> Result<(), DashStoreError> {
        self.send(RuntimeCommand::Connect).await
    }

    /// Explicit teardown: unregister the main bundle, close, stay closed
    /// until the next [`connect`](Self::connect).
    pub async fn disconnect(&self) -> Result<(), DashStoreError> {
        self.send(RuntimeCommand::Disconnect).await
    }

    /// Register every topic of `bundle`. Ignored while disconnected.
    pub async fn register_bundle(&self, bundle: TopicBundle) -> Result<(), DashStoreError> {
        self.send(RuntimeCommand::RegisterBundle(bundle)).await
    }

    pub async fn unregister_bundle(&self, bundle: TopicBundle) -> Result<(), DashStoreError> {
        self.send(RuntimeCommand::UnregisterBundle(bundle)).await
    }

    /// Register one topic. Ignored while disconnected.
    pub async fn register_topic(&self, topic: Topic) -> Result<(), DashStoreError> {
        self.send(RuntimeCommand::RegisterTopic(topic)).await
    }

    pub async fn unregister_topic(&self, topic: Topic) -> Result<(), DashStoreError> {
        self.send(RuntimeCommand::UnregisterTopic(topic)).await
    }

    /// Clear the store and zero the ingest counters. Serialized with ingest,
    /// so no handler runs halfway through a reset.
    pub async fn reset(&self) -> Result<(), DashStoreError> {
        self.send(RuntimeCommand::Reset).await
    }

    /// Whether the feed connection is up. `false` once the runtime stopped.
    pub async fn is_connected(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.send(RuntimeCommand::IsConnected { reply: tx }).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Topics registered on the current connection, in wire id order.
    pub async fn registered_topics(&self) -> Vec<Topic> {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .send(RuntimeCommand::RegisteredTopics { reply: tx })
            .await;
        rx.await.unwrap_or_default()
    }

    /// Graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown).await;
    }

    async fn send(&self, cmd: RuntimeCommand) -> Result<(), DashStoreError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| DashStoreError::RuntimeShutDown)
    }
}

// ── RuntimeChannels ──────────────────────────────────────────────────

/// Returned to the application when the runtime starts.
pub struct RuntimeChannels {
    /// Handle to send commands to the runtime.
    pub handle: RuntimeHandle,
    /// Shared read access to the store.
    pub store: StoreHandle,
    /// Change notifications, subscribed before the loop started.
    pub changes: broadcast::Receiver<StoreChange>,
    /// Ingest counters.
    pub stats: Arc<RouterStats>,
}

// ── DashRuntime ──────────────────────────────────────────────────────

/// The feed runtime: spawn it and communicate via channels.
pub struct DashRuntime;

impl DashRuntime {
    /// Spawn the event loop with the standard ingest handlers.
    ///
    /// Does not connect; call [`RuntimeHandle::connect`].
    pub fn spawn<C>(connector: C, config: FeedConfig) -> RuntimeChannels
    where
        C: Connector + 'static,
    {
        Self::spawn_with_router(connector, config, IngestRouter::new())
    }

    /// Spawn the event loop with a custom router.
    pub fn spawn_with_router<C>(
        connector: C,
        config: FeedConfig,
        router: IngestRouter,
    ) -> RuntimeChannels
    where
        C: Connector + 'static,
    {
        let store = StoreHandle::new();
        let changes = store.subscribe();
        let stats = router.stats();
        let manager = SubscriptionManager::new(config.reconnect_delay);

        // Command channel (app → runtime)
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>(config.recv_buffer);

        tokio::spawn(r#loop::runtime_loop(
            connector,
            manager,
            router,
            store.clone(),
            cmd_rx,
        ));

        RuntimeChannels {
            handle: RuntimeHandle {
                cmd_tx,
                store: store.clone(),
            },
            store,
            changes,
            stats,
        }
    }
}
