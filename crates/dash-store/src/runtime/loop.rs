/// The feed runtime event loop.
///
/// A single async task that owns the connection, the subscription manager
/// and the router, and multiplexes over transport events and application
/// commands. It is the only writer of the store.
use tokio::sync::mpsc;

use dash_transport::{Connector, SubscriptionManager};

use crate::router::{Dispatch, IngestRouter};
use crate::store::StoreHandle;

use super::executor::{FeedLink, LinkEvent};
use super::RuntimeCommand;

/// Main event loop: owns all feed state.
pub(super) async fn runtime_loop<C: Connector>(
    connector: C,
    manager: SubscriptionManager,
    router: IngestRouter,
    store: StoreHandle,
    mut cmd_rx: mpsc::Receiver<RuntimeCommand>,
) {
    let mut link = FeedLink::new(connector, manager);

    loop {
        tokio::select! {
            // ── 1. Transport: frames, close, reconnect timer ────────
            event = link.next_event() => match event {
                LinkEvent::Frame(raw) => match router.dispatch(&store, &raw) {
                    Ok(Dispatch::Applied(topic)) => {
                        tracing::trace!(%topic, "frame applied");
                    }
                    Ok(Dispatch::Dropped { .. }) => {}
                    Err(e) => tracing::warn!(error = %e, "frame rejected"),
                },
                LinkEvent::Closed(reason) => {
                    match reason {
                        Some(e) => tracing::warn!(error = %e, "feed connection lost"),
                        None => tracing::debug!("feed closed by remote"),
                    }
                    link.on_channel_closed(&store).await;
                }
                LinkEvent::ReconnectDue => link.on_reconnect_elapsed(&store).await,
            },

            // ── 2. Commands from the application ───────────────────
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    // Every handle dropped.
                    let effects = link.manager.disconnect();
                    link.execute(effects, &store).await;
                    break;
                };
                if !handle_command(cmd, &mut link, &router, &store).await {
                    break;
                }
            }
        }
    }

    tracing::debug!("feed runtime stopped");
}

/// Returns `false` when the loop must stop.
async fn handle_command<C: Connector>(
    cmd: RuntimeCommand,
    link: &mut FeedLink<C>,
    router: &IngestRouter,
    store: &StoreHandle,
) -> bool {
    let effects = match cmd {
        RuntimeCommand::Connect => link.manager.connect(),
        RuntimeCommand::Disconnect => link.manager.disconnect(),
        RuntimeCommand::RegisterBundle(bundle) => link.manager.register_bundle(bundle),
        RuntimeCommand::UnregisterBundle(bundle) => link.manager.unregister_bundle(bundle),
        RuntimeCommand::RegisterTopic(topic) => link.manager.register_topic(topic),
        RuntimeCommand::UnregisterTopic(topic) => link.manager.unregister_topic(topic),
        RuntimeCommand::Reset => {
            // Counters first: `store.reset()` is what wakes subscribers.
            router.stats().reset();
            store.reset();
            vec![]
        }
        RuntimeCommand::IsConnected { reply } => {
            let _ = reply.send(link.manager.is_connected());
            vec![]
        }
        RuntimeCommand::RegisteredTopics { reply } => {
            let _ = reply.send(link.manager.registered_topics().collect());
            vec![]
        }
        RuntimeCommand::Shutdown => {
            let effects = link.manager.disconnect();
            link.execute(effects, store).await;
            return false;
        }
    };
    link.execute(effects, store).await;
    true
}
