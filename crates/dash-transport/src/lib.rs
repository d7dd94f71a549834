//! Node dashboard feed transport.
//!
//! One physical duplex connection multiplexes every metric topic. This crate
//! owns the boundary with that connection:
//!
//! - [`Topic`] / [`TopicBundle`]: the logical channels and the groups a
//!   view activates together.
//! - [`InboundFrame`] / [`ControlFrame`]: the JSON payload envelope and the
//!   two-byte register/unregister control frame.
//! - [`Connector`] / [`Channel`]: the transport seam, with a
//!   length-prefixed TCP implementation ([`TcpConnector`]).
//! - [`SubscriptionManager`]: pure connection lifecycle + topic
//!   registration state machine. It performs no I/O; callers execute the
//!   [`TransportEffect`]s it returns.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use dash_transport::{Channel, Connector, FeedConfig, SubscriptionManager, TcpConnector, TransportEffect};
//!
//! # async fn example() -> Result<(), dash_transport::DashTransportError> {
//! let config = FeedConfig::new().addr("127.0.0.1:8081");
//! let connector = TcpConnector::new(&config);
//! let mut manager = SubscriptionManager::new(config.reconnect_delay);
//!
//! for effect in manager.connect() {
//!     if effect == TransportEffect::Dial {
//!         let mut channel = connector.connect().await?;
//!         for effect in manager.on_connected() {
//!             if let TransportEffect::Send(frame) = effect {
//!                 channel.send(&frame.to_bytes()).await?;
//!             }
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod channel;
mod config;
mod error;
mod frame;
mod subscription;
mod tcp;
mod topic;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use channel::{Channel, Connector};
pub use config::FeedConfig;
pub use error::DashTransportError;
pub use frame::{ControlAction, ControlFrame, InboundFrame};
pub use subscription::{ConnectionState, SubscriptionManager, TransportEffect};
pub use tcp::{TcpChannel, TcpConnector};
pub use topic::{Topic, TopicBundle};
