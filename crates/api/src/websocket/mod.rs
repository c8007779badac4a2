//! WebSocket support for the order relay
//!
//! # Architecture
//!
//! - **Connection**: one live socket with its optional role and outbound queue
//! - **Registry**: connections partitioned by role
//! - **Broadcast**: fan-out of one serialized event to one or more partitions
//! - **Router**: parses client frames and runs order commands
//! - **Snapshot**: the order list a new connection sees first
//! - **Handler**: Axum route and connection lifecycle

pub mod broadcast;
pub mod connection;
pub mod events;
pub mod handler;
pub mod registry;
pub mod router;
pub mod snapshot;

pub use broadcast::{broadcast, BroadcastReport};
pub use connection::{Connection, Role};
pub use events::{ClientEvent, ServerEvent};
pub use handler::{close_session, open_session, root, ws_handler};
pub use registry::{RegistryStats, SessionRegistry};
pub use router::{route_text, Command};
