//! WebSocket connection management
//!
//! A connection is identified by a server-generated session id and tagged with
//! the role its client asked for. Outbound frames go through an unbounded
//! channel drained by the connection's writer task.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;

/// Serialized frame queued for a connection. Shared so that a broadcast
/// serializes once and hands the same text to every recipient.
pub type Outbound = Arc<str>;

/// Partition a connection is broadcast to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Waiter,
    Chef,
}

impl Role {
    /// Parse the `role` query parameter. Matching is exact; anything else
    /// (including a missing parameter) yields `None`.
    pub fn from_query(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "waiter" => Some(Self::Waiter),
            "chef" => Some(Self::Chef),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiter => "waiter",
            Self::Chef => "chef",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Represents an active WebSocket connection
#[derive(Debug)]
pub struct Connection {
    /// Unique session ID for this connection
    pub session_id: Uuid,

    /// Role from the handshake; `None` for missing or unrecognized roles
    pub role: Option<Role>,

    /// Channel to the writer task of this connection
    sender: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    /// Create a new connection
    pub fn new(role: Option<Role>, sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            role,
            sender,
        }
    }

    /// Whether the writer side is still draining frames
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queue an already serialized frame
    pub fn send_text(&self, text: Outbound) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        self.sender.send(text).map_err(|_| SendError::Closed)
    }

    /// Serialize an event and queue it for this connection only
    pub fn send(&self, event: &ServerEvent) -> Result<(), SendError> {
        let text = serde_json::to_string(event)?;
        self.send_text(text.into())
    }
}
