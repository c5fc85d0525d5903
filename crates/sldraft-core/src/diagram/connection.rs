//! Connections between components.

use super::{ComponentId, ConnectionId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An edge between two components (a conductor run on the SLD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    /// Source component.
    pub from: ComponentId,
    /// Target component.
    pub to: ComponentId,
    /// Conductor type tag, opaque to the engine.
    pub kind: String,
}

impl Connection {
    /// Create a connection with a fresh id.
    pub fn new(from: ComponentId, to: ComponentId, kind: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), from, to, kind)
    }

    /// Create a connection with a known id.
    pub fn with_id(id: ConnectionId, from: ComponentId, to: ComponentId, kind: impl Into<String>) -> Self {
        Self {
            id,
            from,
            to,
            kind: kind.into(),
        }
    }

    /// The connection's unique id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether either endpoint is the given component.
    pub fn touches(&self, component: ComponentId) -> bool {
        self.from == component || self.to == component
    }
}
