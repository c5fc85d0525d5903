//! The diagram model: components, connections, and metadata.
//!
//! Every mutation is a pure function returning a new [`Diagram`]; the
//! receiver is never modified. The history manager relies on this to apply
//! and revert commands without partially-applied states.

mod component;
mod connection;

pub use component::Component;
pub use connection::Connection;

pub(crate) use component::is_valid_size;

use crate::error::{EngineError, EngineResult};
use crate::geometry;
use chrono::{DateTime, Utc};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Unique identifier for a component.
pub type ComponentId = Uuid;
/// Unique identifier for a connection.
pub type ConnectionId = Uuid;
/// Open attribute mapping carried by components.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Current serialization format version.
pub const FORMAT_VERSION: u32 = 1;

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramMetadata {
    /// Display name.
    pub name: String,
    /// Serialization format version.
    pub format_version: u32,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Timestamp of the last successful mutation.
    pub modified: DateTime<Utc>,
}

impl Default for DiagramMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            name: "Untitled".to_string(),
            format_version: FORMAT_VERSION,
            created: now,
            modified: now,
        }
    }
}

/// A single-line diagram: the unit of persistence and export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagram {
    /// Document metadata.
    pub metadata: DiagramMetadata,
    components: HashMap<ComponentId, Component>,
    connections: HashMap<ConnectionId, Connection>,
}

impl Diagram {
    /// Create an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty diagram with a name.
    pub fn named(name: impl Into<String>) -> Self {
        let mut diagram = Self::new();
        diagram.metadata.name = name.into();
        diagram
    }

    fn touch(&mut self) {
        self.metadata.modified = Utc::now();
    }

    // --- Pure mutations ---

    /// Add a component. Fails with `DuplicateId` if the id is taken.
    pub fn add_component(&self, component: Component) -> EngineResult<Diagram> {
        if self.components.contains_key(&component.id) {
            return Err(EngineError::DuplicateId(component.id.to_string()));
        }
        if !component.has_valid_size() {
            return Err(EngineError::InvalidGeometry(format!(
                "component {} has non-positive size {}x{}",
                component.id, component.size.width, component.size.height
            )));
        }
        let mut next = self.clone();
        next.components.insert(component.id, component);
        next.touch();
        Ok(next)
    }

    /// Remove a component and every connection touching it.
    pub fn remove_component(&self, id: ComponentId) -> EngineResult<Diagram> {
        if !self.components.contains_key(&id) {
            return Err(EngineError::NotFound(id.to_string()));
        }
        let mut next = self.clone();
        next.components.remove(&id);
        next.connections.retain(|_, c| !c.touches(id));
        next.touch();
        Ok(next)
    }

    /// Replace a component's position.
    pub fn move_component(&self, id: ComponentId, position: Point) -> EngineResult<Diagram> {
        self.update_component(id, |c| {
            c.position = position;
            Ok(())
        })
    }

    /// Replace a component's size.
    pub fn resize_component(&self, id: ComponentId, size: Size) -> EngineResult<Diagram> {
        if !is_valid_size(size) {
            return Err(EngineError::InvalidGeometry(format!(
                "non-positive size {}x{}",
                size.width, size.height
            )));
        }
        self.update_component(id, |c| {
            c.size = size;
            Ok(())
        })
    }

    /// Set (`Some`) or remove (`None`) a single property.
    pub fn set_component_property(
        &self,
        id: ComponentId,
        key: &str,
        value: Option<serde_json::Value>,
    ) -> EngineResult<Diagram> {
        self.update_component(id, |c| {
            match value {
                Some(v) => {
                    c.properties.insert(key.to_string(), v);
                }
                None => {
                    c.properties.remove(key);
                }
            }
            Ok(())
        })
    }

    /// Add a connection. Both endpoints must exist.
    pub fn add_connection(&self, connection: Connection) -> EngineResult<Diagram> {
        if self.connections.contains_key(&connection.id) {
            return Err(EngineError::DuplicateId(connection.id.to_string()));
        }
        self.check_endpoints(&connection)?;
        let mut next = self.clone();
        next.connections.insert(connection.id, connection);
        next.touch();
        Ok(next)
    }

    /// Remove a connection.
    pub fn remove_connection(&self, id: ConnectionId) -> EngineResult<Diagram> {
        if !self.connections.contains_key(&id) {
            return Err(EngineError::NotFound(id.to_string()));
        }
        let mut next = self.clone();
        next.connections.remove(&id);
        next.touch();
        Ok(next)
    }

    fn update_component(
        &self,
        id: ComponentId,
        f: impl FnOnce(&mut Component) -> EngineResult<()>,
    ) -> EngineResult<Diagram> {
        if !self.components.contains_key(&id) {
            return Err(EngineError::NotFound(id.to_string()));
        }
        let mut next = self.clone();
        if let Some(component) = next.components.get_mut(&id) {
            f(component)?;
        }
        next.touch();
        Ok(next)
    }

    fn check_endpoints(&self, connection: &Connection) -> EngineResult<()> {
        if connection.from == connection.to {
            return Err(EngineError::InvalidGeometry(format!(
                "connection {} connects component {} to itself",
                connection.id, connection.from
            )));
        }
        for endpoint in [connection.from, connection.to] {
            if !self.components.contains_key(&endpoint) {
                return Err(EngineError::DanglingReference(format!(
                    "connection {} references missing component {}",
                    connection.id, endpoint
                )));
            }
        }
        Ok(())
    }

    // --- Queries ---

    /// Get a component by id.
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    /// Get a connection by id.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Whether a component exists.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    /// Iterate over all components (unordered).
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Iterate over all component ids (unordered).
    pub fn component_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.keys().copied()
    }

    /// Iterate over all connections (unordered).
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Connections with the given component as either endpoint.
    pub fn connections_of(&self, id: ComponentId) -> Vec<&Connection> {
        self.connections.values().filter(|c| c.touches(id)).collect()
    }

    /// Bounding rect of all components.
    pub fn bounds(&self) -> Option<Rect> {
        geometry::bounds_union(self.components.values().map(Component::bounds))
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the diagram has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Structural equality ignoring `metadata.modified`.
    pub fn eq_ignoring_modified(&self, other: &Diagram) -> bool {
        self.components == other.components
            && self.connections == other.connections
            && self.metadata.name == other.metadata.name
            && self.metadata.format_version == other.metadata.format_version
            && self.metadata.created == other.metadata.created
    }

    /// Check the model invariants (used when loading untrusted data).
    pub fn validate(&self) -> EngineResult<()> {
        for (key, component) in &self.components {
            if *key != component.id {
                return Err(EngineError::Serialization(format!(
                    "component keyed {} carries id {}",
                    key, component.id
                )));
            }
            if !component.has_valid_size() {
                return Err(EngineError::InvalidGeometry(format!(
                    "component {} has non-positive size",
                    component.id
                )));
            }
        }
        for (key, connection) in &self.connections {
            if *key != connection.id {
                return Err(EngineError::Serialization(format!(
                    "connection keyed {} carries id {}",
                    key, connection.id
                )));
            }
            self.check_endpoints(connection)?;
        }
        Ok(())
    }

    /// Serialize the diagram to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate a diagram from JSON.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let diagram: Diagram = serde_json::from_str(json)?;
        diagram.validate()?;
        Ok(diagram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(x: f64, y: f64) -> Component {
        Component::new("breaker", Point::new(x, y), Size::new(20.0, 40.0))
    }

    #[test]
    fn test_diagram_creation() {
        let diagram = Diagram::new();
        assert!(diagram.is_empty());
        assert_eq!(diagram.metadata.format_version, FORMAT_VERSION);
    }

    #[test]
    fn test_add_component_is_pure() {
        let diagram = Diagram::new();
        let c = breaker(0.0, 0.0);
        let id = c.id();
        let next = diagram.add_component(c).unwrap();
        assert!(diagram.is_empty());
        assert_eq!(next.len(), 1);
        assert!(next.component(id).is_some());
    }

    #[test]
    fn test_add_duplicate_component() {
        let c = breaker(0.0, 0.0);
        let diagram = Diagram::new().add_component(c.clone()).unwrap();
        assert!(matches!(
            diagram.add_component(c),
            Err(EngineError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_add_component_rejects_zero_size() {
        let c = Component::new("meter", Point::ZERO, Size::new(0.0, 10.0));
        assert!(matches!(
            Diagram::new().add_component(c),
            Err(EngineError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_remove_missing_component() {
        let result = Diagram::new().remove_component(Uuid::new_v4());
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_cascade_delete() {
        let a = breaker(0.0, 0.0);
        let b = breaker(100.0, 0.0);
        let c = breaker(200.0, 0.0);
        let c1 = Connection::new(a.id(), b.id(), "copper");
        let c2 = Connection::new(b.id(), c.id(), "copper");
        let (c1_id, c2_id) = (c1.id(), c2.id());
        let a_id = a.id();

        let diagram = Diagram::new()
            .add_component(a)
            .and_then(|d| d.add_component(b))
            .and_then(|d| d.add_component(c))
            .and_then(|d| d.add_connection(c1))
            .and_then(|d| d.add_connection(c2))
            .unwrap();

        let next = diagram.remove_component(a_id).unwrap();
        assert!(next.connection(c1_id).is_none());
        assert!(next.connection(c2_id).is_some());
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_dangling_connection_rejected() {
        let a = breaker(0.0, 0.0);
        let a_id = a.id();
        let diagram = Diagram::new().add_component(a).unwrap();
        let conn = Connection::new(a_id, Uuid::new_v4(), "copper");
        assert!(matches!(
            diagram.add_connection(conn),
            Err(EngineError::DanglingReference(_))
        ));
    }

    #[test]
    fn test_self_loop_rejected() {
        let a = breaker(0.0, 0.0);
        let a_id = a.id();
        let diagram = Diagram::new().add_component(a).unwrap();
        let conn = Connection::new(a_id, a_id, "copper");
        assert!(diagram.add_connection(conn).is_err());
    }

    #[test]
    fn test_move_and_resize() {
        let a = breaker(0.0, 0.0);
        let id = a.id();
        let diagram = Diagram::new().add_component(a).unwrap();

        let moved = diagram.move_component(id, Point::new(5.0, 6.0)).unwrap();
        assert_eq!(moved.component(id).unwrap().position, Point::new(5.0, 6.0));

        let resized = moved.resize_component(id, Size::new(50.0, 60.0)).unwrap();
        assert_eq!(resized.component(id).unwrap().size, Size::new(50.0, 60.0));

        assert!(matches!(
            resized.resize_component(id, Size::new(-1.0, 60.0)),
            Err(EngineError::InvalidGeometry(_))
        ));
        assert!(matches!(
            resized.move_component(Uuid::new_v4(), Point::ZERO),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_and_clear_property() {
        let a = breaker(0.0, 0.0);
        let id = a.id();
        let diagram = Diagram::new().add_component(a).unwrap();

        let with = diagram
            .set_component_property(id, "trip_amps", Some(serde_json::json!(100)))
            .unwrap();
        assert_eq!(
            with.component(id).unwrap().property("trip_amps"),
            Some(&serde_json::json!(100))
        );

        let without = with.set_component_property(id, "trip_amps", None).unwrap();
        assert!(without.component(id).unwrap().property("trip_amps").is_none());
    }

    #[test]
    fn test_modified_updates_on_success() {
        let diagram = Diagram::new();
        let before = diagram.metadata.modified;
        let next = diagram.add_component(breaker(0.0, 0.0)).unwrap();
        assert!(next.metadata.modified >= before);
        assert_eq!(next.metadata.created, diagram.metadata.created);
    }

    #[test]
    fn test_json_roundtrip() {
        let a = breaker(1.0, 2.0).with_property("label", "CB-1");
        let b = breaker(50.0, 2.0);
        let conn = Connection::new(a.id(), b.id(), "thhn");
        let diagram = Diagram::named("Service")
            .add_component(a)
            .and_then(|d| d.add_component(b))
            .and_then(|d| d.add_connection(conn))
            .unwrap();

        let json = diagram.to_json().unwrap();
        let loaded = Diagram::from_json(&json).unwrap();
        assert_eq!(loaded, diagram);
    }

    #[test]
    fn test_from_json_rejects_dangling() {
        let a = breaker(0.0, 0.0);
        let b = breaker(50.0, 0.0);
        let b_id = b.id();
        let conn = Connection::new(a.id(), b_id, "thhn");
        let diagram = Diagram::new()
            .add_component(a)
            .and_then(|d| d.add_component(b))
            .and_then(|d| d.add_connection(conn))
            .unwrap();

        // Strip the endpoint out of the JSON by hand
        let mut value = serde_json::to_value(&diagram).unwrap();
        value["components"]
            .as_object_mut()
            .unwrap()
            .remove(&b_id.to_string());
        let json = serde_json::to_string(&value).unwrap();

        assert!(matches!(
            Diagram::from_json(&json),
            Err(EngineError::DanglingReference(_))
        ));
    }

    #[test]
    fn test_bounds() {
        let diagram = Diagram::new()
            .add_component(breaker(0.0, 0.0))
            .and_then(|d| d.add_component(breaker(100.0, 10.0)))
            .unwrap();
        assert_eq!(diagram.bounds(), Some(Rect::new(0.0, 0.0, 120.0, 50.0)));
    }
}
