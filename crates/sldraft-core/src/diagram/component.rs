//! Placed diagram components.

use super::{ComponentId, Properties};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A placed element on the single-line diagram (breaker, panel, meter, ...).
///
/// The `kind` tag and `properties` are opaque to the engine; they only mean
/// something to the catalog and to calculation collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub(crate) id: ComponentId,
    /// Catalog type tag, e.g. `"breaker"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Top-left corner in world coordinates.
    pub position: Point,
    /// Extent in world units; both sides must be positive.
    pub size: Size,
    /// Ratings, labels, and other attributes.
    #[serde(default)]
    pub properties: Properties,
}

impl Component {
    /// Create a component with a fresh id.
    pub fn new(kind: impl Into<String>, position: Point, size: Size) -> Self {
        Self::with_id(Uuid::new_v4(), kind, position, size)
    }

    /// Create a component with a known id (loading, collaboration, tests).
    pub fn with_id(id: ComponentId, kind: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id,
            kind: kind.into(),
            position,
            size,
            properties: Properties::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Builder-style bulk property setter.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    /// The component's unique id.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Axis-aligned bounding rect in world coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Look up a property value.
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    pub(crate) fn has_valid_size(&self) -> bool {
        is_valid_size(self.size)
    }
}

/// Both sides strictly positive and finite.
pub(crate) fn is_valid_size(size: Size) -> bool {
    size.width > 0.0 && size.height > 0.0 && size.width.is_finite() && size.height.is_finite()
}
