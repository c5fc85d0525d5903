//! Component templates and the calculation hook used when placing them.

use crate::diagram::{Component, Properties};
use crate::error::EngineResult;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A manufacturer/catalog record a component can be created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTemplate {
    /// Catalog key, e.g. `"sq-d-qo-100a"`.
    pub id: String,
    /// Component type tag written to placed components.
    pub kind: String,
    /// Size of a freshly placed component.
    pub default_size: Size,
    /// Properties copied onto placed components.
    #[serde(default)]
    pub properties: Properties,
}

impl ComponentTemplate {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, default_size: Size) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            default_size,
            properties: Properties::new(),
        }
    }

    /// Build a component with a fresh id at `position`.
    pub fn instantiate(&self, position: Point) -> Component {
        Component::new(self.kind.clone(), position, self.default_size)
            .with_properties(self.properties.clone())
            .with_property("template_id", self.id.clone())
    }
}

/// Source of component templates.
pub trait Catalog {
    /// Look up a template by id.
    fn template(&self, id: &str) -> Option<ComponentTemplate>;

    /// All known template ids.
    fn template_ids(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Computes derived ratings (load, wire size, ...) for a template about to
/// be placed. Never consulted during pointer interaction.
pub trait CalculationService {
    fn prefill(&self, template: &ComponentTemplate) -> Properties;
}

/// In-memory catalog, typically loaded from a JSON array of templates.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    templates: HashMap<String, ComponentTemplate>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template.
    pub fn insert(&mut self, template: ComponentTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Parse a JSON array of templates.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let templates: Vec<ComponentTemplate> = serde_json::from_str(json)?;
        Ok(templates.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<ComponentTemplate> for StaticCatalog {
    fn from_iter<T: IntoIterator<Item = ComponentTemplate>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for template in iter {
            catalog.insert(template);
        }
        catalog
    }
}

impl Catalog for StaticCatalog {
    fn template(&self, id: &str) -> Option<ComponentTemplate> {
        self.templates.get(id).cloned()
    }

    fn template_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.templates.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        { "id": "qo-100a", "kind": "breaker", "default_size": { "width": 20.0, "height": 40.0 },
          "properties": { "trip_amps": 100 } },
        { "id": "mdp-400", "kind": "panel", "default_size": { "width": 80.0, "height": 120.0 } }
    ]"#;

    #[test]
    fn test_from_json() {
        let catalog = StaticCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.template_ids(), vec!["mdp-400", "qo-100a"]);
        let breaker = catalog.template("qo-100a").unwrap();
        assert_eq!(breaker.kind, "breaker");
        assert!(catalog.template("missing").is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(StaticCatalog::from_json("{").is_err());
    }

    #[test]
    fn test_instantiate_copies_properties() {
        let catalog = StaticCatalog::from_json(CATALOG).unwrap();
        let template = catalog.template("qo-100a").unwrap();
        let component = template.instantiate(Point::new(40.0, 60.0));
        assert_eq!(component.kind, "breaker");
        assert_eq!(component.position, Point::new(40.0, 60.0));
        assert_eq!(component.size, Size::new(20.0, 40.0));
        assert_eq!(component.property("trip_amps"), Some(&serde_json::json!(100)));
        assert_eq!(component.property("template_id"), Some(&serde_json::json!("qo-100a")));
    }
}
