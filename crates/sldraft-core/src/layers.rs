//! Layers: ordered partitions of the diagram's components.
//!
//! Layer membership lives outside the [`Diagram`] so that undo/redo never has
//! to know about layers. After every model transition the manager is
//! re-derived with [`LayerManager::sync_with`].

use crate::command::Command;
use crate::diagram::{ComponentId, Diagram};
use crate::error::{EngineError, EngineResult};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Unique identifier for a layer.
pub type LayerId = Uuid;

/// Presentation hints forwarded to the render surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    /// Stroke color override (any CSS-like string the host understands).
    pub color: Option<String>,
    /// Line weight override in world units.
    pub line_weight: Option<f64>,
}

/// A named, orderable layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    id: LayerId,
    pub name: String,
    /// Opaque grouping tag such as `"power"` or `"annotation"`.
    pub category: String,
    order: usize,
    pub visible: bool,
    pub locked: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    pub style: LayerStyle,
}

impl Layer {
    fn new(name: String, category: String, order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            category,
            order,
            visible: true,
            locked: false,
            opacity: 1.0,
            style: LayerStyle::default(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Paint and selection precedence; higher is on top.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Whether members can be hit, selected, and moved.
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.locked
    }
}

/// Where a removed component sat, so undo can put it back.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tombstone {
    layer: Option<LayerId>,
    index: usize,
}

/// Owns the layer list and the component-to-layer index.
#[derive(Debug, Clone, Default)]
pub struct LayerManager {
    /// Bottom-to-top; `layers[i].order == i`.
    layers: Vec<Layer>,
    members: HashMap<LayerId, IndexSet<ComponentId>>,
    owner: HashMap<ComponentId, LayerId>,
    /// Known components without a layer, in insertion order.
    unlayered: IndexSet<ComponentId>,
    active: Option<LayerId>,
    tombstones: HashMap<ComponentId, Tombstone>,
}

impl LayerManager {
    /// Create a manager with no layers.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Layer lifecycle ---

    /// Create a layer on top of the stack. It becomes active if none is.
    pub fn create_layer(&mut self, name: impl Into<String>, category: impl Into<String>) -> LayerId {
        let layer = Layer::new(name.into(), category.into(), self.layers.len());
        let id = layer.id;
        log::debug!("Created layer '{}' ({})", layer.name, id);
        self.layers.push(layer);
        self.members.insert(id, IndexSet::new());
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }

    /// Delete a layer.
    ///
    /// A layer that still owns components is only deleted with `force`; its
    /// members then move to the lowest remaining layer, or become unlayered.
    pub fn delete_layer(&mut self, id: LayerId, force: bool) -> EngineResult<()> {
        let index = self.index_of(id)?;
        let count = self.members.get(&id).map_or(0, IndexSet::len);
        if count > 0 && !force {
            return Err(EngineError::LayerNotEmpty {
                layer: self.layers[index].name.clone(),
                count,
            });
        }

        self.layers.remove(index);
        self.renumber();
        let orphans = self.members.remove(&id).unwrap_or_default();
        let fallback = self.layers.first().map(Layer::id);
        for component in orphans {
            self.owner.remove(&component);
            match fallback {
                Some(target) => self.insert_member(component, target),
                None => {
                    self.unlayered.insert(component);
                }
            }
        }
        for tombstone in self.tombstones.values_mut() {
            if tombstone.layer == Some(id) {
                tombstone.layer = fallback;
            }
        }
        if self.active == Some(id) {
            self.active = self.layers.last().map(Layer::id);
        }
        log::debug!("Deleted layer {} ({} member(s) reassigned)", id, count);
        Ok(())
    }

    // --- Layer properties ---

    pub fn set_visibility(&mut self, id: LayerId, visible: bool) -> EngineResult<()> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> EngineResult<()> {
        self.layer_mut(id)?.locked = locked;
        Ok(())
    }

    /// Set opacity, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) -> EngineResult<()> {
        let opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        self.layer_mut(id)?.opacity = opacity;
        Ok(())
    }

    pub fn set_style(&mut self, id: LayerId, style: LayerStyle) -> EngineResult<()> {
        self.layer_mut(id)?.style = style;
        Ok(())
    }

    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) -> EngineResult<()> {
        self.layer_mut(id)?.name = name.into();
        Ok(())
    }

    /// Make a layer the target for newly added components.
    pub fn set_active(&mut self, id: LayerId) -> EngineResult<()> {
        self.index_of(id)?;
        self.active = Some(id);
        Ok(())
    }

    /// Move the layer at `from` to position `to`, keeping the others in order.
    pub fn reorder(&mut self, from: usize, to: usize) -> EngineResult<()> {
        let len = self.layers.len();
        for index in [from, to] {
            if index >= len {
                return Err(EngineError::IndexOutOfRange { index, len });
            }
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.renumber();
        Ok(())
    }

    fn renumber(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.order = i;
        }
    }

    // --- Membership ---

    /// Put a component on a layer, removing it from its previous layer.
    pub fn assign_component(&mut self, component: ComponentId, layer: LayerId) -> EngineResult<()> {
        self.index_of(layer)?;
        self.detach(component);
        self.insert_member(component, layer);
        Ok(())
    }

    /// Take a component off its layer. Returns the layer it was on.
    pub fn unassign_component(&mut self, component: ComponentId) -> Option<LayerId> {
        let previous = self.detach(component);
        self.unlayered.insert(component);
        previous
    }

    fn insert_member(&mut self, component: ComponentId, layer: LayerId) {
        self.members.entry(layer).or_default().insert(component);
        self.owner.insert(component, layer);
    }

    /// Remove a component from whatever holds it. Returns its former layer.
    fn detach(&mut self, component: ComponentId) -> Option<LayerId> {
        self.unlayered.shift_remove(&component);
        let previous = self.owner.remove(&component)?;
        if let Some(set) = self.members.get_mut(&previous) {
            set.shift_remove(&component);
        }
        Some(previous)
    }

    /// Re-derive membership from the diagram after a model transition.
    ///
    /// Ids that disappeared leave a tombstone; ids that reappear (an undone
    /// removal) go back to their previous layer and position; ids never seen
    /// before join the active layer.
    pub fn sync_with(&mut self, diagram: &Diagram) {
        let gone: Vec<ComponentId> = self
            .owner
            .keys()
            .chain(self.unlayered.iter())
            .copied()
            .filter(|id| !diagram.contains(*id))
            .collect();
        for id in gone {
            let tombstone = match self.owner.get(&id).copied() {
                Some(layer) => Tombstone {
                    layer: Some(layer),
                    index: self.members.get(&layer).and_then(|s| s.get_index_of(&id)).unwrap_or(0),
                },
                None => Tombstone {
                    layer: None,
                    index: self.unlayered.get_index_of(&id).unwrap_or(0),
                },
            };
            self.detach(id);
            self.tombstones.insert(id, tombstone);
        }

        // Sorted so restores into the same layer keep a stable relative order
        let mut arrivals: Vec<ComponentId> = diagram
            .component_ids()
            .filter(|id| !self.owner.contains_key(id) && !self.unlayered.contains(id))
            .collect();
        arrivals.sort_by_key(|id| self.tombstones.get(id).map_or(usize::MAX, |t| t.index));

        for id in arrivals {
            match self.tombstones.remove(&id) {
                Some(Tombstone {
                    layer: Some(layer),
                    index,
                }) if self.members.contains_key(&layer) => {
                    let set = self.members.entry(layer).or_default();
                    let index = index.min(set.len());
                    set.shift_insert(index, id);
                    self.owner.insert(id, layer);
                }
                Some(Tombstone { layer: None, index }) => {
                    let index = index.min(self.unlayered.len());
                    self.unlayered.shift_insert(index, id);
                }
                _ => match self.active {
                    Some(layer) => self.insert_member(id, layer),
                    None => {
                        self.unlayered.insert(id);
                    }
                },
            }
        }
    }

    /// Forget tombstones of components no recorded command can bring back.
    pub fn retain_tombstones(&mut self, restorable: &HashSet<ComponentId>) {
        self.tombstones.retain(|id, _| restorable.contains(id));
    }

    /// Number of removed components whose layer slot is remembered.
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    /// Drop all membership and tombstones, then adopt the diagram's
    /// components into the active layer (or leave them unlayered).
    pub fn reset_membership(&mut self, diagram: &Diagram) {
        for set in self.members.values_mut() {
            set.clear();
        }
        self.owner.clear();
        self.unlayered.clear();
        self.tombstones.clear();
        self.sync_with(diagram);
    }

    // --- Queries ---

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layers bottom-to-top.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers top-to-bottom (hit-test precedence).
    pub fn layers_by_precedence(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().rev()
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_of(&self, component: ComponentId) -> Option<LayerId> {
        self.owner.get(&component).copied()
    }

    /// Members of a layer in insertion order.
    pub fn members(&self, layer: LayerId) -> Option<&IndexSet<ComponentId>> {
        self.members.get(&layer)
    }

    pub fn active(&self) -> Option<LayerId> {
        self.active
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn is_component_locked(&self, component: ComponentId) -> bool {
        self.owning_layer(component).is_some_and(|l| l.locked)
    }

    pub fn is_component_visible(&self, component: ComponentId) -> bool {
        self.owning_layer(component).is_none_or(|l| l.visible)
    }

    /// `LayerLocked` if the component sits on a locked layer.
    pub fn ensure_unlocked(&self, component: ComponentId) -> EngineResult<()> {
        match self.owning_layer(component) {
            Some(layer) if layer.locked => Err(EngineError::LayerLocked(layer.name.clone())),
            _ => Ok(()),
        }
    }

    /// `LayerLocked` if applying or reverting the command would move, resize
    /// or delete a member of a locked layer. Batches are checked child by child.
    pub fn ensure_editable(&self, command: &Command) -> EngineResult<()> {
        command
            .guarded_components()
            .into_iter()
            .try_for_each(|id| self.ensure_unlocked(id))
    }

    /// Visible and not locked.
    pub fn is_component_interactive(&self, component: ComponentId) -> bool {
        self.owning_layer(component).is_none_or(Layer::is_interactive)
    }

    /// Opacity the component is drawn with.
    pub fn component_opacity(&self, component: ComponentId) -> f64 {
        self.owning_layer(component).map_or(1.0, |l| l.opacity)
    }

    /// Component ids in hit-test order: top layer first, newest member first
    /// within a layer, unlayered components last.
    pub fn precedence_order(&self) -> Vec<ComponentId> {
        let mut order = Vec::with_capacity(self.owner.len() + self.unlayered.len());
        for layer in self.layers_by_precedence() {
            if let Some(set) = self.members.get(&layer.id) {
                order.extend(set.iter().rev().copied());
            }
        }
        order.extend(self.unlayered.iter().rev().copied());
        order
    }

    /// Component ids bottom-to-top for drawing; hidden layers are omitted.
    pub fn paint_order(&self, diagram: &Diagram) -> Vec<ComponentId> {
        let mut order: Vec<ComponentId> = self
            .unlayered
            .iter()
            .copied()
            .filter(|id| diagram.contains(*id))
            .collect();
        for layer in self.layers.iter().filter(|l| l.visible) {
            if let Some(set) = self.members.get(&layer.id) {
                order.extend(set.iter().copied().filter(|id| diagram.contains(*id)));
            }
        }
        order
    }

    fn owning_layer(&self, component: ComponentId) -> Option<&Layer> {
        self.owner.get(&component).and_then(|id| self.layer(*id))
    }

    fn index_of(&self, id: LayerId) -> EngineResult<usize> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("layer {}", id)))
    }

    fn layer_mut(&mut self, id: LayerId) -> EngineResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("layer {}", id)))
    }
}
