//! The set of selected components.

use crate::diagram::{ComponentId, Diagram};
use indexmap::IndexSet;

/// Ordered set of selected component ids, oldest selection first.
///
/// Transient editor state: never serialized with the diagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    ids: IndexSet<ComponentId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single component.
    pub fn select_only(&mut self, id: ComponentId) {
        self.ids.clear();
        self.ids.insert(id);
    }

    /// Replace the selection with the given components.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        self.ids.clear();
        self.ids.extend(ids);
    }

    /// Add components, keeping existing ones.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        self.ids.extend(ids);
    }

    /// Add or remove one component. Returns whether it is now selected.
    pub fn toggle(&mut self, id: ComponentId) -> bool {
        if self.ids.shift_remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn remove(&mut self, id: ComponentId) -> bool {
        self.ids.shift_remove(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Selected ids in selection order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.ids.iter().copied()
    }

    /// Drop ids that no longer exist in the diagram.
    pub fn prune(&mut self, diagram: &Diagram) {
        self.ids.retain(|id| diagram.contains(*id));
    }
}
