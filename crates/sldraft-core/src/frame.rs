//! Read-only views handed to the render surface and to exporters.

use crate::diagram::{Component, ComponentId, Connection, Diagram};
use crate::geometry;
use crate::interaction::InteractionController;
use crate::layers::{LayerId, LayerManager, LayerStyle};
use crate::selection::SelectionState;
use crate::view::CanvasViewState;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One component to draw.
#[derive(Debug, Clone)]
pub struct RenderItem<'a> {
    pub component: &'a Component,
    pub layer: Option<LayerId>,
    pub opacity: f64,
    pub style: Option<&'a LayerStyle>,
    pub selected: bool,
}

/// Everything the render surface needs for one frame, bottom-to-top.
#[derive(Debug, Clone)]
pub struct RenderFrame<'a> {
    pub view: &'a CanvasViewState,
    /// Visible components intersecting the viewport, in paint order.
    pub items: Vec<RenderItem<'a>>,
    /// Connections whose endpoints are both on visible layers.
    pub connections: Vec<&'a Connection>,
    /// Rubberband rectangle in world coordinates.
    pub rubberband: Option<Rect>,
    /// Connection being drawn, in world coordinates.
    pub connect_preview: Option<(Point, Point)>,
}

impl<'a> RenderFrame<'a> {
    pub(crate) fn build(
        diagram: &'a Diagram,
        layers: &'a LayerManager,
        selection: &'a SelectionState,
        view: &'a CanvasViewState,
        interaction: &InteractionController,
    ) -> Self {
        let visible_rect = view.visible_world_rect();
        let painted = layers.paint_order(diagram);
        let painted_set: HashSet<ComponentId> = painted.iter().copied().collect();

        let items = painted
            .into_iter()
            .filter_map(|id| diagram.component(id))
            .filter(|c| geometry::rect_intersects(c.bounds(), visible_rect))
            .map(|component| {
                let layer = layers.layer_of(component.id());
                RenderItem {
                    component,
                    layer,
                    opacity: layers.component_opacity(component.id()),
                    style: layer.and_then(|id| layers.layer(id)).map(|l| &l.style),
                    selected: selection.contains(component.id()),
                }
            })
            .collect();

        let connections = diagram
            .connections()
            .filter(|c| painted_set.contains(&c.from) && painted_set.contains(&c.to))
            .collect();

        Self {
            view,
            items,
            connections,
            rubberband: interaction.rubberband_rect(),
            connect_preview: interaction.connect_preview(),
        }
    }

    /// Bounds of the selected items in this frame.
    pub fn selection_bounds(&self) -> Option<Rect> {
        geometry::bounds_union(
            self.items
                .iter()
                .filter(|item| item.selected)
                .map(|item| item.component.bounds()),
        )
    }
}

/// Owned copy of the diagram plus the view it was exported from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub diagram: Diagram,
    pub view: CanvasViewState,
}

impl ExportSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    #[test]
    fn test_frame_culls_and_hides() {
        let near = Component::new("panel", Point::new(10.0, 10.0), Size::new(10.0, 10.0));
        let far = Component::new("panel", Point::new(5000.0, 5000.0), Size::new(10.0, 10.0));
        let hidden = Component::new("note", Point::new(30.0, 10.0), Size::new(10.0, 10.0));
        let (near_id, hidden_id) = (near.id(), hidden.id());
        let diagram = Diagram::new()
            .add_component(near)
            .and_then(|d| d.add_component(far))
            .and_then(|d| d.add_component(hidden))
            .unwrap();

        let mut layers = LayerManager::new();
        layers.create_layer("Power", "power");
        layers.sync_with(&diagram);
        let notes = layers.create_layer("Notes", "annotation");
        layers.assign_component(hidden_id, notes).unwrap();
        layers.set_visibility(notes, false).unwrap();

        let mut selection = SelectionState::new();
        selection.select_only(near_id);
        let view = CanvasViewState::default();
        let interaction = InteractionController::new();

        let frame = RenderFrame::build(&diagram, &layers, &selection, &view, &interaction);
        assert_eq!(frame.items.len(), 1);
        assert_eq!(frame.items[0].component.id(), near_id);
        assert!(frame.items[0].selected);
        assert_eq!(frame.selection_bounds(), Some(Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(frame.rubberband.is_none());
    }

    #[test]
    fn test_connections_to_hidden_layers_are_skipped() {
        let a = Component::new("panel", Point::ZERO, Size::new(10.0, 10.0));
        let b = Component::new("panel", Point::new(40.0, 0.0), Size::new(10.0, 10.0));
        let b_id = b.id();
        let conn = Connection::new(a.id(), b_id, "thhn");
        let diagram = Diagram::new()
            .add_component(a)
            .and_then(|d| d.add_component(b))
            .and_then(|d| d.add_connection(conn))
            .unwrap();

        let mut layers = LayerManager::new();
        let base = layers.create_layer("Base", "power");
        layers.sync_with(&diagram);
        let selection = SelectionState::new();
        let view = CanvasViewState::default();
        let interaction = InteractionController::new();

        let frame = RenderFrame::build(&diagram, &layers, &selection, &view, &interaction);
        assert_eq!(frame.connections.len(), 1);

        layers.set_visibility(base, false).unwrap();
        let frame = RenderFrame::build(&diagram, &layers, &selection, &view, &interaction);
        assert!(frame.connections.is_empty());
        assert!(frame.items.is_empty());
    }
}
