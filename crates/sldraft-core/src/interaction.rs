//! Pointer interaction state machine.
//!
//! Raw pointer events arrive in screen coordinates. The controller hit tests
//! against the diagram (filtered by layer visibility and lock), updates the
//! selection, and drives one gesture at a time. Completed gestures become a
//! single [`Command`] executed through the [`History`].

use crate::catalog::Catalog;
use crate::command::{Command, ComponentMove};
use crate::config::EditorConfig;
use crate::diagram::{ComponentId, Connection, Diagram};
use crate::error::{EngineError, EngineResult};
use crate::geometry;
use crate::history::History;
use crate::layers::LayerManager;
use crate::selection::SelectionState;
use crate::tools::ToolKind;
use crate::view::CanvasViewState;
use indexmap::IndexMap;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Keyboard modifiers relevant to selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Shift/Ctrl-click: toggle membership instead of replacing the selection.
    #[serde(default)]
    pub additive: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { additive: false };
    pub const ADDITIVE: Modifiers = Modifiers { additive: true };
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
}

/// An in-progress drag of one or more components.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// The component under the pointer when the drag started.
    pub anchor: ComponentId,
    /// World point of the pointer-down.
    pub start_pointer: Point,
    /// Start position of every dragged component.
    pub starts: IndexMap<ComponentId, Point>,
    /// Pointer position minus component position, per dragged component.
    pub offsets: IndexMap<ComponentId, Vec2>,
    /// Delta currently previewed on the diagram.
    pub delta: Vec2,
    /// Whether the press carried the additive modifier.
    pub additive: bool,
}

impl DragSession {
    fn targets(&self, delta: Vec2) -> impl Iterator<Item = (ComponentId, Point)> + '_ {
        self.starts.iter().map(move |(id, start)| (*id, *start + delta))
    }

    fn has_moved(&self) -> bool {
        self.delta != Vec2::ZERO
    }
}

/// An in-progress rubberband selection, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubberbandSession {
    pub start: Point,
    pub current: Point,
    pub additive: bool,
}

impl RubberbandSession {
    /// Normalized selection rect.
    pub fn rect(&self) -> Rect {
        geometry::rect_from_corners(self.start, self.current)
    }
}

/// An in-progress view pan, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanSession {
    pub last_screen: Point,
}

/// An in-progress connection drag.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectSession {
    pub from: ComponentId,
    pub start: Point,
    pub current: Point,
    pub kind: String,
}

/// Interaction states. Hit testing happens synchronously inside
/// pointer-down, so it never shows up here.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(DragSession),
    Rubberband(RubberbandSession),
    Panning(PanSession),
    Connecting(ConnectSession),
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Dragging(_) => "dragging",
            InteractionState::Rubberband(_) => "rubberband",
            InteractionState::Panning(_) => "panning",
            InteractionState::Connecting(_) => "connecting",
        }
    }
}

/// Mutable editor state a gesture may touch.
pub(crate) struct InteractionContext<'a> {
    pub history: &'a mut History,
    pub layers: &'a mut LayerManager,
    pub selection: &'a mut SelectionState,
    pub view: &'a mut CanvasViewState,
    pub tool: &'a ToolKind,
    pub config: &'a EditorConfig,
    pub catalog: Option<&'a dyn Catalog>,
}

impl InteractionContext<'_> {
    fn execute(&mut self, command: Command) -> EngineResult<()> {
        execute_checked(self.history, self.layers, self.selection, command)
    }
}

/// Execute a command unless it touches a locked layer's members, then
/// re-derive layers and selection.
pub(crate) fn execute_checked(
    history: &mut History,
    layers: &mut LayerManager,
    selection: &mut SelectionState,
    command: Command,
) -> EngineResult<()> {
    layers.ensure_editable(&command).inspect_err(|err| {
        log::warn!("Rejected '{}': {}", command.label(), err);
    })?;
    history.execute(command)?;
    sync_derived(history, layers, selection);
    Ok(())
}

/// Re-derive layer membership and prune the selection after the diagram
/// changed. Tombstones of components that left the history are dropped.
pub(crate) fn sync_derived(history: &History, layers: &mut LayerManager, selection: &mut SelectionState) {
    layers.sync_with(history.diagram());
    layers.retain_tombstones(&history.restorable_components());
    selection.prune(history.diagram());
}

/// Topmost interactive component under a world point.
///
/// Layers are tested top to bottom, newest member first; each bounding rect
/// is inflated by `tolerance` world units.
pub fn hit_test(
    diagram: &Diagram,
    layers: &LayerManager,
    point: Point,
    tolerance: f64,
) -> Option<ComponentId> {
    layers
        .precedence_order()
        .into_iter()
        .filter(|id| layers.is_component_interactive(*id))
        .find(|id| {
            diagram.component(*id).is_some_and(|c| {
                geometry::rect_contains_point(c.bounds().inflate(tolerance, tolerance), point)
            })
        })
}

/// Every interactive component whose bounds overlap `rect`, in hit-test order.
pub fn components_in_rect(diagram: &Diagram, layers: &LayerManager, rect: Rect) -> Vec<ComponentId> {
    layers
        .precedence_order()
        .into_iter()
        .filter(|id| layers.is_component_interactive(*id))
        .filter(|id| {
            diagram
                .component(*id)
                .is_some_and(|c| geometry::rect_intersects(c.bounds(), rect))
        })
        .collect()
}

/// Drives gestures from pointer events.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    /// Current rubberband rect in world coordinates, if one is being drawn.
    pub fn rubberband_rect(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::Rubberband(session) => Some(session.rect()),
            _ => None,
        }
    }

    /// Start and current point of a connection being drawn.
    pub fn connect_preview(&self) -> Option<(Point, Point)> {
        match &self.state {
            InteractionState::Connecting(session) => Some((session.start, session.current)),
            _ => None,
        }
    }

    fn enter(&mut self, state: InteractionState) {
        if self.state.name() != state.name() {
            log::debug!("Interaction {} -> {}", self.state.name(), state.name());
        }
        self.state = state;
    }

    pub(crate) fn pointer_down(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        screen: Point,
        modifiers: Modifiers,
    ) -> EngineResult<()> {
        if !self.is_idle() {
            self.cancel(ctx)?;
        }
        let world = ctx.view.to_world(screen);
        let tool = ctx.tool;

        match tool {
            ToolKind::Select => self.begin_select(ctx, world, modifiers),
            ToolKind::Pan => {
                self.enter(InteractionState::Panning(PanSession { last_screen: screen }));
                Ok(())
            }
            ToolKind::Place { template_id } => place(ctx, template_id, world),
            ToolKind::Connect { kind } => {
                let tolerance = ctx.config.hit_tolerance / ctx.view.zoom;
                if let Some(from) = hit_test(ctx.history.diagram(), ctx.layers, world, tolerance) {
                    let kind = kind
                        .clone()
                        .unwrap_or_else(|| ctx.config.default_connection_kind.clone());
                    self.enter(InteractionState::Connecting(ConnectSession {
                        from,
                        start: world,
                        current: world,
                        kind,
                    }));
                }
                Ok(())
            }
        }
    }

    fn begin_select(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        world: Point,
        modifiers: Modifiers,
    ) -> EngineResult<()> {
        let tolerance = ctx.config.hit_tolerance / ctx.view.zoom;
        let diagram = ctx.history.diagram();

        let Some(hit) = hit_test(diagram, ctx.layers, world, tolerance) else {
            if !modifiers.additive {
                ctx.selection.clear();
            }
            self.enter(InteractionState::Rubberband(RubberbandSession {
                start: world,
                current: world,
                additive: modifiers.additive,
            }));
            return Ok(());
        };

        let selected = if modifiers.additive {
            ctx.selection.toggle(hit)
        } else {
            if !ctx.selection.contains(hit) {
                ctx.selection.select_only(hit);
            }
            true
        };
        if !selected {
            return Ok(());
        }

        let mut starts = IndexMap::new();
        let mut offsets = IndexMap::new();
        for id in ctx.selection.iter() {
            if !ctx.layers.is_component_interactive(id) {
                continue;
            }
            if let Some(component) = diagram.component(id) {
                starts.insert(id, component.position);
                offsets.insert(id, world - component.position);
            }
        }
        self.enter(InteractionState::Dragging(DragSession {
            anchor: hit,
            start_pointer: world,
            starts,
            offsets,
            delta: Vec2::ZERO,
            additive: modifiers.additive,
        }));
        Ok(())
    }

    pub(crate) fn pointer_move(&mut self, ctx: &mut InteractionContext<'_>, screen: Point) -> EngineResult<()> {
        let world = ctx.view.to_world(screen);
        match &mut self.state {
            InteractionState::Idle => Ok(()),
            InteractionState::Dragging(session) => {
                let delta = drag_delta(session, ctx.view, world);
                if delta == session.delta {
                    return Ok(());
                }
                let command = Command::move_components(ctx.history.diagram(), session.targets(delta))?;
                ctx.history.preview(&command)?;
                session.delta = delta;
                Ok(())
            }
            InteractionState::Rubberband(session) => {
                session.current = world;
                Ok(())
            }
            InteractionState::Panning(session) => {
                ctx.view.pan_by_screen(screen - session.last_screen);
                session.last_screen = screen;
                Ok(())
            }
            InteractionState::Connecting(session) => {
                session.current = world;
                Ok(())
            }
        }
    }

    pub(crate) fn pointer_up(&mut self, ctx: &mut InteractionContext<'_>, screen: Point) -> EngineResult<()> {
        if self.is_idle() {
            return Ok(());
        }
        self.pointer_move(ctx, screen)?;
        let world = ctx.view.to_world(screen);
        let state = std::mem::take(&mut self.state);
        log::debug!("Interaction {} -> idle", state.name());

        match state {
            InteractionState::Idle | InteractionState::Panning(_) => Ok(()),
            InteractionState::Dragging(session) => {
                if !session.has_moved() {
                    // A plain click inside a multi-selection narrows it to the clicked component
                    if !session.additive {
                        ctx.selection.select_only(session.anchor);
                    }
                    return Ok(());
                }
                let moves = session
                    .starts
                    .iter()
                    .map(|(id, start)| ComponentMove {
                        id: *id,
                        from: *start,
                        to: *start + session.delta,
                    })
                    .collect();
                let result = ctx.execute(Command::MoveComponents { moves });
                if result.is_err() {
                    revert_preview(ctx, &session)?;
                }
                result
            }
            InteractionState::Rubberband(session) => {
                let rect = session.rect();
                if rect.area() <= 0.0 {
                    return Ok(());
                }
                let hits = components_in_rect(ctx.history.diagram(), ctx.layers, rect);
                if session.additive {
                    ctx.selection.extend(hits);
                } else {
                    ctx.selection.replace(hits);
                }
                Ok(())
            }
            InteractionState::Connecting(session) => {
                let tolerance = ctx.config.hit_tolerance / ctx.view.zoom;
                match hit_test(ctx.history.diagram(), ctx.layers, world, tolerance) {
                    Some(to) if to != session.from => {
                        ctx.execute(Command::add_connection(Connection::new(session.from, to, session.kind)))
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    /// Abandon the current gesture. A previewed drag is moved back to its
    /// start positions; nothing is recorded.
    pub(crate) fn cancel(&mut self, ctx: &mut InteractionContext<'_>) -> EngineResult<()> {
        let state = std::mem::take(&mut self.state);
        if let InteractionState::Dragging(session) = &state {
            revert_preview(ctx, session)?;
        }
        if !matches!(state, InteractionState::Idle) {
            log::debug!("Cancelled {} gesture", state.name());
        }
        Ok(())
    }
}

/// Shared delta for every dragged component.
///
/// The anchor's target is snapped, then the delta is clamped so no dragged
/// component ends up at a negative coordinate.
fn drag_delta(session: &DragSession, view: &CanvasViewState, pointer: Point) -> Vec2 {
    let (Some(start), Some(offset)) = (
        session.starts.get(&session.anchor),
        session.offsets.get(&session.anchor),
    ) else {
        return Vec2::ZERO;
    };
    let target = view.snap(pointer - *offset);
    geometry::clamp_group_delta(session.starts.values().copied(), target - *start)
}

fn revert_preview(ctx: &mut InteractionContext<'_>, session: &DragSession) -> EngineResult<()> {
    if !session.has_moved() {
        return Ok(());
    }
    let present: Vec<(ComponentId, Point)> = session
        .starts
        .iter()
        .filter(|(id, _)| ctx.history.diagram().contains(**id))
        .map(|(id, start)| (*id, *start))
        .collect();
    let command = Command::move_components(ctx.history.diagram(), present)?;
    ctx.history.preview(&command)
}

fn place(ctx: &mut InteractionContext<'_>, template_id: &str, world: Point) -> EngineResult<()> {
    let template = ctx
        .catalog
        .and_then(|catalog| catalog.template(template_id))
        .ok_or_else(|| EngineError::UnknownTemplate(template_id.to_string()))?;
    let component = template.instantiate(ctx.view.snap(world));
    let id = component.id();
    ctx.execute(Command::add_component(component))?;
    ctx.selection.select_only(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::Component;
    use kurbo::Size;

    /// Owned editor parts for driving the controller directly.
    struct Fixture {
        history: History,
        layers: LayerManager,
        selection: SelectionState,
        view: CanvasViewState,
        tool: ToolKind,
        config: EditorConfig,
        controller: InteractionController,
    }

    impl Fixture {
        fn new(components: Vec<Component>) -> Self {
            let mut diagram = Diagram::new();
            for c in components {
                diagram = diagram.add_component(c).unwrap();
            }
            let mut layers = LayerManager::new();
            layers.create_layer("Default", "power");
            layers.sync_with(&diagram);
            Self {
                history: History::new(diagram),
                layers,
                selection: SelectionState::new(),
                view: CanvasViewState::default(),
                tool: ToolKind::Select,
                config: EditorConfig::default(),
                controller: InteractionController::new(),
            }
        }

        fn with_ctx<R>(
            &mut self,
            f: impl FnOnce(&mut InteractionController, &mut InteractionContext<'_>) -> R,
        ) -> R {
            let mut ctx = InteractionContext {
                history: &mut self.history,
                layers: &mut self.layers,
                selection: &mut self.selection,
                view: &mut self.view,
                tool: &self.tool,
                config: &self.config,
                catalog: None,
            };
            f(&mut self.controller, &mut ctx)
        }

        fn down(&mut self, x: f64, y: f64, modifiers: Modifiers) {
            self.with_ctx(|c, ctx| c.pointer_down(ctx, Point::new(x, y), modifiers))
                .unwrap();
        }

        fn moved(&mut self, x: f64, y: f64) {
            self.with_ctx(|c, ctx| c.pointer_move(ctx, Point::new(x, y))).unwrap();
        }

        fn up(&mut self, x: f64, y: f64) {
            self.with_ctx(|c, ctx| c.pointer_up(ctx, Point::new(x, y))).unwrap();
        }

        fn position(&self, id: ComponentId) -> Point {
            self.history.diagram().component(id).unwrap().position
        }
    }

    fn square(x: f64, y: f64) -> Component {
        Component::new("panel", Point::new(x, y), Size::new(10.0, 10.0))
    }

    #[test]
    fn test_click_selects_and_enters_drag() {
        let c = square(0.0, 0.0);
        let id = c.id();
        let mut fx = Fixture::new(vec![c]);

        fx.down(5.0, 5.0, Modifiers::NONE);
        assert!(fx.selection.contains(id));
        assert!(matches!(fx.controller.state(), InteractionState::Dragging(_)));

        fx.up(5.0, 5.0);
        assert!(fx.controller.is_idle());
        // A click without movement records nothing
        assert_eq!(fx.history.undo_len(), 0);
    }

    #[test]
    fn test_click_in_multi_selection_narrows_on_release() {
        let a = square(0.0, 0.0);
        let b = square(40.0, 0.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut fx = Fixture::new(vec![a, b]);
        fx.selection.replace([a_id, b_id]);

        // The group survives the press so it can still be dragged
        fx.down(5.0, 5.0, Modifiers::NONE);
        assert_eq!(fx.selection.len(), 2);

        fx.up(5.0, 5.0);
        assert_eq!(fx.selection.len(), 1);
        assert!(fx.selection.contains(a_id));
        assert!(!fx.selection.contains(b_id));
        assert_eq!(fx.history.undo_len(), 0);
    }

    #[test]
    fn test_group_drag_preserves_layout() {
        let a = square(0.0, 0.0);
        let b = square(20.0, 0.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut fx = Fixture::new(vec![a, b]);
        fx.selection.replace([a_id, b_id]);

        fx.down(5.0, 5.0, Modifiers::NONE);
        fx.moved(8.0, 8.0);
        fx.moved(10.0, 10.0);
        fx.up(10.0, 10.0);

        assert_eq!(fx.position(a_id), Point::new(5.0, 5.0));
        assert_eq!(fx.position(b_id), Point::new(25.0, 5.0));
        // One gesture, one undo step
        assert_eq!(fx.history.undo_len(), 1);
        fx.history.undo().unwrap();
        assert_eq!(fx.position(a_id), Point::new(0.0, 0.0));
        assert_eq!(fx.position(b_id), Point::new(20.0, 0.0));
    }

    #[test]
    fn test_drag_snaps_anchor_to_grid() {
        let c = square(0.0, 0.0);
        let id = c.id();
        let mut fx = Fixture::new(vec![c]);
        fx.view.set_snap_to_grid(true);

        fx.down(0.0, 0.0, Modifiers::NONE);
        fx.moved(27.0, 33.0);
        fx.up(27.0, 33.0);
        assert_eq!(fx.position(id), Point::new(20.0, 40.0));
    }

    #[test]
    fn test_drag_clamps_to_canvas() {
        let a = square(5.0, 5.0);
        let b = square(30.0, 30.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut fx = Fixture::new(vec![a, b]);
        fx.selection.replace([a_id, b_id]);

        fx.down(35.0, 35.0, Modifiers::NONE);
        fx.moved(0.0, 0.0);
        fx.up(0.0, 0.0);
        assert_eq!(fx.position(a_id), Point::new(0.0, 0.0));
        assert_eq!(fx.position(b_id), Point::new(25.0, 25.0));
    }

    #[test]
    fn test_cancel_mid_drag_restores_positions() {
        let c = square(0.0, 0.0);
        let id = c.id();
        let mut fx = Fixture::new(vec![c]);

        fx.down(5.0, 5.0, Modifiers::NONE);
        fx.moved(50.0, 50.0);
        assert_eq!(fx.position(id), Point::new(45.0, 45.0));

        fx.with_ctx(|c, ctx| c.cancel(ctx)).unwrap();
        assert_eq!(fx.position(id), Point::ZERO);
        assert!(fx.controller.is_idle());
        assert_eq!(fx.history.undo_len(), 0);
    }

    #[test]
    fn test_locked_member_not_dragged() {
        let a = square(0.0, 0.0);
        let b = square(40.0, 0.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut fx = Fixture::new(vec![a, b]);
        let locked = fx.layers.create_layer("Locked", "power");
        fx.layers.assign_component(b_id, locked).unwrap();
        fx.layers.set_locked(locked, true).unwrap();
        fx.selection.replace([a_id, b_id]);

        fx.down(5.0, 5.0, Modifiers::NONE);
        fx.moved(15.0, 15.0);
        fx.up(15.0, 15.0);

        assert_eq!(fx.position(a_id), Point::new(10.0, 10.0));
        assert_eq!(fx.position(b_id), Point::new(40.0, 0.0));
        // The recorded command only covers the unlocked component
        assert_eq!(fx.history.undo_label().as_deref(), Some("Move component"));
    }

    #[test]
    fn test_locked_component_is_not_hit() {
        let c = square(0.0, 0.0);
        let id = c.id();
        let mut fx = Fixture::new(vec![c]);
        let layer = fx.layers.layer_of(id).unwrap();
        fx.layers.set_locked(layer, true).unwrap();

        fx.down(5.0, 5.0, Modifiers::NONE);
        assert!(matches!(fx.controller.state(), InteractionState::Rubberband(_)));
        fx.moved(50.0, 50.0);
        fx.up(50.0, 50.0);
        assert!(fx.selection.is_empty());
        assert_eq!(fx.history.undo_len(), 0);
    }

    #[test]
    fn test_additive_click_toggles() {
        let a = square(0.0, 0.0);
        let b = square(40.0, 0.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut fx = Fixture::new(vec![a, b]);

        fx.down(5.0, 5.0, Modifiers::NONE);
        fx.up(5.0, 5.0);
        fx.down(45.0, 5.0, Modifiers::ADDITIVE);
        fx.up(45.0, 5.0);
        assert_eq!(fx.selection.len(), 2);

        fx.down(5.0, 5.0, Modifiers::ADDITIVE);
        assert!(fx.controller.is_idle());
        assert!(!fx.selection.contains(a_id));
        assert!(fx.selection.contains(b_id));
    }

    #[test]
    fn test_rubberband_order_independent() {
        let a = square(20.0, 20.0);
        let b = square(200.0, 200.0);
        let a_id = a.id();
        let mut fx = Fixture::new(vec![a, b]);

        fx.down(10.0, 10.0, Modifiers::NONE);
        fx.up(50.0, 50.0);
        let forward: Vec<_> = fx.selection.iter().collect();

        fx.selection.clear();
        fx.down(50.0, 50.0, Modifiers::NONE);
        fx.up(10.0, 10.0);
        let backward: Vec<_> = fx.selection.iter().collect();

        assert_eq!(forward, vec![a_id]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_zero_area_rubberband_selects_nothing() {
        let c = square(0.0, 0.0);
        let mut fx = Fixture::new(vec![c]);
        fx.down(10.0, 30.0, Modifiers::NONE);
        fx.up(10.0, 30.0);
        assert!(fx.selection.is_empty());
        // Degenerate in one axis only
        fx.down(0.0, 30.0, Modifiers::NONE);
        fx.up(50.0, 30.0);
        assert!(fx.selection.is_empty());
    }

    #[test]
    fn test_additive_rubberband_unions() {
        let a = square(0.0, 0.0);
        let b = square(100.0, 100.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut fx = Fixture::new(vec![a, b]);
        fx.selection.select_only(a_id);

        fx.down(90.0, 90.0, Modifiers::ADDITIVE);
        fx.up(120.0, 120.0);
        assert!(fx.selection.contains(a_id));
        assert!(fx.selection.contains(b_id));
    }

    #[test]
    fn test_pan_tool() {
        let mut fx = Fixture::new(vec![]);
        fx.tool = ToolKind::Pan;
        fx.down(100.0, 100.0, Modifiers::NONE);
        fx.moved(110.0, 90.0);
        fx.up(110.0, 90.0);
        assert_eq!(fx.view.pan, Point::new(-10.0, 10.0));
    }

    #[test]
    fn test_connect_tool() {
        let a = square(0.0, 0.0);
        let b = square(40.0, 0.0);
        let (a_id, b_id) = (a.id(), b.id());
        let mut fx = Fixture::new(vec![a, b]);
        fx.tool = ToolKind::Connect { kind: None };

        fx.down(5.0, 5.0, Modifiers::NONE);
        assert!(fx.controller.connect_preview().is_some());
        fx.moved(30.0, 5.0);
        fx.up(45.0, 5.0);

        let diagram = fx.history.diagram();
        let conns = diagram.connections_of(a_id);
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].to, b_id);
        assert_eq!(conns[0].kind, "conductor");
    }

    #[test]
    fn test_pointer_up_while_idle_is_ignored() {
        let mut fx = Fixture::new(vec![square(0.0, 0.0)]);
        fx.up(5.0, 5.0);
        assert!(fx.controller.is_idle());
        assert!(fx.selection.is_empty());
    }

    #[test]
    fn test_hit_tolerance_scales_with_zoom() {
        let c = square(0.0, 0.0);
        let id = c.id();
        let mut fx = Fixture::new(vec![c]);
        fx.config.hit_tolerance = 4.0;
        fx.view.set_zoom(2.0);

        // Screen (21, 5) is world (10.5, 2.5): half a unit outside, within 2 units of slack
        fx.down(21.0, 5.0, Modifiers::NONE);
        assert!(fx.selection.contains(id));
    }

    #[test]
    fn test_place_without_catalog_fails() {
        let mut fx = Fixture::new(vec![]);
        fx.tool = ToolKind::Place {
            template_id: "qo-100a".to_string(),
        };
        let result = fx.with_ctx(|c, ctx| c.pointer_down(ctx, Point::ZERO, Modifiers::NONE));
        assert!(matches!(result, Err(EngineError::UnknownTemplate(_))));
    }
}
