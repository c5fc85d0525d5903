//! The editor: one diagram, its history, layers, view, and interaction.
//!
//! Hosts talk to the engine through [`Editor`] only. All mutation funnels
//! through [`Editor::execute`] (or the gesture that ends in it), and every
//! model transition is followed by re-deriving layer membership and pruning
//! the selection.

use crate::catalog::{CalculationService, Catalog};
use crate::collaboration::{CollaborationSession, ParticipantId};
use crate::command::Command;
use crate::config::EditorConfig;
use crate::diagram::{Component, ComponentId, Connection, ConnectionId, Diagram};
use crate::error::{EngineError, EngineResult};
use crate::frame::{ExportSnapshot, RenderFrame};
use crate::geometry;
use crate::history::History;
use crate::interaction::{
    self, InteractionContext, InteractionController, InteractionState, Modifiers, PointerEvent,
};
use crate::layers::{LayerId, LayerManager};
use crate::selection::SelectionState;
use crate::tools::{ToolKind, ToolManager};
use crate::view::CanvasViewState;
use kurbo::{Point, Size, Vec2};

/// Layer category used for the layer created from `EditorConfig::default_layer`.
pub const DEFAULT_LAYER_CATEGORY: &str = "general";

/// Outcome of draining a collaboration session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSummary {
    /// Commands executed.
    pub applied: usize,
    /// Commands that no longer applied, with their author.
    pub rejected: Vec<(ParticipantId, EngineError)>,
}

/// A diagram editing session.
pub struct Editor {
    config: EditorConfig,
    history: History,
    layers: LayerManager,
    view: CanvasViewState,
    selection: SelectionState,
    tools: ToolManager,
    interaction: InteractionController,
    catalog: Option<Box<dyn Catalog>>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor with an empty diagram.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_diagram(Diagram::new(), config)
    }

    /// Create an editor for an existing diagram.
    ///
    /// With `config.default_layer` set, every component starts on that
    /// layer; otherwise components start unlayered.
    pub fn with_diagram(diagram: Diagram, config: EditorConfig) -> Self {
        let mut layers = LayerManager::new();
        if let Some(name) = &config.default_layer {
            layers.create_layer(name.clone(), DEFAULT_LAYER_CATEGORY);
        }
        layers.reset_membership(&diagram);

        Self {
            history: History::with_max_depth(diagram, config.max_history_depth),
            layers,
            view: CanvasViewState::new(&config),
            selection: SelectionState::new(),
            tools: ToolManager::new(),
            interaction: InteractionController::new(),
            catalog: None,
            config,
        }
    }

    /// Attach a component catalog.
    pub fn with_catalog(mut self, catalog: Box<dyn Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn set_catalog(&mut self, catalog: Option<Box<dyn Catalog>>) {
        self.catalog = catalog;
    }

    // --- Accessors ---

    /// The live diagram.
    pub fn diagram(&self) -> &Diagram {
        self.history.diagram()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Layer properties (visibility, lock, order, style) do not touch the
    /// diagram, so they are edited on the manager directly.
    pub fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    pub fn view(&self) -> &CanvasViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CanvasViewState {
        &mut self.view
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn tool(&self) -> &ToolKind {
        self.tools.current()
    }

    pub fn interaction_state(&self) -> &InteractionState {
        self.interaction.state()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // --- Commands ---

    /// Execute a command. Any gesture in progress is cancelled first, so
    /// commands built from the diagram should be built after cancelling too
    /// (the convenience edits below do this).
    ///
    /// Fails with `LayerLocked` if the command moves, resizes or removes a
    /// member of a locked layer.
    pub fn execute(&mut self, command: Command) -> EngineResult<()> {
        self.cancel_interaction()?;
        interaction::execute_checked(&mut self.history, &mut self.layers, &mut self.selection, command)
    }

    /// Undo the last command. Returns `Ok(false)` if there was nothing to undo.
    ///
    /// Undoing a command that would move, resize or remove a locked member
    /// fails with `LayerLocked` and leaves both stacks as they were.
    pub fn undo(&mut self) -> EngineResult<bool> {
        self.cancel_interaction()?;
        if let Some(command) = self.history.next_undo() {
            self.layers.ensure_editable(command)?;
        }
        let undone = self.history.undo()?;
        self.sync_derived();
        Ok(undone)
    }

    /// Redo the last undone command. Returns `Ok(false)` if there was nothing to redo.
    /// Locked members are guarded as in [`Editor::undo`].
    pub fn redo(&mut self) -> EngineResult<bool> {
        self.cancel_interaction()?;
        if let Some(command) = self.history.next_redo() {
            self.layers.ensure_editable(command)?;
        }
        let redone = self.history.redo()?;
        self.sync_derived();
        Ok(redone)
    }

    fn sync_derived(&mut self) {
        interaction::sync_derived(&self.history, &mut self.layers, &mut self.selection);
    }

    /// Replace the diagram (e.g. after loading). History and selection are
    /// dropped; layers are kept and membership is rebuilt.
    pub fn load_diagram(&mut self, diagram: Diagram) -> EngineResult<()> {
        self.cancel_interaction()?;
        log::info!(
            "Loaded diagram '{}' ({} components)",
            diagram.metadata.name,
            diagram.len()
        );
        self.history.replace_diagram(diagram);
        self.layers.reset_membership(self.history.diagram());
        self.selection.clear();
        Ok(())
    }

    // --- Convenience edits ---

    /// Add a component; it joins the active layer.
    pub fn add_component(&mut self, component: Component) -> EngineResult<ComponentId> {
        let id = component.id();
        self.execute(Command::add_component(component))?;
        Ok(id)
    }

    /// Remove a component and its connections.
    pub fn remove_component(&mut self, id: ComponentId) -> EngineResult<()> {
        self.cancel_interaction()?;
        let command = Command::remove_component(self.diagram(), id)?;
        self.execute(command)
    }

    /// Remove every selected component on an unlocked layer as one undo step.
    /// Returns how many were removed.
    pub fn remove_selected(&mut self) -> EngineResult<usize> {
        self.cancel_interaction()?;
        let ids: Vec<ComponentId> = self
            .selection
            .iter()
            .filter(|id| !self.layers.is_component_locked(*id))
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let count = ids.len();
        let command = Command::remove_components(self.diagram(), ids)?;
        self.execute(command)?;
        Ok(count)
    }

    /// Connect two components. `kind: None` uses the configured default.
    pub fn connect(
        &mut self,
        from: ComponentId,
        to: ComponentId,
        kind: Option<&str>,
    ) -> EngineResult<ConnectionId> {
        let kind = kind.unwrap_or(self.config.default_connection_kind.as_str()).to_string();
        let connection = Connection::new(from, to, kind);
        let id = connection.id();
        self.execute(Command::add_connection(connection))?;
        Ok(id)
    }

    /// Remove a connection.
    pub fn disconnect(&mut self, id: ConnectionId) -> EngineResult<()> {
        self.cancel_interaction()?;
        let command = Command::remove_connection(self.diagram(), id)?;
        self.execute(command)
    }

    /// Move the selection by `delta` world units as one undo step.
    ///
    /// Fails with `LayerLocked` if any selected component is locked. The
    /// delta is clamped so nothing leaves the non-negative canvas area.
    pub fn nudge_selected(&mut self, delta: Vec2) -> EngineResult<()> {
        self.cancel_interaction()?;
        let ids: Vec<ComponentId> = self.selection.iter().collect();
        for id in &ids {
            self.layers.ensure_unlocked(*id)?;
        }
        let origins: Vec<(ComponentId, Point)> = ids
            .into_iter()
            .filter_map(|id| self.diagram().component(id).map(|c| (id, c.position)))
            .collect();
        let delta = geometry::clamp_group_delta(origins.iter().map(|(_, p)| *p), delta);
        if origins.is_empty() || delta == Vec2::ZERO {
            return Ok(());
        }
        let command = Command::move_components(
            self.diagram(),
            origins.into_iter().map(|(id, p)| (id, p + delta)),
        )?;
        self.execute(command)
    }

    /// Set (`Some`) or remove (`None`) a component property.
    pub fn set_property(
        &mut self,
        id: ComponentId,
        key: &str,
        value: Option<serde_json::Value>,
    ) -> EngineResult<()> {
        self.cancel_interaction()?;
        let command = Command::set_property(self.diagram(), id, key, value)?;
        self.execute(command)
    }

    /// Resize a component.
    pub fn resize_component(&mut self, id: ComponentId, size: Size) -> EngineResult<()> {
        self.cancel_interaction()?;
        let command = Command::resize_component(self.diagram(), id, size)?;
        self.execute(command)
    }

    /// Place a catalog template with its top-left at `position` (world).
    ///
    /// The calculation service, if given, fills in derived properties on top
    /// of the template's own. The new component becomes the selection.
    pub fn place_from_catalog(
        &mut self,
        template_id: &str,
        position: Point,
        calculator: Option<&dyn CalculationService>,
    ) -> EngineResult<ComponentId> {
        let template = self
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.template(template_id))
            .ok_or_else(|| EngineError::UnknownTemplate(template_id.to_string()))?;
        let position = geometry::clamp_non_negative(self.view.snap(position));
        let mut component = template.instantiate(position);
        if let Some(calculator) = calculator {
            component.properties.extend(calculator.prefill(&template));
        }
        let id = self.add_component(component)?;
        self.selection.select_only(id);
        Ok(id)
    }

    // --- Layers ---

    /// Create a layer on top of the stack.
    pub fn create_layer(&mut self, name: &str, category: &str) -> LayerId {
        self.layers.create_layer(name, category)
    }

    /// Delete a layer (see [`LayerManager::delete_layer`]).
    pub fn delete_layer(&mut self, id: LayerId, force: bool) -> EngineResult<()> {
        self.cancel_interaction()?;
        self.layers.delete_layer(id, force)
    }

    /// Move a component to a layer.
    pub fn assign_to_layer(&mut self, component: ComponentId, layer: LayerId) -> EngineResult<()> {
        if !self.diagram().contains(component) {
            return Err(EngineError::NotFound(component.to_string()));
        }
        self.layers.assign_component(component, layer)
    }

    // --- Pointer input ---

    fn with_interaction<R>(
        &mut self,
        f: impl FnOnce(&mut InteractionController, &mut InteractionContext<'_>) -> R,
    ) -> R {
        let mut ctx = InteractionContext {
            history: &mut self.history,
            layers: &mut self.layers,
            selection: &mut self.selection,
            view: &mut self.view,
            tool: self.tools.current(),
            config: &self.config,
            catalog: self.catalog.as_deref(),
        };
        f(&mut self.interaction, &mut ctx)
    }

    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) -> EngineResult<()> {
        self.with_interaction(|controller, ctx| controller.pointer_down(ctx, screen, modifiers))
    }

    pub fn pointer_move(&mut self, screen: Point) -> EngineResult<()> {
        self.with_interaction(|controller, ctx| controller.pointer_move(ctx, screen))
    }

    pub fn pointer_up(&mut self, screen: Point) -> EngineResult<()> {
        self.with_interaction(|controller, ctx| controller.pointer_up(ctx, screen))
    }

    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> EngineResult<()> {
        match event {
            PointerEvent::Down { position, modifiers } => self.pointer_down(position, modifiers),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position } => self.pointer_up(position),
        }
    }

    /// Abandon the gesture in progress, restoring any previewed drag.
    pub fn cancel_interaction(&mut self) -> EngineResult<()> {
        if self.interaction.is_idle() {
            return Ok(());
        }
        self.with_interaction(|controller, ctx| controller.cancel(ctx))
    }

    /// Switch tools, cancelling any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolKind) -> EngineResult<()> {
        self.cancel_interaction()?;
        if self.tools.set_tool(tool) {
            log::debug!("Tool -> {}", self.tools.current().name());
        }
        Ok(())
    }

    // --- Selection ---

    /// Select every visible component on an unlocked layer.
    pub fn select_all(&mut self) {
        let ids: Vec<ComponentId> = self
            .layers
            .precedence_order()
            .into_iter()
            .filter(|id| self.diagram().contains(*id) && self.layers.is_component_interactive(*id))
            .collect();
        self.selection.replace(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // --- Outputs ---

    /// Borrowed view of everything to draw this frame.
    pub fn frame(&self) -> RenderFrame<'_> {
        RenderFrame::build(
            self.history.diagram(),
            &self.layers,
            &self.selection,
            &self.view,
            &self.interaction,
        )
    }

    /// Owned copy of the diagram and view for exporters.
    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            diagram: self.history.diagram().clone(),
            view: self.view.clone(),
        }
    }

    /// Execute every queued remote command in submission order.
    ///
    /// Rejected commands are logged and reported; they never stop the drain.
    pub fn submit_remote(&mut self, session: &mut CollaborationSession) -> EngineResult<RemoteSummary> {
        self.cancel_interaction()?;
        let mut summary = RemoteSummary::default();
        for queued in session.take_pending() {
            let label = queued.command.label();
            let result = interaction::execute_checked(
                &mut self.history,
                &mut self.layers,
                &mut self.selection,
                queued.command,
            );
            match result {
                Ok(()) => summary.applied += 1,
                Err(err) => {
                    log::warn!("Remote '{}' from {} rejected: {}", label, queued.participant, err);
                    summary.rejected.push((queued.participant, err));
                }
            }
        }
        Ok(summary)
    }
}
