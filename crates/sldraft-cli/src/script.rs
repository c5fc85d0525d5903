//! Interaction scripts: a JSON array of steps replayed against an editor.
//!
//! Components created by a script can be given an alias; any step that takes
//! a component accepts either an alias or a component id.

use std::collections::HashMap;

use kurbo::{Point, Size, Vec2};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sldraft_core::{
    Component, ComponentId, Editor, EngineError, EngineResult, LayerId, Modifiers, Properties,
    ToolKind,
};

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        additive: bool,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
    },
    SetTool {
        tool: ToolKind,
    },
    Undo,
    Redo,
    AddComponent {
        #[serde(default)]
        alias: Option<String>,
        kind: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default)]
        properties: Properties,
    },
    Connect {
        from: String,
        to: String,
        #[serde(default)]
        kind: Option<String>,
    },
    SetProperty {
        component: String,
        key: String,
        #[serde(default)]
        value: Option<serde_json::Value>,
    },
    CreateLayer {
        name: String,
        #[serde(default)]
        category: String,
    },
    AssignLayer {
        component: String,
        layer: String,
    },
    SetLayerLocked {
        layer: String,
        locked: bool,
    },
    SetLayerVisible {
        layer: String,
        visible: bool,
    },
    ZoomAt {
        x: f64,
        y: f64,
        factor: f64,
    },
    Pan {
        dx: f64,
        dy: f64,
    },
    SetSnap {
        enabled: bool,
    },
    SelectAll,
    DeleteSelected,
    Nudge {
        dx: f64,
        dy: f64,
    },
    Place {
        template: String,
        x: f64,
        y: f64,
        #[serde(default)]
        alias: Option<String>,
    },
}

impl ScriptStep {
    /// Action name as written in the script.
    pub fn action(&self) -> &'static str {
        match self {
            ScriptStep::PointerDown { .. } => "pointer_down",
            ScriptStep::PointerMove { .. } => "pointer_move",
            ScriptStep::PointerUp { .. } => "pointer_up",
            ScriptStep::SetTool { .. } => "set_tool",
            ScriptStep::Undo => "undo",
            ScriptStep::Redo => "redo",
            ScriptStep::AddComponent { .. } => "add_component",
            ScriptStep::Connect { .. } => "connect",
            ScriptStep::SetProperty { .. } => "set_property",
            ScriptStep::CreateLayer { .. } => "create_layer",
            ScriptStep::AssignLayer { .. } => "assign_layer",
            ScriptStep::SetLayerLocked { .. } => "set_layer_locked",
            ScriptStep::SetLayerVisible { .. } => "set_layer_visible",
            ScriptStep::ZoomAt { .. } => "zoom_at",
            ScriptStep::Pan { .. } => "pan",
            ScriptStep::SetSnap { .. } => "set_snap",
            ScriptStep::SelectAll => "select_all",
            ScriptStep::DeleteSelected => "delete_selected",
            ScriptStep::Nudge { .. } => "nudge",
            ScriptStep::Place { .. } => "place",
        }
    }
}

/// A step that failed during replay.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub index: usize,
    pub action: &'static str,
    pub error: EngineError,
}

/// Summary of a replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub steps: usize,
    pub failures: Vec<StepFailure>,
}

impl ReplayReport {
    pub fn succeeded(&self) -> usize {
        self.steps - self.failures.len()
    }
}

/// Replays steps against an editor, remembering component aliases.
#[derive(Debug, Default)]
pub struct Replayer {
    aliases: HashMap<String, ComponentId>,
}

impl Replayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every step. A failing step is logged and recorded, and replay
    /// continues with the next one.
    pub fn replay(&mut self, editor: &mut Editor, steps: &[ScriptStep]) -> ReplayReport {
        let mut report = ReplayReport {
            steps: steps.len(),
            failures: Vec::new(),
        };
        for (index, step) in steps.iter().enumerate() {
            debug!("Step {}: {}", index, step.action());
            if let Err(error) = self.apply(editor, step) {
                warn!("Step {} ({}) failed: {}", index, step.action(), error);
                report.failures.push(StepFailure {
                    index,
                    action: step.action(),
                    error,
                });
            }
        }
        report
    }

    /// Resolve an alias or a component id.
    pub fn resolve(&self, reference: &str) -> EngineResult<ComponentId> {
        if let Some(id) = self.aliases.get(reference) {
            return Ok(*id);
        }
        reference
            .parse::<ComponentId>()
            .map_err(|_| EngineError::NotFound(format!("component '{}'", reference)))
    }

    fn remember(&mut self, alias: &Option<String>, id: ComponentId) {
        if let Some(alias) = alias {
            self.aliases.insert(alias.clone(), id);
        }
    }

    fn layer(editor: &Editor, name: &str) -> EngineResult<LayerId> {
        editor
            .layers()
            .layer_by_name(name)
            .map(|layer| layer.id())
            .ok_or_else(|| EngineError::NotFound(format!("layer '{}'", name)))
    }

    fn apply(&mut self, editor: &mut Editor, step: &ScriptStep) -> EngineResult<()> {
        match step {
            ScriptStep::PointerDown { x, y, additive } => {
                let modifiers = Modifiers {
                    additive: *additive,
                };
                editor.pointer_down(Point::new(*x, *y), modifiers)
            }
            ScriptStep::PointerMove { x, y } => editor.pointer_move(Point::new(*x, *y)),
            ScriptStep::PointerUp { x, y } => editor.pointer_up(Point::new(*x, *y)),
            ScriptStep::SetTool { tool } => editor.set_tool(tool.clone()),
            ScriptStep::Undo => editor.undo().map(|_| ()),
            ScriptStep::Redo => editor.redo().map(|_| ()),
            ScriptStep::AddComponent {
                alias,
                kind,
                x,
                y,
                width,
                height,
                properties,
            } => {
                let component =
                    Component::new(kind.clone(), Point::new(*x, *y), Size::new(*width, *height))
                        .with_properties(properties.clone());
                let id = editor.add_component(component)?;
                self.remember(alias, id);
                Ok(())
            }
            ScriptStep::Connect { from, to, kind } => {
                let (from, to) = (self.resolve(from)?, self.resolve(to)?);
                editor.connect(from, to, kind.as_deref()).map(|_| ())
            }
            ScriptStep::SetProperty {
                component,
                key,
                value,
            } => {
                let id = self.resolve(component)?;
                editor.set_property(id, key, value.clone())
            }
            ScriptStep::CreateLayer { name, category } => {
                editor.create_layer(name, category);
                Ok(())
            }
            ScriptStep::AssignLayer { component, layer } => {
                let id = self.resolve(component)?;
                let layer = Self::layer(editor, layer)?;
                editor.assign_to_layer(id, layer)
            }
            ScriptStep::SetLayerLocked { layer, locked } => {
                let layer = Self::layer(editor, layer)?;
                editor.layers_mut().set_locked(layer, *locked)
            }
            ScriptStep::SetLayerVisible { layer, visible } => {
                let layer = Self::layer(editor, layer)?;
                editor.layers_mut().set_visibility(layer, *visible)
            }
            ScriptStep::ZoomAt { x, y, factor } => {
                editor.view_mut().zoom_at(Point::new(*x, *y), *factor);
                Ok(())
            }
            ScriptStep::Pan { dx, dy } => {
                editor.view_mut().pan_by_screen(Vec2::new(*dx, *dy));
                Ok(())
            }
            ScriptStep::SetSnap { enabled } => {
                editor.view_mut().set_snap_to_grid(*enabled);
                Ok(())
            }
            ScriptStep::SelectAll => {
                editor.select_all();
                Ok(())
            }
            ScriptStep::DeleteSelected => editor.remove_selected().map(|_| ()),
            ScriptStep::Nudge { dx, dy } => editor.nudge_selected(Vec2::new(*dx, *dy)),
            ScriptStep::Place {
                template,
                x,
                y,
                alias,
            } => {
                let id = editor.place_from_catalog(template, Point::new(*x, *y), None)?;
                self.remember(alias, id);
                Ok(())
            }
        }
    }
}

/// Parse a script from JSON.
pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    serde_json::from_str(json)
}
