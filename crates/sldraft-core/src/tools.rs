//! Editing tools.

use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolKind {
    /// Hit test, select, drag, and rubberband select.
    #[default]
    Select,
    /// Drag to pan the view.
    Pan,
    /// Click to place a catalog template.
    Place { template_id: String },
    /// Drag from one component to another to connect them.
    /// `kind: None` uses the configured default conductor kind.
    Connect {
        #[serde(default)]
        kind: Option<String>,
    },
}

impl ToolKind {
    /// Short name for logs and toolbars.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Place { .. } => "place",
            ToolKind::Connect { .. } => "connect",
        }
    }
}

/// Tracks the current tool and the one before it.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    current: ToolKind,
    previous: Option<ToolKind>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &ToolKind {
        &self.current
    }

    /// Switch tools. Returns `false` if the tool was already active.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        if self.current == tool {
            return false;
        }
        let previous = std::mem::replace(&mut self.current, tool);
        self.previous = Some(previous);
        true
    }

    /// Return to the tool used before the last switch (e.g. after a
    /// temporary pan).
    pub fn restore_previous(&mut self) -> bool {
        match self.previous.take() {
            Some(tool) => {
                self.previous = Some(std::mem::replace(&mut self.current, tool));
                true
            }
            None => false,
        }
    }
}
