//! Undo/redo history that owns the live diagram.

use crate::command::Command;
use crate::config::DEFAULT_HISTORY_DEPTH;
use crate::diagram::{ComponentId, Diagram};
use crate::error::EngineResult;
use std::collections::{HashSet, VecDeque};

/// Executes commands against the live diagram and records them for undo.
#[derive(Debug, Clone)]
pub struct History {
    diagram: Diagram,
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Diagram::new())
    }
}

impl History {
    /// Create a history with the default depth.
    pub fn new(diagram: Diagram) -> Self {
        Self::with_max_depth(diagram, DEFAULT_HISTORY_DEPTH)
    }

    /// Create a history keeping at most `max_depth` undoable commands.
    pub fn with_max_depth(diagram: Diagram, max_depth: usize) -> Self {
        Self {
            diagram,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// The live diagram.
    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// Maximum number of undoable commands.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Apply a command and record it. On error nothing changes.
    pub fn execute(&mut self, command: Command) -> EngineResult<()> {
        let next = command.apply(&self.diagram).inspect_err(|err| {
            log::warn!("Rejected '{}': {}", command.label(), err);
        })?;
        log::debug!("Executed '{}'", command.label());
        self.diagram = next;
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
        Ok(())
    }

    /// Undo the last command. Returns `Ok(false)` if there was nothing to undo.
    pub fn undo(&mut self) -> EngineResult<bool> {
        let Some(command) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        match command.revert(&self.diagram) {
            Ok(previous) => {
                log::debug!("Undid '{}'", command.label());
                self.diagram = previous;
                self.redo_stack.push(command);
                Ok(true)
            }
            Err(err) => {
                self.undo_stack.push_back(command);
                Err(err)
            }
        }
    }

    /// Redo the last undone command. Returns `Ok(false)` if there was nothing to redo.
    pub fn redo(&mut self) -> EngineResult<bool> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match command.apply(&self.diagram) {
            Ok(next) => {
                log::debug!("Redid '{}'", command.label());
                self.diagram = next;
                self.undo_stack.push_back(command);
                Ok(true)
            }
            Err(err) => {
                self.redo_stack.push(command);
                Err(err)
            }
        }
    }

    /// Apply a command to the live diagram without recording it.
    ///
    /// Only for transient feedback (live drag); the gesture must later commit
    /// a command carrying the same absolute values, or revert the preview.
    pub fn preview(&mut self, command: &Command) -> EngineResult<()> {
        self.diagram = command.apply(&self.diagram)?;
        Ok(())
    }

    /// The command `undo` would revert.
    pub fn next_undo(&self) -> Option<&Command> {
        self.undo_stack.back()
    }

    /// The command `redo` would re-apply.
    pub fn next_redo(&self) -> Option<&Command> {
        self.redo_stack.last()
    }

    /// Ids of components created or deleted by any command still on either
    /// stack.
    pub fn restorable_components(&self) -> HashSet<ComponentId> {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .flat_map(Command::lifecycle_components)
            .collect()
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the command `undo` would revert.
    pub fn undo_label(&self) -> Option<String> {
        self.undo_stack.back().map(Command::label)
    }

    /// Label of the command `redo` would re-apply.
    pub fn redo_label(&self) -> Option<String> {
        self.redo_stack.last().map(Command::label)
    }

    /// Replace the live diagram (e.g. after loading) and drop all history.
    pub fn replace_diagram(&mut self, diagram: Diagram) {
        self.diagram = diagram;
        self.clear_history();
    }

    /// Drop both stacks.
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
