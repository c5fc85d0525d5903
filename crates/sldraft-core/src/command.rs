//! Reversible editing commands.
//!
//! A command stores plain values (never references into the diagram), so it
//! can be applied, reverted, queued by a collaborator, or serialized.

use crate::diagram::{Component, ComponentId, Connection, ConnectionId, Diagram};
use crate::error::{EngineError, EngineResult};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Position change for a single component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentMove {
    pub id: ComponentId,
    pub from: Point,
    pub to: Point,
}

/// A state transition on the diagram with a matching inverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// A component was placed.
    AddComponent { component: Component },
    /// A component was removed together with the connections touching it.
    RemoveComponent {
        component: Component,
        connections: Vec<Connection>,
    },
    /// One or more components were moved by a single gesture.
    MoveComponents { moves: Vec<ComponentMove> },
    /// A component was resized.
    ResizeComponent { id: ComponentId, from: Size, to: Size },
    /// A property was set (`Some`) or removed (`None`).
    SetProperty {
        id: ComponentId,
        key: String,
        old: Option<serde_json::Value>,
        new: Option<serde_json::Value>,
    },
    /// A connection was drawn.
    AddConnection { connection: Connection },
    /// A connection was deleted.
    RemoveConnection { connection: Connection },
    /// Several commands that undo and redo as one step.
    Batch { commands: Vec<Command> },
}

impl Command {
    /// Add a component.
    pub fn add_component(component: Component) -> Self {
        Command::AddComponent { component }
    }

    /// Add a connection.
    pub fn add_connection(connection: Connection) -> Self {
        Command::AddConnection { connection }
    }

    /// Remove a component, capturing it and its connections for undo.
    pub fn remove_component(diagram: &Diagram, id: ComponentId) -> EngineResult<Self> {
        let component = diagram
            .component(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let connections = diagram.connections_of(id).into_iter().cloned().collect();
        Ok(Command::RemoveComponent {
            component,
            connections,
        })
    }

    /// Remove several components as one batch.
    ///
    /// A connection shared by two removed components is captured once, by
    /// whichever component is removed first.
    pub fn remove_components(
        diagram: &Diagram,
        ids: impl IntoIterator<Item = ComponentId>,
    ) -> EngineResult<Self> {
        let mut seen: HashSet<ConnectionId> = HashSet::new();
        let mut commands = Vec::new();
        for id in ids {
            let component = diagram
                .component(id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
            let connections = diagram
                .connections_of(id)
                .into_iter()
                .filter(|c| seen.insert(c.id()))
                .cloned()
                .collect();
            commands.push(Command::RemoveComponent {
                component,
                connections,
            });
        }
        Ok(Command::Batch { commands })
    }

    /// Move one component to an absolute position.
    pub fn move_component(diagram: &Diagram, id: ComponentId, to: Point) -> EngineResult<Self> {
        Self::move_components(diagram, [(id, to)])
    }

    /// Move several components to absolute positions.
    pub fn move_components(
        diagram: &Diagram,
        targets: impl IntoIterator<Item = (ComponentId, Point)>,
    ) -> EngineResult<Self> {
        let moves = targets
            .into_iter()
            .map(|(id, to)| {
                diagram
                    .component(id)
                    .map(|c| ComponentMove {
                        id,
                        from: c.position,
                        to,
                    })
                    .ok_or_else(|| EngineError::NotFound(id.to_string()))
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Command::MoveComponents { moves })
    }

    /// Resize a component, capturing its current size.
    pub fn resize_component(diagram: &Diagram, id: ComponentId, to: Size) -> EngineResult<Self> {
        let from = diagram
            .component(id)
            .map(|c| c.size)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        Ok(Command::ResizeComponent { id, from, to })
    }

    /// Set or clear a property, capturing its current value.
    pub fn set_property(
        diagram: &Diagram,
        id: ComponentId,
        key: impl Into<String>,
        new: Option<serde_json::Value>,
    ) -> EngineResult<Self> {
        let key = key.into();
        let old = diagram
            .component(id)
            .map(|c| c.property(&key).cloned())
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        Ok(Command::SetProperty { id, key, old, new })
    }

    /// Remove a connection, capturing it for undo.
    pub fn remove_connection(diagram: &Diagram, id: ConnectionId) -> EngineResult<Self> {
        let connection = diagram
            .connection(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        Ok(Command::RemoveConnection { connection })
    }

    /// Apply the command, producing the next diagram.
    pub fn apply(&self, diagram: &Diagram) -> EngineResult<Diagram> {
        match self {
            Command::AddComponent { component } => diagram.add_component(component.clone()),
            Command::RemoveComponent { component, .. } => diagram.remove_component(component.id()),
            Command::MoveComponents { moves } => {
                // Start from a clone so an empty move list is still a valid result
                moves.iter().try_fold(diagram.clone(), |d, m| d.move_component(m.id, m.to))
            }
            Command::ResizeComponent { id, to, .. } => diagram.resize_component(*id, *to),
            Command::SetProperty { id, key, new, .. } => {
                diagram.set_component_property(*id, key, new.clone())
            }
            Command::AddConnection { connection } => diagram.add_connection(connection.clone()),
            Command::RemoveConnection { connection } => diagram.remove_connection(connection.id()),
            Command::Batch { commands } => commands
                .iter()
                .try_fold(diagram.clone(), |d, cmd| cmd.apply(&d)),
        }
    }

    /// Apply the inverse of the command.
    pub fn revert(&self, diagram: &Diagram) -> EngineResult<Diagram> {
        match self {
            Command::AddComponent { component } => diagram.remove_component(component.id()),
            Command::RemoveComponent {
                component,
                connections,
            } => {
                let restored = diagram.add_component(component.clone())?;
                connections
                    .iter()
                    .try_fold(restored, |d, c| d.add_connection(c.clone()))
            }
            Command::MoveComponents { moves } => moves
                .iter()
                .try_fold(diagram.clone(), |d, m| d.move_component(m.id, m.from)),
            Command::ResizeComponent { id, from, .. } => diagram.resize_component(*id, *from),
            Command::SetProperty { id, key, old, .. } => {
                diagram.set_component_property(*id, key, old.clone())
            }
            Command::AddConnection { connection } => diagram.remove_connection(connection.id()),
            Command::RemoveConnection { connection } => diagram.add_connection(connection.clone()),
            Command::Batch { commands } => commands
                .iter()
                .rev()
                .try_fold(diagram.clone(), |d, cmd| cmd.revert(&d)),
        }
    }

    /// Components whose position, size or existence this command changes,
    /// applied or reverted.
    pub fn guarded_components(&self) -> Vec<ComponentId> {
        let mut ids = Vec::new();
        self.collect_components(&mut ids, true);
        ids
    }

    /// Components this command creates or deletes, applied or reverted.
    pub fn lifecycle_components(&self) -> Vec<ComponentId> {
        let mut ids = Vec::new();
        self.collect_components(&mut ids, false);
        ids
    }

    fn collect_components(&self, ids: &mut Vec<ComponentId>, with_geometry: bool) {
        match self {
            Command::AddComponent { component } | Command::RemoveComponent { component, .. } => {
                ids.push(component.id());
            }
            Command::MoveComponents { moves } if with_geometry => {
                ids.extend(moves.iter().map(|m| m.id));
            }
            Command::ResizeComponent { id, .. } if with_geometry => ids.push(*id),
            Command::Batch { commands } => {
                for command in commands {
                    command.collect_components(ids, with_geometry);
                }
            }
            _ => {}
        }
    }

    /// Short human-readable description for menus and logs.
    pub fn label(&self) -> String {
        match self {
            Command::AddComponent { component } => format!("Add {}", component.kind),
            Command::RemoveComponent { component, .. } => format!("Remove {}", component.kind),
            Command::MoveComponents { moves } if moves.len() == 1 => "Move component".to_string(),
            Command::MoveComponents { moves } => format!("Move {} components", moves.len()),
            Command::ResizeComponent { .. } => "Resize component".to_string(),
            Command::SetProperty { key, .. } => format!("Set {}", key),
            Command::AddConnection { connection } => format!("Connect ({})", connection.kind),
            Command::RemoveConnection { .. } => "Remove connection".to_string(),
            Command::Batch { commands } => format!("{} changes", commands.len()),
        }
    }
}
