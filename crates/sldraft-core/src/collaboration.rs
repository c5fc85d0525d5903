//! Multi-participant editing session.
//!
//! Participants submit whole [`Command`]s into a FIFO queue; the editor
//! drains the queue into its single history in submission order. There is
//! no network protocol and no conflict resolution here: a queued command that
//! no longer applies is simply rejected when executed.

use crate::command::Command;
use crate::error::{EngineError, EngineResult};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Unique identifier for a participant.
pub type ParticipantId = Uuid;

/// Presence information for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Display color for the participant's cursor and selection.
    pub color: String,
    /// Last reported cursor position in world coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Point>,
}

/// A command waiting to be executed, tagged with its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub participant: ParticipantId,
    pub command: Command,
}

/// Participant registry plus the pending command queue.
#[derive(Debug, Clone, Default)]
pub struct CollaborationSession {
    /// Session (room) name, if any.
    room: Option<String>,
    participants: HashMap<ParticipantId, Participant>,
    pending: VecDeque<QueuedCommand>,
}

impl CollaborationSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for a named room.
    pub fn with_room(room: impl Into<String>) -> Self {
        Self {
            room: Some(room.into()),
            ..Self::default()
        }
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    // --- Participants ---

    /// Register a participant and return their id.
    pub fn join(&mut self, name: impl Into<String>, color: impl Into<String>) -> ParticipantId {
        let id = Uuid::new_v4();
        let participant = Participant {
            id,
            name: name.into(),
            color: color.into(),
            cursor: None,
        };
        log::info!("Participant '{}' joined ({})", participant.name, id);
        self.participants.insert(id, participant);
        id
    }

    /// Remove a participant. Commands they already queued stay queued.
    pub fn leave(&mut self, id: ParticipantId) -> Option<Participant> {
        let participant = self.participants.remove(&id);
        if let Some(p) = &participant {
            log::info!("Participant '{}' left", p.name);
        }
        participant
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// All participants, sorted by name.
    pub fn participants(&self) -> Vec<&Participant> {
        let mut list: Vec<&Participant> = self.participants.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Update a participant's cursor (`None` hides it).
    pub fn set_cursor(&mut self, id: ParticipantId, cursor: Option<Point>) -> EngineResult<()> {
        let participant = self
            .participants
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("participant {}", id)))?;
        participant.cursor = cursor;
        Ok(())
    }

    // --- Command queue ---

    /// Queue a command from a registered participant.
    pub fn submit(&mut self, participant: ParticipantId, command: Command) -> EngineResult<()> {
        if !self.participants.contains_key(&participant) {
            return Err(EngineError::NotFound(format!("participant {}", participant)));
        }
        log::debug!("Queued '{}' from {}", command.label(), participant);
        self.pending.push_back(QueuedCommand {
            participant,
            command,
        });
        Ok(())
    }

    /// Queue a command received as JSON.
    pub fn submit_json(&mut self, participant: ParticipantId, json: &str) -> EngineResult<()> {
        let command: Command = serde_json::from_str(json)?;
        self.submit(participant, command)
    }

    /// Take all pending commands in submission order (drains the queue).
    pub fn take_pending(&mut self) -> Vec<QueuedCommand> {
        self.pending.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
