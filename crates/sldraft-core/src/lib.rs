//! SLDraft Core Library
//!
//! Platform-agnostic editing engine for single-line electrical diagrams:
//! the component/connection model, reversible commands with bounded
//! undo/redo, layers, and the pointer interaction state machine.

pub mod catalog;
pub mod collaboration;
pub mod command;
pub mod config;
pub mod diagram;
pub mod editor;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod layers;
pub mod selection;
pub mod storage;
pub mod tools;
pub mod view;

pub use catalog::{CalculationService, Catalog, ComponentTemplate, StaticCatalog};
pub use collaboration::{CollaborationSession, Participant, ParticipantId, QueuedCommand};
pub use command::{Command, ComponentMove};
pub use config::{DEFAULT_GRID_SIZE, DEFAULT_HISTORY_DEPTH, EditorConfig};
pub use diagram::{Component, ComponentId, Connection, ConnectionId, Diagram, DiagramMetadata, Properties};
pub use editor::{Editor, RemoteSummary};
pub use error::{EngineError, EngineResult};
pub use frame::{ExportSnapshot, RenderFrame, RenderItem};
pub use history::History;
pub use interaction::{InteractionState, Modifiers, PointerEvent};
pub use layers::{Layer, LayerId, LayerManager, LayerStyle};
pub use selection::SelectionState;
pub use storage::{Storage, StorageError, StorageResult};
pub use tools::ToolKind;
pub use view::CanvasViewState;
