// Altrs Core Library
// State/action resolution engine for input remapping profiles

pub mod action;
pub mod config;
pub mod engine;
pub mod event;
pub mod ids;
pub mod item;
pub mod key;
pub mod output;
pub mod profile;
pub mod security;
pub mod source;
pub mod state;
pub mod window;

pub use action::{ActionKind, ActionList, ActionMappingTable, ExecutionMode};
pub use config::{AppConfig, ConfigError};
pub use engine::{StateManager, ThreadManager};
pub use event::{
    ControlType, EventArgs, EventId, EventReason, EventReport, EventType, ReportPayload,
};
pub use ids::{ItemId, DEFAULT_ID, LAST_USED_ID, NEXT_ID, NONE_ID, PREVIOUS_ID};
pub use item::{AppItem, ItemChange, Named, NamedItem, NamedItemList};
pub use key::{Key, MouseButton};
pub use output::{InputSimulator, LogSimulator, RecordingSimulator};
pub use profile::{Profile, ProfileError, RegionShape, ScreenRegion};
pub use security::{CommandDecision, CommandRule};
pub use source::{InputBackend, InputSource, ManualBackend, SourceSpec, SourceType};
pub use state::LogicalState;
pub use window::{Point, Rect, WindowCondition, WindowInfo};
