// Altrs Actions Module
// Action kinds, action lists and the event -> list mapping table

pub mod context;
pub mod kind;
pub mod list;
pub mod table;

pub use context::{ActionContext, ActionError, ActionOutput, StateRequest};
pub use kind::{Action, ActionKind};
pub use list::{ActionList, ExecutionMode};
pub use table::ActionMappingTable;
