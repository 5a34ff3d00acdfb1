// Altrs Events
// Event identity, packing and the reports sent back to the UI thread

pub mod args;
pub mod id;
pub mod report;

pub use args::{ControlType, EventArgs, EventReason, EventValue};
pub use id::{EventId, EventParts, MAX_SOURCE_ID};
pub use report::{EventReport, EventType, MenuOption, ReportPayload};
