// Altrs Engine
// The polling loop and the mailboxes that connect it to the UI thread

pub mod state_manager;
pub mod thread_manager;

pub use state_manager::StateManager;
pub use thread_manager::{ConfigUpdates, ThreadManager, MAX_SUBMITTED_EVENTS};
