// Altrs State
// Logical state tracking

pub mod logical;

pub use logical::LogicalState;
