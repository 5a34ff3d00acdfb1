//! Window context module
//!
//! Active window identity, app-matching rules and the geometry shared by
//! the pointer, screen regions and window tracking.

mod geometry;
mod info;

pub use geometry::{Point, Rect};
pub use info::{ConditionParseError, WindowCondition, WindowInfo, WindowPattern};
