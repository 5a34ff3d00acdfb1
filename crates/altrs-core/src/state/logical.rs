// Altrs Logical State
// The (mode, app, page) triple that decides which action mappings apply

use std::fmt;

use crate::ids::{ItemId, DEFAULT_ID};

/// Current situation of the user: which mode, application and page are active.
///
/// Any field may hold [`DEFAULT_ID`], in which case the state acts as a
/// wildcard for that field. Mapping entries are keyed by such (possibly
/// wildcarded) states and matched against the concrete current state with
/// [`LogicalState::contains`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalState {
    pub mode_id: ItemId,
    pub app_id: ItemId,
    pub page_id: ItemId,
}

impl LogicalState {
    /// The fully wildcarded state, matching every situation
    pub const ALL: LogicalState = LogicalState {
        mode_id: DEFAULT_ID,
        app_id: DEFAULT_ID,
        page_id: DEFAULT_ID,
    };

    /// Create a new logical state
    pub fn new(mode_id: ItemId, app_id: ItemId, page_id: ItemId) -> Self {
        Self {
            mode_id,
            app_id,
            page_id,
        }
    }

    /// Check whether `other` falls within this state.
    ///
    /// True iff every field of `self` is either the wildcard or equal to the
    /// corresponding field of `other`.
    pub fn contains(&self, other: &LogicalState) -> bool {
        field_contains(self.mode_id, other.mode_id)
            && field_contains(self.app_id, other.app_id)
            && field_contains(self.page_id, other.page_id)
    }

    /// Number of non-wildcard fields
    pub fn concrete_fields(&self) -> u8 {
        [self.mode_id, self.app_id, self.page_id]
            .iter()
            .filter(|id| **id != DEFAULT_ID)
            .count() as u8
    }

    /// Merge precedence of a mapping entry keyed by this state.
    ///
    /// Higher wins. Entries with more concrete fields always beat entries with
    /// fewer; among entries with the same count a concrete page beats a
    /// concrete app, which beats a concrete mode.
    pub fn specificity(&self) -> u8 {
        let mut score = self.concrete_fields() << 3;
        if self.page_id != DEFAULT_ID {
            score |= 0b100;
        }
        if self.app_id != DEFAULT_ID {
            score |= 0b010;
        }
        if self.mode_id != DEFAULT_ID {
            score |= 0b001;
        }
        score
    }

    pub fn with_mode(self, mode_id: ItemId) -> Self {
        Self { mode_id, ..self }
    }

    pub fn with_app(self, app_id: ItemId) -> Self {
        Self { app_id, ..self }
    }

    pub fn with_page(self, page_id: ItemId) -> Self {
        Self { page_id, ..self }
    }
}

impl Default for LogicalState {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for LogicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={} app={} page={}",
            self.mode_id, self.app_id, self.page_id
        )
    }
}

fn field_contains(outer: ItemId, inner: ItemId) -> bool {
    outer == DEFAULT_ID || outer == inner
}
