// Altrs Action Mapping Table
// Event id -> action list, in insertion order

use indexmap::IndexMap;

use crate::event::EventId;

use super::list::ActionList;

/// Action lists keyed by packed event id.
///
/// Keys are unique; iteration follows insertion order so merges and
/// persistence are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionMappingTable {
    lists: IndexMap<EventId, ActionList>,
}

impl ActionMappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn get(&self, id: EventId) -> Option<&ActionList> {
        self.lists.get(&id)
    }

    pub fn get_mut(&mut self, id: EventId) -> Option<&mut ActionList> {
        self.lists.get_mut(&id)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.lists.contains_key(&id)
    }

    /// Insert a list under its own event id, replacing any previous one.
    ///
    /// Empty lists are not stored; inserting one removes the mapping.
    pub fn insert(&mut self, list: ActionList) -> Option<ActionList> {
        let id = list.event_id();
        if list.is_empty() {
            return self.lists.shift_remove(&id);
        }
        self.lists.insert(id, list)
    }

    pub fn remove(&mut self, id: EventId) -> Option<ActionList> {
        self.lists.shift_remove(&id)
    }

    /// Keep only the lists `keep` accepts, returning how many were dropped
    pub fn retain(&mut self, mut keep: impl FnMut(&ActionList) -> bool) -> usize {
        let before = self.lists.len();
        self.lists.retain(|_, list| keep(list));
        before - self.lists.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventId, &ActionList)> {
        self.lists.iter().map(|(id, list)| (*id, list))
    }

    pub fn lists(&self) -> impl Iterator<Item = &ActionList> {
        self.lists.values()
    }

    pub fn lists_mut(&mut self) -> impl Iterator<Item = &mut ActionList> {
        self.lists.values_mut()
    }

    pub fn event_ids(&self) -> impl Iterator<Item = EventId> + '_ {
        self.lists.keys().copied()
    }

    /// Overlay `other` onto this table; entries in `other` win
    pub fn merge_from(&mut self, other: &ActionMappingTable) {
        for (id, list) in &other.lists {
            self.lists.insert(*id, list.clone());
        }
    }
}

impl FromIterator<ActionList> for ActionMappingTable {
    fn from_iter<I: IntoIterator<Item = ActionList>>(iter: I) -> Self {
        let mut table = Self::new();
        for list in iter {
            table.insert(list);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, ExecutionMode};
    use crate::event::{ControlType, EventArgs, EventReason};
    use crate::key::Key;
    use crate::state::LogicalState;

    fn list(code: u32, reason: EventReason, state: LogicalState) -> ActionList {
        ActionList::new(
            state,
            EventArgs::new(1, ControlType::Keyboard, code, reason),
            ExecutionMode::Parallel,
        )
        .with_action(ActionKind::TapKey { key: Key::from(30) })
    }

    #[test]
    fn test_insert_replaces_same_event() {
        let mut table = ActionMappingTable::new();
        table.insert(list(57, EventReason::Pressed, LogicalState::ALL));
        let previous = table.insert(list(57, EventReason::Pressed, LogicalState::new(1, -1, -1)));
        assert!(previous.is_some());
        assert_eq!(table.len(), 1);

        table.insert(list(57, EventReason::Released, LogicalState::ALL));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_insert_empty_removes() {
        let mut table = ActionMappingTable::new();
        let full = list(57, EventReason::Pressed, LogicalState::ALL);
        let id = full.event_id();
        table.insert(full);

        let empty = ActionList::new(
            LogicalState::ALL,
            EventArgs::new(1, ControlType::Keyboard, 57, EventReason::Pressed),
            ExecutionMode::Series,
        );
        table.insert(empty);
        assert!(!table.contains(id));
        assert!(table.is_empty());
    }

    #[test]
    fn test_merge_prefers_other() {
        let specific = LogicalState::new(2, -1, -1);
        let mut base: ActionMappingTable = vec![
            list(57, EventReason::Pressed, LogicalState::ALL),
            list(30, EventReason::Pressed, LogicalState::ALL),
        ]
        .into_iter()
        .collect();
        let overlay: ActionMappingTable =
            std::iter::once(list(57, EventReason::Pressed, specific)).collect();

        base.merge_from(&overlay);
        assert_eq!(base.len(), 2);
        let id = EventArgs::new(1, ControlType::Keyboard, 57, EventReason::Pressed).event_id();
        assert_eq!(base.get(id).map(|l| l.state()), Some(specific));
    }

    #[test]
    fn test_retain_counts_dropped() {
        let mut table: ActionMappingTable = vec![
            list(57, EventReason::Pressed, LogicalState::ALL),
            list(30, EventReason::Pressed, LogicalState::ALL),
            list(31, EventReason::Pressed, LogicalState::ALL),
        ]
        .into_iter()
        .collect();
        let dropped = table.retain(|l| l.event().control_data != 30);
        assert_eq!(dropped, 1);
        assert_eq!(table.event_ids().count(), 2);
    }
}
