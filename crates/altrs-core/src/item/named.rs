// Altrs Named Items
// Id + name records for modes, apps, pages and sources

use crate::ids::ItemId;
use crate::security::CommandDecision;
use crate::window::{ConditionParseError, WindowCondition, WindowInfo};

/// Common access to items stored in a [`NamedItemList`](super::NamedItemList)
pub trait Named {
    fn id(&self) -> ItemId;
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

/// Notification produced by an explicit mutation of a named item.
///
/// Mutations never notify implicitly; callers forward the returned value to
/// whoever displays the items.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemChange {
    Added { id: ItemId, name: String },
    Removed { id: ItemId },
    Renamed { id: ItemId, old_name: String, new_name: String },
    SnoozeChanged { id: ItemId, snooze: bool },
    RuleChanged { id: ItemId, rule: Option<String> },
    DecisionChanged { id: ItemId, decision: CommandDecision },
}

impl ItemChange {
    /// Id of the item the change applies to
    pub fn id(&self) -> ItemId {
        match self {
            ItemChange::Added { id, .. }
            | ItemChange::Removed { id }
            | ItemChange::Renamed { id, .. }
            | ItemChange::SnoozeChanged { id, .. }
            | ItemChange::RuleChanged { id, .. }
            | ItemChange::DecisionChanged { id, .. } => *id,
        }
    }
}

/// Plain id + name item (modes, pages)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedItem {
    id: ItemId,
    name: String,
}

impl NamedItem {
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Named for NamedItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// An application situation.
///
/// The rule decides which focused windows belong to this app; `snooze`
/// suppresses every action while the app is focused.
#[derive(Debug, Clone, PartialEq)]
pub struct AppItem {
    id: ItemId,
    name: String,
    rule: Option<WindowCondition>,
    snooze: bool,
}

impl AppItem {
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rule: None,
            snooze: false,
        }
    }

    /// Attach a window rule parsed from its text form
    pub fn with_rule(mut self, rule: &str) -> Result<Self, ConditionParseError> {
        self.rule = Some(WindowCondition::parse(rule)?);
        Ok(self)
    }

    pub fn with_snooze(mut self, snooze: bool) -> Self {
        self.snooze = snooze;
        self
    }

    pub fn rule(&self) -> Option<&WindowCondition> {
        self.rule.as_ref()
    }

    pub fn snooze(&self) -> bool {
        self.snooze
    }

    /// Change the snooze flag, reporting a change only if it differs
    pub fn set_snooze(&mut self, snooze: bool) -> Option<ItemChange> {
        if self.snooze == snooze {
            return None;
        }
        self.snooze = snooze;
        Some(ItemChange::SnoozeChanged { id: self.id, snooze })
    }

    /// Replace the window rule. An empty string clears it.
    pub fn set_rule(&mut self, rule: &str) -> Result<ItemChange, ConditionParseError> {
        self.rule = if rule.trim().is_empty() {
            None
        } else {
            Some(WindowCondition::parse(rule)?)
        };
        Ok(ItemChange::RuleChanged {
            id: self.id,
            rule: self.rule.as_ref().map(|r| r.to_string()),
        })
    }

    /// Check whether a focused window belongs to this app
    pub fn matches(&self, window: &WindowInfo) -> bool {
        self.rule
            .as_ref()
            .is_some_and(|rule| window.matches_condition(rule))
    }
}

impl Named for AppItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
