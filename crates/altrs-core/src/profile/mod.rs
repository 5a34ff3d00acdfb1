// Altrs Profile
// Input sources, situations, screen regions and the master action mappings

mod region;
mod xml;

use std::collections::BTreeMap;
use std::path::Path;

use crate::action::{ActionList, ActionMappingTable};
use crate::event::{ControlType, EventId, MAX_SOURCE_ID};
use crate::ids::{is_concrete, ItemId, DEFAULT_ID};
use crate::item::{AppItem, Named, NamedItem, NamedItemList};
use crate::source::{SourceSpec, SourceType};
use crate::state::LogicalState;
use crate::window::WindowInfo;

pub use region::{RegionShape, ScreenRegion};
pub use xml::PROFILE_VERSION;

/// Errors that can occur when loading, saving or checking a profile
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Unsupported profile version {0} (newest known is {PROFILE_VERSION})")]
    UnsupportedVersion(u32),

    #[error("Invalid attribute {name}: {reason}")]
    InvalidAttribute { name: String, reason: String },

    #[error("Invalid profile: {0}")]
    Validation(String),
}

/// Everything the engine needs to know about one user's setup.
///
/// After any structural edit (removing a mode, app, page, source or region)
/// call [`validate`](Self::validate) to prune mappings that now dangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    name: String,
    sources: NamedItemList<SourceSpec>,
    modes: NamedItemList<NamedItem>,
    apps: NamedItemList<AppItem>,
    pages: NamedItemList<NamedItem>,
    regions: NamedItemList<ScreenRegion>,
    mappings: BTreeMap<LogicalState, ActionMappingTable>,
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("New profile")
    }
}

impl Profile {
    /// A profile with a mouse and keyboard source, one mode and one page
    pub fn new(name: impl Into<String>) -> Self {
        let mut profile = Self::empty(name);
        profile
            .sources
            .add(SourceSpec::new(1, "Mouse", SourceType::Mouse));
        profile
            .sources
            .add(SourceSpec::new(2, "Keyboard", SourceType::Keyboard));
        profile.modes.add(NamedItem::new(1, "Default mode"));
        profile.pages.add(NamedItem::new(1, "Default page"));
        profile
    }

    /// A profile holding only the wildcard situations
    pub fn empty(name: impl Into<String>) -> Self {
        let mut profile = Self {
            name: name.into(),
            sources: NamedItemList::new(),
            modes: NamedItemList::new(),
            apps: NamedItemList::new(),
            pages: NamedItemList::new(),
            regions: NamedItemList::new(),
            mappings: BTreeMap::new(),
        };
        profile.modes.add(NamedItem::new(DEFAULT_ID, "Any mode"));
        profile.apps.add(AppItem::new(DEFAULT_ID, "Any app"));
        profile.pages.add(NamedItem::new(DEFAULT_ID, "Any page"));
        profile
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn sources(&self) -> &NamedItemList<SourceSpec> {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut NamedItemList<SourceSpec> {
        &mut self.sources
    }

    pub fn modes(&self) -> &NamedItemList<NamedItem> {
        &self.modes
    }

    pub fn modes_mut(&mut self) -> &mut NamedItemList<NamedItem> {
        &mut self.modes
    }

    pub fn apps(&self) -> &NamedItemList<AppItem> {
        &self.apps
    }

    pub fn apps_mut(&mut self) -> &mut NamedItemList<AppItem> {
        &mut self.apps
    }

    pub fn pages(&self) -> &NamedItemList<NamedItem> {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut NamedItemList<NamedItem> {
        &mut self.pages
    }

    pub fn regions(&self) -> &NamedItemList<ScreenRegion> {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> &mut NamedItemList<ScreenRegion> {
        &mut self.regions
    }

    /// Stored tables keyed by the state they were defined under
    pub fn mappings(&self) -> &BTreeMap<LogicalState, ActionMappingTable> {
        &self.mappings
    }

    /// Store a list under its own state and event, replacing any previous one
    pub fn add_action_list(&mut self, list: ActionList) {
        let state = list.state();
        let table = self.mappings.entry(state).or_default();
        table.insert(list);
        if table.is_empty() {
            self.mappings.remove(&state);
        }
    }

    pub fn remove_action_list(&mut self, state: &LogicalState, id: EventId) -> Option<ActionList> {
        let table = self.mappings.get_mut(state)?;
        let removed = table.remove(id);
        if table.is_empty() {
            self.mappings.remove(state);
        }
        removed
    }

    /// The list stored for exactly `state` (no wildcard fallback)
    pub fn action_list(&self, state: &LogicalState, id: EventId) -> Option<&ActionList> {
        self.mappings.get(state)?.get(id)
    }

    /// Effective mappings for `state`.
    ///
    /// Every stored table whose state contains `state` takes part. Tables are
    /// overlaid from least to most specific, so per event the list defined
    /// with the most concrete fields wins; ties go to the table that names a
    /// page, then an app, then a mode.
    pub fn get_actions_for_state(&self, state: &LogicalState) -> ActionMappingTable {
        let mut matching: Vec<(&LogicalState, &ActionMappingTable)> = self
            .mappings
            .iter()
            .filter(|(key, _)| key.contains(state))
            .collect();
        matching.sort_by_key(|(key, _)| key.specificity());

        let mut effective = ActionMappingTable::new();
        for (_, table) in matching {
            effective.merge_from(table);
        }
        for list in effective.lists_mut() {
            list.set_active(true);
        }
        effective
    }

    /// State the engine starts in: first real mode and page, any app
    pub fn initial_state(&self) -> LogicalState {
        let first = |ids: Vec<ItemId>| ids.first().copied().unwrap_or(DEFAULT_ID);
        LogicalState::new(
            first(self.modes.positive_ids()),
            DEFAULT_ID,
            first(self.pages.positive_ids()),
        )
    }

    /// Id of the first app whose rule matches `window`, or the wildcard app
    pub fn app_for_window(&self, window: &WindowInfo) -> ItemId {
        self.apps
            .iter()
            .find(|app| is_concrete(app.id()) && app.matches(window))
            .map(|app| app.id())
            .unwrap_or(DEFAULT_ID)
    }

    pub fn is_snoozed(&self, app_id: ItemId) -> bool {
        self.apps
            .get_by_id(app_id)
            .map(AppItem::snooze)
            .unwrap_or(false)
    }

    /// Check the profile and prune mappings that reference missing items.
    ///
    /// Returns how many action lists were removed. Data that cannot be
    /// repaired by pruning (bad source ids, bad region bounds) is an error.
    pub fn validate(&mut self) -> Result<usize, ProfileError> {
        for source in &self.sources {
            if !(1..=MAX_SOURCE_ID).contains(&source.id) {
                return Err(ProfileError::Validation(format!(
                    "source '{}' has id {} outside 1..={}",
                    source.name, source.id, MAX_SOURCE_ID
                )));
            }
        }
        for region in &self.regions {
            if !region.is_valid() || !is_concrete(region.id) {
                return Err(ProfileError::Validation(format!(
                    "region '{}' has bounds {} outside the screen",
                    region.name, region.rect
                )));
            }
        }

        let exists = |list: &NamedItemList<NamedItem>, id: ItemId| {
            id == DEFAULT_ID || list.contains_id(id)
        };
        let mut pruned = 0;
        let mut dangling_states = Vec::new();
        for (state, table) in self.mappings.iter_mut() {
            let situation_ok = exists(&self.modes, state.mode_id)
                && (state.app_id == DEFAULT_ID || self.apps.contains_id(state.app_id))
                && exists(&self.pages, state.page_id);
            if !situation_ok {
                pruned += table.len();
                dangling_states.push(*state);
                continue;
            }

            let sources = &self.sources;
            let regions = &self.regions;
            pruned += table.retain(|list| {
                let event = list.event();
                !list.is_empty()
                    && list.state() == *state
                    && sources.contains_id(event.source_id)
                    && (event.control_type != ControlType::Region
                        || regions.contains_id(event.control_data as ItemId))
            });
            if table.is_empty() {
                dangling_states.push(*state);
            }
        }
        for state in dangling_states {
            self.mappings.remove(&state);
        }

        if pruned > 0 {
            log::debug!("Pruned {} dangling action list(s) from '{}'", pruned, self.name);
        }
        Ok(pruned)
    }

    /// Display names for a state
    pub fn state_names(&self, state: &LogicalState) -> (String, String, String) {
        let name = |found: Option<&str>, id: ItemId| {
            found.map(str::to_string).unwrap_or_else(|| id.to_string())
        };
        (
            name(self.modes.get_by_id(state.mode_id).map(Named::name), state.mode_id),
            name(self.apps.get_by_id(state.app_id).map(Named::name), state.app_id),
            name(self.pages.get_by_id(state.page_id).map(Named::name), state.page_id),
        )
    }

    pub fn from_xml(text: &str) -> Result<Self, ProfileError> {
        let mut profile = xml::read(text)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn to_xml(&self) -> Result<String, ProfileError> {
        xml::write(self)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_xml(&text)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ProfileError> {
        let text = self.to_xml()?;
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, ExecutionMode};
    use crate::event::{EventArgs, EventReason};
    use crate::key::Key;
    use crate::window::Rect;

    fn space_pressed() -> EventArgs {
        EventArgs::new(2, ControlType::Keyboard, 57, EventReason::Pressed)
    }

    fn list(state: LogicalState, code: u16) -> ActionList {
        ActionList::new(state, space_pressed(), ExecutionMode::Parallel)
            .with_action(ActionKind::TapKey { key: Key::from(code) })
    }

    fn tapped(table: &ActionMappingTable) -> Option<ActionKind> {
        table
            .get(space_pressed().event_id())
            .and_then(|l| l.actions().next().cloned())
    }

    fn tap(code: u16) -> Option<ActionKind> {
        Some(ActionKind::TapKey { key: Key::from(code) })
    }

    fn profile_with_situations() -> Profile {
        let mut profile = Profile::new("test");
        profile.modes_mut().add(NamedItem::new(2, "Second mode"));
        profile.apps_mut().add(AppItem::new(1, "Editor"));
        profile.pages_mut().add(NamedItem::new(2, "Second page"));
        profile
    }

    #[test]
    fn test_exact_beats_wildcard() {
        let mut profile = profile_with_situations();
        profile.add_action_list(list(LogicalState::ALL, 30));
        profile.add_action_list(list(LogicalState::new(1, 1, 1), 31));

        let exact = profile.get_actions_for_state(&LogicalState::new(1, 1, 1));
        assert_eq!(tapped(&exact), tap(31));
        assert!(exact.lists().all(|l| l.is_active()));

        let other = profile.get_actions_for_state(&LogicalState::new(2, 1, 1));
        assert_eq!(tapped(&other), tap(30));
    }

    #[test]
    fn test_more_concrete_fields_win() {
        let mut profile = profile_with_situations();
        profile.add_action_list(list(LogicalState::new(1, -1, -1), 30));
        profile.add_action_list(list(LogicalState::new(1, 1, -1), 31));

        let table = profile.get_actions_for_state(&LogicalState::new(1, 1, 2));
        assert_eq!(tapped(&table), tap(31));
    }

    #[test]
    fn test_tie_prefers_page_then_app() {
        let mut profile = profile_with_situations();
        profile.add_action_list(list(LogicalState::new(1, -1, -1), 30));
        profile.add_action_list(list(LogicalState::new(-1, 1, -1), 31));
        profile.add_action_list(list(LogicalState::new(-1, -1, 1), 32));

        let all = profile.get_actions_for_state(&LogicalState::new(1, 1, 1));
        assert_eq!(tapped(&all), tap(32));

        let no_page = profile.get_actions_for_state(&LogicalState::new(1, 1, 2));
        assert_eq!(tapped(&no_page), tap(31));
    }

    #[test]
    fn test_unrelated_state_gets_nothing() {
        let mut profile = profile_with_situations();
        profile.add_action_list(list(LogicalState::new(2, -1, -1), 30));
        assert!(profile
            .get_actions_for_state(&LogicalState::new(1, -1, 1))
            .is_empty());
    }

    #[test]
    fn test_validate_prunes_dangling() {
        let mut profile = profile_with_situations();
        profile.add_action_list(list(LogicalState::new(2, -1, -1), 30));
        profile.add_action_list(list(LogicalState::new(1, -1, -1), 31));
        profile.regions_mut().add(ScreenRegion::new(
            1,
            "corner",
            Rect::new(0.0, 0.0, 0.1, 0.1),
            RegionShape::Rectangle,
        ));
        profile.add_action_list(
            ActionList::new(
                LogicalState::ALL,
                EventArgs::new(1, ControlType::Region, 1, EventReason::Inside),
                ExecutionMode::Parallel,
            )
            .with_action(ActionKind::Scroll { amount: 1 }),
        );
        assert_eq!(profile.validate().unwrap(), 0);

        profile.modes_mut().remove(2);
        profile.regions_mut().remove(1);
        assert_eq!(profile.validate().unwrap(), 2);
        assert_eq!(profile.mappings().len(), 1);
        assert_eq!(profile.validate().unwrap(), 0);
    }

    #[test]
    fn test_validate_drops_lists_of_removed_source() {
        let mut profile = profile_with_situations();
        profile.add_action_list(list(LogicalState::ALL, 30));
        profile.sources_mut().remove(2);
        assert_eq!(profile.validate().unwrap(), 1);
        assert!(profile.mappings().is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_region() {
        let mut profile = Profile::new("test");
        profile.regions_mut().add(ScreenRegion::new(
            1,
            "off screen",
            Rect::new(0.9, 0.9, 0.5, 0.5),
            RegionShape::Ellipse,
        ));
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::Validation(_))
        ));
    }

    #[test]
    fn test_app_for_window_and_snooze() {
        let mut profile = Profile::new("test");
        profile
            .apps_mut()
            .add(AppItem::new(1, "Editor").with_rule("wm_class == 'gedit'").unwrap());
        profile.apps_mut().add(
            AppItem::new(2, "Game")
                .with_rule("wm_name =~ 'doom.*'")
                .unwrap()
                .with_snooze(true),
        );

        let editor = WindowInfo::with_details(Some("gedit".into()), Some("notes".into()));
        let game = WindowInfo::with_details(Some("wine".into()), Some("Doom II".into()));
        let other = WindowInfo::with_details(Some("xterm".into()), None);

        assert_eq!(profile.app_for_window(&editor), 1);
        assert_eq!(profile.app_for_window(&game), 2);
        assert_eq!(profile.app_for_window(&other), DEFAULT_ID);
        assert!(profile.is_snoozed(2));
        assert!(!profile.is_snoozed(1));
        assert!(!profile.is_snoozed(DEFAULT_ID));
    }

    #[test]
    fn test_initial_state_and_names() {
        let profile = profile_with_situations();
        let state = profile.initial_state();
        assert_eq!(state, LogicalState::new(1, DEFAULT_ID, 1));
        assert_eq!(
            profile.state_names(&state),
            (
                "Default mode".to_string(),
                "Any app".to_string(),
                "Default page".to_string()
            )
        );
    }

    #[test]
    fn test_remove_action_list_drops_empty_table() {
        let mut profile = Profile::new("test");
        let state = LogicalState::new(1, -1, -1);
        profile.add_action_list(list(state, 30));
        assert!(profile.action_list(&state, space_pressed().event_id()).is_some());
        assert!(profile
            .remove_action_list(&state, space_pressed().event_id())
            .is_some());
        assert!(profile.mappings().is_empty());
    }
}
