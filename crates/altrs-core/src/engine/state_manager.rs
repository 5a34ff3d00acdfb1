// Altrs State Manager
// The polling engine: samples sources, dispatches events to action lists
// and moves between logical states

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use indexmap::IndexMap;

use crate::action::{ActionContext, ActionList, ActionMappingTable, ActionOutput, StateRequest};
use crate::config::{keys, AppConfig};
use crate::event::{EventArgs, EventId, EventReason, EventReport, ReportPayload, MAX_SOURCE_ID};
use crate::ids::{ItemId, DEFAULT_ID, LAST_USED_ID, NEXT_ID, PREVIOUS_ID};
use crate::item::{Named, NamedItemList};
use crate::output::InputSimulator;
use crate::profile::Profile;
use crate::source::{
    create_source, EventSink, InputBackend, InputSource, InternalChange, InternalSource,
    PollContext, SourceType,
};
use crate::state::LogicalState;
use crate::window::Rect;

use super::thread_manager::ThreadManager;

/// Which field of the logical state a transition targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateField {
    Mode,
    App,
    Page,
}

/// Resolve a requested id (possibly a navigation sentinel) against `list`.
///
/// Returns `None` when the id names nothing in the list.
fn resolve_id<T: Named>(
    list: &NamedItemList<T>,
    current: ItemId,
    last_used: ItemId,
    requested: ItemId,
) -> Option<ItemId> {
    let id = match requested {
        NEXT_ID => list.find_next_id(current),
        PREVIOUS_ID => list.find_previous_id(current),
        LAST_USED_ID => last_used,
        id => id,
    };
    (id == DEFAULT_ID || list.contains_id(id)).then_some(id)
}

/// Stop and forget the ongoing list for `id`, if any
fn stop_ongoing(
    ongoing: &mut IndexMap<EventId, ActionList>,
    ctx: &mut ActionContext<'_>,
    id: EventId,
) {
    if let Some(mut list) = ongoing.shift_remove(&id) {
        log::trace!("Auto-stopping actions for {}", list.event());
        list.stop(ctx);
    }
}

/// Runs on the polling thread and owns everything the loop touches.
///
/// Call [`tick`](Self::tick) once per polling interval, or let
/// [`run`](Self::run) do it until the thread manager asks to stop.
pub struct StateManager {
    profile: Profile,
    config: AppConfig,
    backend: Box<dyn InputBackend>,
    output: ActionOutput,
    sources: Vec<Box<dyn InputSource>>,
    internal: InternalSource,
    threads: Option<Arc<ThreadManager>>,

    current_state: LogicalState,
    last_used_state: LogicalState,
    snoozed: bool,
    /// Effective mappings for the current state, replaced on every change
    current_action_set: Arc<ActionMappingTable>,
    action_set_generation: u64,
    /// Running copies of the lists that have been started, by event
    ongoing: IndexMap<EventId, ActionList>,

    window_rect: Option<Rect>,
    overlay_rect: Option<Rect>,
    seq_number: u64,
    now: Instant,
    reports: Vec<EventReport>,
    submitted: Vec<EventArgs>,
}

impl StateManager {
    pub fn new(
        profile: Profile,
        config: AppConfig,
        backend: Box<dyn InputBackend>,
        simulator: Box<dyn InputSimulator>,
    ) -> Self {
        let mut manager = Self {
            profile: Profile::empty(""),
            config,
            backend,
            output: ActionOutput::new(simulator),
            sources: Vec::new(),
            internal: InternalSource::new(MAX_SOURCE_ID),
            threads: None,
            current_state: LogicalState::ALL,
            last_used_state: LogicalState::ALL,
            snoozed: false,
            current_action_set: Arc::new(ActionMappingTable::new()),
            action_set_generation: 0,
            ongoing: IndexMap::new(),
            window_rect: None,
            overlay_rect: None,
            seq_number: 0,
            now: Instant::now(),
            reports: Vec::new(),
            submitted: Vec::new(),
        };
        manager.apply_profile(profile);
        manager
    }

    /// Exchange profiles, config, submitted events and reports through
    /// `threads` on every tick
    pub fn with_thread_manager(mut self, threads: Arc<ThreadManager>) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn current_state(&self) -> LogicalState {
        self.current_state
    }

    pub fn last_used_state(&self) -> LogicalState {
        self.last_used_state
    }

    /// Display names of the current mode, app and page
    pub fn state_names(&self) -> (String, String, String) {
        self.profile.state_names(&self.current_state)
    }

    /// Snapshot of the effective mappings
    pub fn current_action_set(&self) -> Arc<ActionMappingTable> {
        Arc::clone(&self.current_action_set)
    }

    /// Bumped every time the effective mappings are recomputed
    pub fn action_set_generation(&self) -> u64 {
        self.action_set_generation
    }

    pub fn ongoing_count(&self) -> usize {
        self.ongoing.len()
    }

    pub fn is_ongoing(&self, id: EventId) -> bool {
        self.ongoing.contains_key(&id)
    }

    pub fn is_snoozed(&self) -> bool {
        self.snoozed
    }

    /// Rectangle of the focused window, in pixels
    pub fn window_rect(&self) -> Option<Rect> {
        self.window_rect
    }

    pub fn overlay_rect(&self) -> Option<Rect> {
        self.overlay_rect
    }

    /// Where a UI overlay is drawn, for collaborators that position things
    /// relative to it
    pub fn set_overlay_rect(&mut self, rect: Option<Rect>) {
        self.overlay_rect = rect;
    }

    pub fn dpi_scale(&self) -> f64 {
        self.backend.dpi_scale()
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.config.get_bool(keys::SHOW_DIAGNOSTICS)
    }

    /// Number of completed ticks
    pub fn seq_number(&self) -> u64 {
        self.seq_number
    }

    /// Reports produced since the last call.
    ///
    /// With a thread manager attached, reports are forwarded there at the
    /// end of each tick instead.
    pub fn take_reports(&mut self) -> Vec<EventReport> {
        std::mem::take(&mut self.reports)
    }

    /// Replace the profile.
    ///
    /// Everything held is released, ongoing lists are dropped and the
    /// sources are rebuilt from the new profile. The app is kept when the
    /// new profile still has it.
    pub fn apply_profile(&mut self, profile: Profile) {
        log::debug!("Applying profile '{}'", profile.name());
        self.reset();
        self.teardown_sources();

        let app_id = if profile.apps().contains_id(self.current_state.app_id) {
            self.current_state.app_id
        } else {
            DEFAULT_ID
        };
        let previous = self.current_state;
        self.profile = profile;

        self.sources = self
            .profile
            .sources()
            .iter()
            .filter_map(create_source)
            .collect();
        for source in &mut self.sources {
            source.connect(true);
        }
        let internal_id = self
            .profile
            .sources()
            .iter()
            .find(|s| s.source_type == SourceType::Internal)
            .map(|s| s.id)
            .unwrap_or(MAX_SOURCE_ID);
        self.internal = InternalSource::new(internal_id);
        self.internal.connect(true);

        self.current_state = self.profile.initial_state().with_app(app_id);
        self.last_used_state = self.current_state;
        self.snoozed = self.profile.is_snoozed(app_id);
        self.update_current_action_set();

        self.report(ReportPayload::ProfileChange {
            name: self.profile.name().to_string(),
        });
        self.report_state_change(previous);
    }

    pub fn apply_config(&mut self, config: AppConfig) {
        log::debug!(
            "Applying config (polling every {:?})",
            config.polling_interval()
        );
        self.config = config;
    }

    /// Stop every ongoing list and release everything our output holds
    pub fn reset(&mut self) {
        let mut ctx = ActionContext::new(self.now, &self.config, &mut self.output);
        for (_, mut list) in self.ongoing.drain(..) {
            list.stop(&mut ctx);
        }
        self.output.release_all();
        // Requests raised while stopping are moot
        self.output.take_requests();
        self.reports.extend(self.output.take_reports());
    }

    pub fn set_mode(&mut self, mode_id: ItemId) -> bool {
        self.change_state(StateField::Mode, mode_id)
    }

    pub fn set_app(&mut self, app_id: ItemId) -> bool {
        self.change_state(StateField::App, app_id)
    }

    pub fn set_page(&mut self, page_id: ItemId) -> bool {
        self.change_state(StateField::Page, page_id)
    }

    /// Move one field of the logical state.
    ///
    /// Returns false, and does nothing, when the resolved state equals the
    /// current one or the id is unknown.
    fn change_state(&mut self, field: StateField, requested: ItemId) -> bool {
        let current = self.current_state;
        let last = self.last_used_state;
        let resolved = match field {
            StateField::Mode => {
                resolve_id(self.profile.modes(), current.mode_id, last.mode_id, requested)
            }
            StateField::App => {
                resolve_id(self.profile.apps(), current.app_id, last.app_id, requested)
            }
            StateField::Page => {
                resolve_id(self.profile.pages(), current.page_id, last.page_id, requested)
            }
        };
        let Some(id) = resolved else {
            log::warn!("Ignoring change of {:?} to unknown id {}", field, requested);
            return false;
        };

        let candidate = match field {
            StateField::Mode => current.with_mode(id),
            StateField::App => current.with_app(id),
            StateField::Page => current.with_page(id),
        };
        if candidate == current {
            return false;
        }

        match field {
            StateField::Mode => self.last_used_state.mode_id = current.mode_id,
            StateField::App => self.last_used_state.app_id = current.app_id,
            StateField::Page => self.last_used_state.page_id = current.page_id,
        }
        self.current_state = candidate;
        log::debug!("State {} -> {}", current, candidate);

        if field == StateField::App {
            let snoozed = self.profile.is_snoozed(id);
            if snoozed != self.snoozed {
                log::debug!("Snooze {}", if snoozed { "on" } else { "off" });
            }
            self.snoozed = snoozed;
        }

        self.update_current_action_set();
        self.report_state_change(current);
        true
    }

    /// Recompute the effective mappings and retire ongoing lists that are
    /// no longer mapped
    fn update_current_action_set(&mut self) {
        let table = if self.snoozed {
            ActionMappingTable::new()
        } else {
            self.profile.get_actions_for_state(&self.current_state)
        };

        let mut ctx = ActionContext::new(self.now, &self.config, &mut self.output);
        let retired: Vec<EventId> = self
            .ongoing
            .iter()
            .filter(|(id, list)| {
                !table
                    .get(**id)
                    .is_some_and(|mapped| mapped.state() == list.state())
            })
            .map(|(id, _)| *id)
            .collect();
        for id in retired {
            stop_ongoing(&mut self.ongoing, &mut ctx, id);
        }

        let monitored: HashSet<EventId> = table.event_ids().collect();
        for source in &mut self.sources {
            source.set_monitored(&monitored);
        }
        self.internal.set_monitored(&monitored);

        self.current_action_set = Arc::new(table);
        self.action_set_generation += 1;
        log::debug!(
            "Action set {} has {} list(s)",
            self.action_set_generation,
            self.current_action_set.len()
        );
    }

    fn report(&mut self, payload: ReportPayload) {
        self.reports.push(EventReport::new(payload));
    }

    fn report_state_change(&mut self, previous: LogicalState) {
        let (mode_name, app_name, page_name) = self.state_names();
        self.report(ReportPayload::StateChange {
            previous,
            current: self.current_state,
            mode_name,
            app_name,
            page_name,
        });
    }

    /// Dispatch one raised event
    pub fn handle_event(&mut self, args: &EventArgs) {
        if self.snoozed {
            return;
        }
        if self.diagnostics_enabled() {
            self.report(ReportPayload::Control(*args));
        }
        log::trace!("Event {}", args);

        let id = args.event_id();
        let auto_stop_press = self.config.get_bool(keys::AUTO_STOP_PRESS_ACTIONS);
        let auto_stop_inside = self.config.get_bool(keys::AUTO_STOP_INSIDE_ACTIONS);
        let mut ctx = ActionContext::new(self.now, &self.config, &mut self.output);

        match args.reason {
            EventReason::Released if auto_stop_press => {
                stop_ongoing(&mut self.ongoing, &mut ctx, id.with_reason(EventReason::Pressed));
            }
            EventReason::Outside => {
                if auto_stop_inside {
                    stop_ongoing(&mut self.ongoing, &mut ctx, id.with_reason(EventReason::Inside));
                }
                stop_ongoing(&mut self.ongoing, &mut ctx, id.with_reason(EventReason::Updated));
            }
            _ => {}
        }

        if let Some(list) = self.ongoing.get_mut(&id) {
            list.continue_(&mut ctx, Some(args));
            if !list.is_ongoing() {
                self.ongoing.shift_remove(&id);
            }
        } else if let Some(mapped) = self.current_action_set.get(id) {
            let mut list = mapped.clone();
            list.start(&mut ctx, args);
            if list.is_ongoing() {
                self.ongoing.insert(id, list);
            }
        }

        self.reports.extend(self.output.take_reports());
        self.apply_requests();
    }

    /// Apply state changes actions asked for during the last dispatch
    fn apply_requests(&mut self) {
        for request in self.output.take_requests() {
            match request {
                StateRequest::Mode(id) => self.set_mode(id),
                StateRequest::App(id) => self.set_app(id),
                StateRequest::Page(id) => self.set_page(id),
            };
        }
    }

    /// Run one polling cycle at time `now`
    pub fn tick(&mut self, now: Instant) {
        self.now = now;

        if let Some(threads) = self.threads.clone() {
            self.receive_from(&threads);
        }

        self.poll_internal();

        for index in 0..self.sources.len() {
            let mut sink = EventSink::new();
            let result = {
                let mut ctx = PollContext {
                    now,
                    config: &self.config,
                    regions: self.profile.regions().as_slice(),
                    backend: self.backend.as_mut(),
                };
                self.sources[index].update_state(&mut ctx, &mut sink)
            };
            if let Err(e) = result {
                log::warn!("Polling source {} failed: {}", self.sources[index].id(), e);
                continue;
            }
            self.reports.extend(sink.take_reports());
            for args in sink.take_events() {
                self.handle_event(&args);
            }
        }

        let mut ctx = ActionContext::new(now, &self.config, &mut self.output);
        for list in self.ongoing.values_mut() {
            list.continue_(&mut ctx, None);
        }
        self.ongoing.retain(|_, list| list.is_ongoing());
        self.reports.extend(self.output.take_reports());
        self.apply_requests();

        self.seq_number += 1;

        if let Some(threads) = &self.threads {
            for report in self.reports.drain(..) {
                threads.schedule_event_report(report);
            }
        }
    }

    /// Pick up profile/config replacements and submitted events
    fn receive_from(&mut self, threads: &ThreadManager) {
        if let Some(updates) = threads.receive_config_updates() {
            if let Some(config) = updates.config {
                self.apply_config(config);
            }
            if let Some(profile) = updates.profile {
                self.apply_profile(profile);
            }
        }

        let mut submitted = std::mem::take(&mut self.submitted);
        threads.get_new_event_submissions(&mut submitted);
        for args in &submitted {
            match self.sources.iter_mut().find(|s| s.id() == args.source_id) {
                Some(source) if source.is_connected() => source.receive_external_event(args),
                Some(_) => log::debug!("Source {} is disconnected, dropping event", args.source_id),
                None => log::warn!("No source {} for submitted event", args.source_id),
            }
        }
        self.submitted = submitted;
    }

    fn poll_internal(&mut self) {
        let mut sink = EventSink::new();
        let result = {
            let mut ctx = PollContext {
                now: self.now,
                config: &self.config,
                regions: self.profile.regions().as_slice(),
                backend: self.backend.as_mut(),
            };
            self.internal.update_state(&mut ctx, &mut sink)
        };
        if let Err(e) = result {
            log::warn!("Polling the active window failed: {}", e);
            return;
        }

        for change in self.internal.take_changes() {
            match change {
                InternalChange::ActiveWindow(window) => {
                    let app_id = window
                        .as_ref()
                        .map(|w| self.profile.app_for_window(w))
                        .unwrap_or(DEFAULT_ID);
                    self.set_app(app_id);
                }
                InternalChange::WindowRect(rect) => self.window_rect = rect,
            }
        }
        self.reports.extend(sink.take_reports());
        for args in sink.take_events() {
            self.handle_event(&args);
        }
    }

    fn teardown_sources(&mut self) {
        for source in &mut self.sources {
            source.connect(false);
            source.teardown();
        }
        self.internal.teardown();
    }

    /// Tick at the configured interval until the thread manager asks to
    /// stop, then release everything
    pub fn run(&mut self) {
        let Some(threads) = self.threads.clone() else {
            log::warn!("State manager has no thread manager to run against");
            return;
        };
        log::info!("Polling started with profile '{}'", self.profile.name());

        while !threads.is_stop_requested() {
            let started = Instant::now();
            self.tick(started);
            let interval = self.config.polling_interval();
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        self.reset();
        self.teardown_sources();
        for report in self.reports.drain(..) {
            threads.schedule_event_report(report);
        }
        log::info!("Polling stopped after {} ticks", self.seq_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, ExecutionMode};
    use crate::event::{ControlType, EventType};
    use crate::item::{AppItem, NamedItem};
    use crate::key::Key;
    use crate::output::RecordingSimulator;
    use crate::source::{ManualBackend, SourceSpec};

    fn manager_with(profile: Profile) -> StateManager {
        StateManager::new(
            profile,
            AppConfig::default(),
            Box::new(ManualBackend::new()),
            Box::new(RecordingSimulator::new()),
        )
    }

    fn three_modes() -> Profile {
        let mut profile = Profile::new("modes");
        profile.modes_mut().add(NamedItem::new(2, "Two"));
        profile.modes_mut().add(NamedItem::new(3, "Three"));
        profile
    }

    fn state_changes(manager: &mut StateManager) -> usize {
        manager
            .take_reports()
            .iter()
            .filter(|r| r.event_type() == EventType::StateChange)
            .count()
    }

    #[test]
    fn test_initial_state() {
        let mut manager = manager_with(three_modes());
        assert_eq!(manager.current_state(), LogicalState::new(1, DEFAULT_ID, 1));
        assert_eq!(manager.last_used_state(), manager.current_state());
        let types: Vec<_> = manager.take_reports().iter().map(|r| r.event_type()).collect();
        assert_eq!(types, vec![EventType::ProfileChange, EventType::StateChange]);
    }

    #[test]
    fn test_navigation_and_last_used() {
        let mut manager = manager_with(three_modes());
        manager.take_reports();

        assert!(manager.set_mode(NEXT_ID));
        assert_eq!(manager.current_state().mode_id, 2);
        assert_eq!(manager.last_used_state().mode_id, 1);

        assert!(manager.set_mode(3));
        assert!(manager.set_mode(NEXT_ID));
        assert_eq!(manager.current_state().mode_id, 1);

        assert!(manager.set_mode(PREVIOUS_ID));
        assert_eq!(manager.current_state().mode_id, 3);

        assert!(manager.set_mode(LAST_USED_ID));
        assert_eq!(manager.current_state().mode_id, 1);
        assert_eq!(manager.last_used_state().mode_id, 3);
        assert_eq!(state_changes(&mut manager), 5);
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut manager = manager_with(three_modes());
        manager.take_reports();
        let generation = manager.action_set_generation();
        assert!(!manager.set_page(42));
        assert_eq!(manager.action_set_generation(), generation);
        assert_eq!(state_changes(&mut manager), 0);
    }

    #[test]
    fn test_snoozed_app_empties_action_set() {
        let mut profile = Profile::new("snooze");
        profile
            .apps_mut()
            .add(AppItem::new(1, "Game").with_snooze(true));
        let pressed = EventArgs::new(2, ControlType::Keyboard, 30, EventReason::Pressed);
        profile.add_action_list(
            ActionList::new(LogicalState::ALL, pressed, ExecutionMode::Parallel)
                .with_action(ActionKind::TapKey { key: Key::from(31) }),
        );

        let mut manager = manager_with(profile);
        assert_eq!(manager.current_action_set().len(), 1);

        assert!(manager.set_app(1));
        assert!(manager.is_snoozed());
        assert!(manager.current_action_set().is_empty());

        assert!(manager.set_app(DEFAULT_ID));
        assert!(!manager.is_snoozed());
        assert_eq!(manager.current_action_set().len(), 1);
    }

    #[test]
    fn test_reports_forwarded_to_thread_manager() {
        let threads = Arc::new(ThreadManager::new());
        let mut manager = manager_with(three_modes()).with_thread_manager(Arc::clone(&threads));
        manager.tick(Instant::now());
        assert!(manager.take_reports().is_empty());
        let reports = threads.get_new_event_reports();
        assert!(reports.iter().any(|r| r.event_type() == EventType::ProfileChange));
        assert_eq!(manager.seq_number(), 1);
    }

    #[test]
    fn test_disconnected_source_ignores_submitted_events() {
        let mut profile = Profile::new("pad");
        profile
            .sources_mut()
            .add(SourceSpec::new(3, "Pad", SourceType::CustomWindow));
        let click = EventArgs::new(3, ControlType::CustomButton, 1, EventReason::Pressed);
        profile.add_action_list(
            ActionList::new(LogicalState::ALL, click, ExecutionMode::Parallel)
                .with_action(ActionKind::TapKey { key: Key::from(31) }),
        );
        let recorder = RecordingSimulator::new();
        let threads = Arc::new(ThreadManager::new());
        let mut manager = StateManager::new(
            profile,
            AppConfig::default(),
            Box::new(ManualBackend::new()),
            Box::new(recorder.clone()),
        )
        .with_thread_manager(Arc::clone(&threads));

        let pad = manager.sources.iter_mut().find(|s| s.id() == 3).unwrap();
        pad.connect(false);
        threads.submit_event(click);
        manager.tick(Instant::now());
        assert!(recorder.take().is_empty());

        let pad = manager.sources.iter_mut().find(|s| s.id() == 3).unwrap();
        pad.connect(true);
        threads.submit_event(click);
        manager.tick(Instant::now());
        assert_eq!(recorder.take().len(), 2);
    }

    #[test]
    fn test_run_stops_when_requested() {
        let threads = Arc::new(ThreadManager::new());
        let mut manager = manager_with(three_modes()).with_thread_manager(Arc::clone(&threads));
        threads.stop_polling();
        manager.run();
        assert_eq!(manager.seq_number(), 0);
    }
}
