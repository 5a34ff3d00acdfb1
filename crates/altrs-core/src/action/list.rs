// Altrs Action Lists
// Ordered actions bound to one event, run in series or in parallel

use strum_macros::{Display, EnumString};

use crate::event::{EventArgs, EventId};
use crate::state::LogicalState;

use super::context::ActionContext;
use super::kind::{Action, ActionKind};

/// How the actions of a list are run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ExecutionMode {
    /// All actions start together and progress independently
    #[default]
    Parallel,
    /// Each action must finish before the next one starts
    Series,
}

/// Actions mapped to one event under one logical state.
///
/// Lifecycle: idle until [`start`](Self::start); ongoing while any member
/// action outlives the tick; idle again on completion or [`stop`](Self::stop).
#[derive(Debug, Clone, PartialEq)]
pub struct ActionList {
    actions: Vec<Action>,
    execution: ExecutionMode,
    state: LogicalState,
    event: EventArgs,
    is_active: bool,
    is_ongoing: bool,
    /// Index of the running action in series mode
    cursor: usize,
}

impl ActionList {
    pub fn new(state: LogicalState, event: EventArgs, execution: ExecutionMode) -> Self {
        Self {
            actions: Vec::new(),
            execution,
            state,
            event,
            is_active: false,
            is_ongoing: false,
            cursor: 0,
        }
    }

    pub fn with_action(mut self, kind: ActionKind) -> Self {
        self.push(kind);
        self
    }

    pub fn push(&mut self, kind: ActionKind) {
        self.actions.push(Action::new(kind));
    }

    pub fn remove(&mut self, index: usize) -> Option<ActionKind> {
        if index < self.actions.len() && !self.is_ongoing {
            Some(self.actions.remove(index).kind().clone())
        } else {
            None
        }
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionKind> {
        self.actions.iter().map(Action::kind)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn execution(&self) -> ExecutionMode {
        self.execution
    }

    /// State the list was defined under
    pub fn state(&self) -> LogicalState {
        self.state
    }

    /// Event the list is mapped to
    pub fn event(&self) -> &EventArgs {
        &self.event
    }

    pub fn event_id(&self) -> EventId {
        self.event.event_id()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn is_ongoing(&self) -> bool {
        self.is_ongoing
    }

    /// Begin executing the list for `args`.
    ///
    /// A list that is still ongoing is stopped first.
    pub fn start(&mut self, ctx: &mut ActionContext<'_>, args: &EventArgs) {
        if self.is_ongoing {
            self.stop(ctx);
        }
        log::trace!("Starting {} action(s) for {}", self.actions.len(), args);

        match self.execution {
            ExecutionMode::Parallel => {
                for action in &mut self.actions {
                    if let Err(e) = action.start(ctx) {
                        log::warn!("Action {} failed: {}", action.kind().type_name(), e);
                    }
                }
            }
            ExecutionMode::Series => {
                self.cursor = 0;
                self.advance_series(ctx, true);
            }
        }
        self.refresh_ongoing();
    }

    /// Advance one tick. `args` is set when a new event arrived for the list.
    pub fn continue_(&mut self, ctx: &mut ActionContext<'_>, args: Option<&EventArgs>) {
        if !self.is_ongoing {
            return;
        }
        if let Some(args) = args {
            log::trace!("Continuing actions for {}", args);
        }

        match self.execution {
            ExecutionMode::Parallel => {
                for action in self.actions.iter_mut().filter(|a| a.is_ongoing()) {
                    if let Err(e) = action.continue_(ctx) {
                        log::warn!("Action {} failed: {}", action.kind().type_name(), e);
                    }
                }
            }
            ExecutionMode::Series => self.advance_series(ctx, false),
        }
        self.refresh_ongoing();
    }

    /// Terminate all running actions. Safe to call on an idle list.
    pub fn stop(&mut self, ctx: &mut ActionContext<'_>) {
        if !self.is_ongoing {
            return;
        }
        for action in self.actions.iter_mut().filter(|a| a.is_ongoing()) {
            if let Err(e) = action.stop(ctx) {
                log::warn!("Stopping {} failed: {}", action.kind().type_name(), e);
            }
        }
        self.is_ongoing = false;
        self.cursor = 0;
    }

    /// Run series actions from the cursor until one stays ongoing.
    ///
    /// `starting` means the action at the cursor has not been started yet.
    fn advance_series(&mut self, ctx: &mut ActionContext<'_>, mut starting: bool) {
        while let Some(action) = self.actions.get_mut(self.cursor) {
            let result = if starting {
                action.start(ctx)
            } else {
                action.continue_(ctx)
            };
            if let Err(e) = result {
                log::warn!("Action {} failed: {}", action.kind().type_name(), e);
                // Failed actions count as finished
                let _ = action.stop(ctx);
            }
            if action.is_ongoing() {
                return;
            }
            self.cursor += 1;
            starting = true;
        }
    }

    fn refresh_ongoing(&mut self) {
        self.is_ongoing = match self.execution {
            ExecutionMode::Parallel => self.actions.iter().any(Action::is_ongoing),
            ExecutionMode::Series => self.cursor < self.actions.len(),
        };
        if !self.is_ongoing {
            self.cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::context::ActionOutput;
    use crate::config::AppConfig;
    use crate::event::{ControlType, EventReason};
    use crate::key::Key;
    use crate::output::{OutputEvent, RecordingSimulator};
    use std::time::{Duration, Instant};

    fn pressed() -> EventArgs {
        EventArgs::new(1, ControlType::Keyboard, 57, EventReason::Pressed)
    }

    fn key_event(code: u16, pressed: bool) -> OutputEvent {
        OutputEvent::Key {
            key: Key::from(code),
            pressed,
        }
    }

    fn setup() -> (RecordingSimulator, ActionOutput, AppConfig) {
        let recorder = RecordingSimulator::new();
        let output = ActionOutput::new(Box::new(recorder.clone()));
        (recorder, output, AppConfig::new())
    }

    #[test]
    fn test_instant_list_never_ongoing() {
        let (recorder, mut output, config) = setup();
        let mut list = ActionList::new(LogicalState::ALL, pressed(), ExecutionMode::Parallel)
            .with_action(ActionKind::TapKey { key: Key::from(30) })
            .with_action(ActionKind::Scroll { amount: 1 });

        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        list.start(&mut ctx, &pressed());
        assert!(!list.is_ongoing());
        assert_eq!(recorder.events().len(), 3);
    }

    #[test]
    fn test_parallel_hold_is_ongoing_until_stop() {
        let (recorder, mut output, config) = setup();
        let mut list = ActionList::new(LogicalState::ALL, pressed(), ExecutionMode::Parallel)
            .with_action(ActionKind::HoldKey { key: Key::from(42) })
            .with_action(ActionKind::TapKey { key: Key::from(30) });

        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        list.start(&mut ctx, &pressed());
        assert!(list.is_ongoing());
        list.continue_(&mut ctx, None);
        assert!(list.is_ongoing());
        list.stop(&mut ctx);
        assert!(!list.is_ongoing());

        assert_eq!(
            recorder.events(),
            vec![
                key_event(42, true),
                key_event(30, true),
                key_event(30, false),
                key_event(42, false),
            ]
        );
    }

    #[test]
    fn test_stop_on_idle_list_is_noop() {
        let (recorder, mut output, config) = setup();
        let mut list = ActionList::new(LogicalState::ALL, pressed(), ExecutionMode::Series)
            .with_action(ActionKind::HoldKey { key: Key::from(42) });
        let before = list.clone();

        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        list.stop(&mut ctx);
        list.stop(&mut ctx);
        assert_eq!(list, before);
        assert!(recorder.events().is_empty());

        // Also after a completed run
        list.start(&mut ctx, &pressed());
        list.stop(&mut ctx);
        let after_run = list.clone();
        list.stop(&mut ctx);
        assert_eq!(list, after_run);
        assert_eq!(recorder.events().len(), 2);
    }

    #[test]
    fn test_series_waits_between_actions() {
        let (recorder, mut output, config) = setup();
        let t0 = Instant::now();
        let mut list = ActionList::new(LogicalState::ALL, pressed(), ExecutionMode::Series)
            .with_action(ActionKind::TapKey { key: Key::from(30) })
            .with_action(ActionKind::Wait { duration_ms: 100 })
            .with_action(ActionKind::TapKey { key: Key::from(48) });

        list.start(&mut ActionContext::new(t0, &config, &mut output), &pressed());
        assert!(list.is_ongoing());
        assert_eq!(recorder.events().len(), 2);

        list.continue_(
            &mut ActionContext::new(t0 + Duration::from_millis(60), &config, &mut output),
            None,
        );
        assert!(list.is_ongoing());
        assert_eq!(recorder.events().len(), 2);

        list.continue_(
            &mut ActionContext::new(t0 + Duration::from_millis(100), &config, &mut output),
            None,
        );
        assert!(!list.is_ongoing());
        assert_eq!(
            recorder.events()[2..].to_vec(),
            vec![key_event(48, true), key_event(48, false)]
        );
    }

    #[test]
    fn test_series_stop_skips_remaining() {
        let (recorder, mut output, config) = setup();
        let mut list = ActionList::new(LogicalState::ALL, pressed(), ExecutionMode::Series)
            .with_action(ActionKind::HoldKey { key: Key::from(42) })
            .with_action(ActionKind::TapKey { key: Key::from(30) });

        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        list.start(&mut ctx, &pressed());
        list.continue_(&mut ctx, Some(&pressed()));
        list.stop(&mut ctx);

        assert!(!list.is_ongoing());
        assert_eq!(
            recorder.events(),
            vec![key_event(42, true), key_event(42, false)]
        );
    }

    #[test]
    fn test_restart_stops_previous_run() {
        let (recorder, mut output, config) = setup();
        let mut list = ActionList::new(LogicalState::ALL, pressed(), ExecutionMode::Parallel)
            .with_action(ActionKind::HoldMouse {
                button: crate::key::MouseButton::Left,
            });

        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        list.start(&mut ctx, &pressed());
        list.start(&mut ctx, &pressed());
        assert!(list.is_ongoing());
        assert_eq!(recorder.events().len(), 3);
    }

    #[test]
    fn test_cannot_remove_while_ongoing() {
        let (_, mut output, config) = setup();
        let mut list = ActionList::new(LogicalState::ALL, pressed(), ExecutionMode::Parallel)
            .with_action(ActionKind::HoldKey { key: Key::from(42) });
        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        list.start(&mut ctx, &pressed());
        assert_eq!(list.remove(0), None);
        list.stop(&mut ctx);
        assert_eq!(list.remove(0), Some(ActionKind::HoldKey { key: Key::from(42) }));
        assert!(list.is_empty());
    }

    #[test]
    fn test_execution_mode_names() {
        assert_eq!(ExecutionMode::Series.to_string(), "Series");
        assert_eq!("parallel".parse::<ExecutionMode>(), Ok(ExecutionMode::Parallel));
    }
}
