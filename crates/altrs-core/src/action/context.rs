// Altrs Action Context
// What a running action may touch: time, output, config, reports and
// deferred state-change requests

use std::time::Instant;

use crate::config::AppConfig;
use crate::event::{EventReport, MenuOption, ReportPayload};
use crate::ids::ItemId;
use crate::key::{Key, MouseButton};
use crate::output::{HeldInputs, InputSimulator, OutputError};
use crate::security::{self, CommandDecision};

/// Error raised by a single action
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Output failed: {0}")]
    Output(#[from] OutputError),

    #[error("Invalid action parameter: {0}")]
    InvalidParameter(String),
}

/// Logical-state change asked for by an action.
///
/// Applied by the state manager once the current dispatch finishes, so that
/// an action never re-enters the manager while it is iterating lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRequest {
    Mode(ItemId),
    App(ItemId),
    Page(ItemId),
}

/// Output side of the engine, owned by the state manager
pub struct ActionOutput {
    simulator: Box<dyn InputSimulator>,
    held: HeldInputs,
    reports: Vec<EventReport>,
    requests: Vec<StateRequest>,
}

impl ActionOutput {
    pub fn new(simulator: Box<dyn InputSimulator>) -> Self {
        Self {
            simulator,
            held: HeldInputs::new(),
            reports: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn report(&mut self, payload: ReportPayload) {
        self.reports.push(EventReport::new(payload));
    }

    pub fn take_reports(&mut self) -> Vec<EventReport> {
        std::mem::take(&mut self.reports)
    }

    pub fn take_requests(&mut self) -> Vec<StateRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn key(&mut self, key: Key, pressed: bool) -> Result<(), ActionError> {
        self.simulator.key(key, pressed)?;
        if pressed {
            self.held.add_key(key);
        } else {
            self.held.remove_key(key);
        }
        self.report(ReportPayload::KeyEvent { key, pressed });
        Ok(())
    }

    pub fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), ActionError> {
        self.simulator.mouse_button(button, pressed)?;
        if pressed {
            self.held.add_button(button);
        } else {
            self.held.remove_button(button);
        }
        self.report(ReportPayload::MouseButtonEvent { button, pressed });
        Ok(())
    }

    pub fn scroll(&mut self, amount: i32) -> Result<(), ActionError> {
        self.simulator.scroll(amount)?;
        self.report(ReportPayload::MouseScrollEvent { amount });
        Ok(())
    }

    /// Release every key and button still held by our output.
    ///
    /// Failures are logged so one stuck key does not keep the rest held.
    pub fn release_all(&mut self) {
        for key in self.held.keys() {
            if let Err(e) = self.key(key, false) {
                log::warn!("Failed to release key {}: {}", key, e);
            }
        }
        for button in self.held.buttons() {
            if let Err(e) = self.mouse_button(button, false) {
                log::warn!("Failed to release button {}: {}", button, e);
            }
        }
        self.held.clear();
    }
}

/// Per-call view handed to actions
pub struct ActionContext<'a> {
    pub now: Instant,
    pub config: &'a AppConfig,
    pub output: &'a mut ActionOutput,
}

impl<'a> ActionContext<'a> {
    pub fn new(now: Instant, config: &'a AppConfig, output: &'a mut ActionOutput) -> Self {
        Self {
            now,
            config,
            output,
        }
    }

    pub fn key(&mut self, key: Key, pressed: bool) -> Result<(), ActionError> {
        self.output.key(key, pressed)
    }

    pub fn tap_key(&mut self, key: Key) -> Result<(), ActionError> {
        self.key(key, true)?;
        self.key(key, false)
    }

    pub fn is_key_held(&self, key: Key) -> bool {
        self.output.held.is_key_held(key)
    }

    pub fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), ActionError> {
        self.output.mouse_button(button, pressed)
    }

    pub fn click(&mut self, button: MouseButton) -> Result<(), ActionError> {
        self.mouse_button(button, true)?;
        self.mouse_button(button, false)
    }

    pub fn scroll(&mut self, amount: i32) -> Result<(), ActionError> {
        self.output.scroll(amount)
    }

    pub fn report(&mut self, payload: ReportPayload) {
        self.output.report(payload);
    }

    pub fn menu(&mut self, option: MenuOption) {
        self.report(ReportPayload::MenuOptionEvent { option });
    }

    pub fn request(&mut self, request: StateRequest) {
        self.output.requests.push(request);
    }

    /// Launch a program if the command rules allow it.
    ///
    /// Returns whether the program was started. Denial is not an error.
    pub fn start_program(&mut self, program: &str, args: &str) -> Result<bool, ActionError> {
        let command = security::command_line(program, args);
        let decision = security::evaluate(
            self.config.command_rules(),
            &command,
            self.config.default_command_decision(),
        );
        let allowed = match decision {
            CommandDecision::Allow => true,
            CommandDecision::Ask => self.output.simulator.confirm_command(&command),
            CommandDecision::Deny => false,
        };
        if !allowed {
            log::debug!("Command not run ({}): {}", decision, command);
            return Ok(false);
        }
        self.output.simulator.start_program(program, args)?;
        Ok(true)
    }
}
