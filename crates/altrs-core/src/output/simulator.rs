// Altrs Input Simulation
// Collaborator that turns decided actions into OS input

use std::process::Command;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::key::{Key, MouseButton};

/// Error types for output operations
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write event: {0}")]
    Write(String),

    #[error("Program could not be started: {0}")]
    Launch(String),
}

/// Injects simulated input into the OS.
///
/// How a key press is physically produced is up to the implementation; the
/// engine only decides which effects happen and when.
pub trait InputSimulator: Send {
    fn key(&mut self, key: Key, pressed: bool) -> Result<(), OutputError>;

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), OutputError>;

    /// Scroll the wheel; positive is up
    fn scroll(&mut self, amount: i32) -> Result<(), OutputError>;

    fn start_program(&mut self, program: &str, args: &str) -> Result<(), OutputError>;

    /// Ask the user whether a command flagged `Ask` may run.
    ///
    /// The polling thread cannot wait for an answer, so the default denies.
    fn confirm_command(&mut self, _command: &str) -> bool {
        false
    }
}

/// Launch a program detached from the poller
pub fn spawn_program(program: &str, args: &str) -> Result<(), OutputError> {
    Command::new(program)
        .args(args.split_whitespace())
        .spawn()
        .map(|_| ())
        .map_err(|e| OutputError::Launch(format!("{}: {}", program, e)))
}

/// Simulator that only logs what it would do
#[derive(Debug, Default)]
pub struct LogSimulator;

impl InputSimulator for LogSimulator {
    fn key(&mut self, key: Key, pressed: bool) -> Result<(), OutputError> {
        log::info!("key {} {}", key, if pressed { "down" } else { "up" });
        Ok(())
    }

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), OutputError> {
        log::info!("button {} {}", button, if pressed { "down" } else { "up" });
        Ok(())
    }

    fn scroll(&mut self, amount: i32) -> Result<(), OutputError> {
        log::info!("scroll {}", amount);
        Ok(())
    }

    fn start_program(&mut self, program: &str, args: &str) -> Result<(), OutputError> {
        log::info!("start program {} {}", program, args);
        Ok(())
    }
}

/// One effect captured by [`RecordingSimulator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Key { key: Key, pressed: bool },
    Button { button: MouseButton, pressed: bool },
    Scroll(i32),
    Program(String),
}

/// Simulator that records every effect into a shared log.
///
/// Clones share the same log, so a clone kept outside the engine can
/// inspect what the engine did.
#[derive(Debug, Clone, Default)]
pub struct RecordingSimulator {
    events: Arc<Mutex<Vec<OutputEvent>>>,
    confirm: Arc<Mutex<bool>>,
}

impl RecordingSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer future `Ask` confirmations with `answer`
    pub fn set_confirm(&self, answer: bool) {
        *self.confirm.lock() = answer;
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<OutputEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: OutputEvent) {
        self.events.lock().push(event);
    }
}

impl InputSimulator for RecordingSimulator {
    fn key(&mut self, key: Key, pressed: bool) -> Result<(), OutputError> {
        self.push(OutputEvent::Key { key, pressed });
        Ok(())
    }

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), OutputError> {
        self.push(OutputEvent::Button { button, pressed });
        Ok(())
    }

    fn scroll(&mut self, amount: i32) -> Result<(), OutputError> {
        self.push(OutputEvent::Scroll(amount));
        Ok(())
    }

    fn start_program(&mut self, program: &str, args: &str) -> Result<(), OutputError> {
        self.push(OutputEvent::Program(crate::security::command_line(program, args)));
        Ok(())
    }

    fn confirm_command(&mut self, _command: &str) -> bool {
        *self.confirm.lock()
    }
}
