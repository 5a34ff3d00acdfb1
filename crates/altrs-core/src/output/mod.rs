// Altrs Output Layer
// Simulated input injection and held-input tracking

pub mod simulator;
pub mod state;

#[cfg(feature = "evdev")]
pub mod uinput;

pub use simulator::{
    spawn_program, InputSimulator, LogSimulator, OutputError, OutputEvent, RecordingSimulator,
};
pub use state::HeldInputs;

#[cfg(feature = "evdev")]
pub use uinput::UinputSimulator;
