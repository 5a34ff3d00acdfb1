// Altrs uinput Output
// Virtual keyboard/mouse device that injects simulated input

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, RelativeAxisType};

use super::simulator::{spawn_program, InputSimulator, OutputError};
use crate::key::{Key, MouseButton};
use strum::IntoEnumIterator;

/// Simulator backed by a uinput virtual device
pub struct UinputSimulator {
    device: VirtualDevice,
}

impl UinputSimulator {
    /// Create the virtual device. Needs write access to /dev/uinput.
    pub fn new() -> Result<Self, OutputError> {
        let mut keys = AttributeSet::<evdev::Key>::new();
        for code in 0..256u16 {
            keys.insert(evdev::Key::new(code));
        }
        for button in MouseButton::iter() {
            keys.insert(evdev::Key::new(button.evdev_code()));
        }

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_WHEEL);

        let device = VirtualDeviceBuilder::new()?
            .name("Altrs (virtual) Input")
            .with_keys(&keys)?
            .with_relative_axes(&axes)?
            .build()?;

        log::debug!("Created uinput virtual device");
        Ok(Self { device })
    }

    fn emit(&mut self, event: InputEvent) -> Result<(), OutputError> {
        // SYN is required for the kernel to process the event
        let syn = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        self.device
            .emit(&[event, syn])
            .map_err(|e: std::io::Error| OutputError::Write(e.to_string()))
    }
}

impl InputSimulator for UinputSimulator {
    fn key(&mut self, key: Key, pressed: bool) -> Result<(), OutputError> {
        self.emit(InputEvent::new(EventType::KEY, key.code(), pressed as i32))
    }

    fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), OutputError> {
        self.emit(InputEvent::new(
            EventType::KEY,
            button.evdev_code(),
            pressed as i32,
        ))
    }

    fn scroll(&mut self, amount: i32) -> Result<(), OutputError> {
        self.emit(InputEvent::new(
            EventType::RELATIVE,
            RelativeAxisType::REL_WHEEL.0,
            amount,
        ))
    }

    fn start_program(&mut self, program: &str, args: &str) -> Result<(), OutputError> {
        spawn_program(program, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires root privileges
    fn test_virtual_device_creation() {
        let result = UinputSimulator::new();
        if let Err(e) = &result {
            eprintln!("Virtual device creation failed (expected without root): {}", e);
        }
    }
}
