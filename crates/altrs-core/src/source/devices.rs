// Altrs Device Detection
// Capability analysis and filtering of evdev input devices

use std::collections::HashSet;

/// Name prefix of the virtual device the output simulator creates
pub const VIRTUAL_DEVICE_PREFIX: &str = "Altrs (virtual)";

/// Capabilities read from an evdev device
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilities {
    /// Device supports EV_KEY events
    pub has_ev_key: bool,
    /// Device reports absolute X and Y axes
    pub has_abs_xy: bool,
    /// Device reports relative X and Y axes
    pub has_rel_xy: bool,
    /// Supported EV_KEY codes
    pub supported_keys: Vec<u16>,
}

impl DeviceCapabilities {
    pub fn new(has_ev_key: bool, supported_keys: Vec<u16>) -> Self {
        Self {
            has_ev_key,
            supported_keys,
            ..Default::default()
        }
    }

    pub fn with_axes(mut self, abs_xy: bool, rel_xy: bool) -> Self {
        self.has_abs_xy = abs_xy;
        self.has_rel_xy = rel_xy;
        self
    }

    pub fn supports_key(&self, key_code: u16) -> bool {
        self.supported_keys.contains(&key_code)
    }

    pub fn key_set(&self) -> HashSet<u16> {
        self.supported_keys.iter().copied().collect()
    }
}

// Q W E R T Y
const QWERTY_CODES: &[u16] = &[16, 17, 18, 19, 20, 21];

// SPACE, A, Z
const A_Z_SPACE_CODES: &[u16] = &[57, 30, 44];

const BTN_LEFT: u16 = 0x110;

/// A keyboard has EV_KEY plus the whole QWERTY row, A, Z and SPACE
pub fn is_keyboard(capabilities: &DeviceCapabilities) -> bool {
    if !capabilities.has_ev_key {
        return false;
    }

    let key_set = capabilities.key_set();
    let qwerty_present = QWERTY_CODES.iter().all(|code| key_set.contains(code));
    let az_present = A_Z_SPACE_CODES.iter().all(|code| key_set.contains(code));

    qwerty_present && az_present
}

/// A pointing device has a left button and either axis pair
pub fn is_pointer(capabilities: &DeviceCapabilities) -> bool {
    capabilities.has_ev_key
        && capabilities.supports_key(BTN_LEFT)
        && (capabilities.has_abs_xy || capabilities.has_rel_xy)
}

/// Devices we created ourselves must never be read back
pub fn is_virtual_device(name: &str, prefix: &str) -> bool {
    name.contains(prefix)
}

/// Decide whether a device should be opened.
///
/// With explicit `filter_names` only devices whose path or name is listed
/// are used, virtual or not. Otherwise every non-virtual keyboard or
/// pointing device is used.
pub fn matches_device_filter(
    device_name: &str,
    device_path: &str,
    filter_names: &[String],
    capabilities: &DeviceCapabilities,
) -> bool {
    if !filter_names.is_empty() {
        return filter_names
            .iter()
            .any(|wanted| device_path == wanted || device_name == wanted);
    }

    if is_virtual_device(device_name, VIRTUAL_DEVICE_PREFIX) {
        return false;
    }

    is_keyboard(capabilities) || is_pointer(capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard_caps() -> DeviceCapabilities {
        let mut keys = vec![0];
        keys.extend_from_slice(QWERTY_CODES);
        keys.extend_from_slice(A_Z_SPACE_CODES);
        keys.extend_from_slice(&[2, 3, 4, 5, 14, 15, 28, 29, 42, 56]);
        DeviceCapabilities::new(true, keys)
    }

    fn mouse_caps() -> DeviceCapabilities {
        DeviceCapabilities::new(true, vec![0x110, 0x111, 0x112]).with_axes(false, true)
    }

    #[test]
    fn test_keyboard_detection() {
        assert!(is_keyboard(&keyboard_caps()));
        assert!(!is_keyboard(&mouse_caps()));

        let mut partial = vec![0];
        partial.extend_from_slice(QWERTY_CODES);
        assert!(!is_keyboard(&DeviceCapabilities::new(true, partial)));

        assert!(!is_keyboard(&DeviceCapabilities::new(false, vec![])));
    }

    #[test]
    fn test_pointer_detection() {
        assert!(is_pointer(&mouse_caps()));
        assert!(!is_pointer(&keyboard_caps()));

        let tablet = DeviceCapabilities::new(true, vec![0x110]).with_axes(true, false);
        assert!(is_pointer(&tablet));

        let buttons_only = DeviceCapabilities::new(true, vec![0x110]);
        assert!(!is_pointer(&buttons_only));
    }

    #[test]
    fn test_filter_by_path_or_name() {
        let filter = vec!["/dev/input/event0".to_string(), "Pad".to_string()];
        let caps = DeviceCapabilities::default();
        assert!(matches_device_filter("Other", "/dev/input/event0", &filter, &caps));
        assert!(matches_device_filter("Pad", "/dev/input/event7", &filter, &caps));
        assert!(!matches_device_filter("Other", "/dev/input/event1", &filter, &caps));
    }

    #[test]
    fn test_autodetect() {
        let none: Vec<String> = vec![];
        assert!(matches_device_filter("Kbd", "/dev/input/event0", &none, &keyboard_caps()));
        assert!(matches_device_filter("Mouse", "/dev/input/event1", &none, &mouse_caps()));
        assert!(!matches_device_filter(
            "Power Button",
            "/dev/input/event2",
            &none,
            &DeviceCapabilities::new(true, vec![116])
        ));
    }

    #[test]
    fn test_virtual_device_excluded_unless_named() {
        let name = "Altrs (virtual) Input";
        let none: Vec<String> = vec![];
        assert!(!matches_device_filter(name, "/dev/input/event9", &none, &keyboard_caps()));

        let named = vec![name.to_string()];
        assert!(matches_device_filter(name, "/dev/input/event9", &named, &keyboard_caps()));
    }
}
