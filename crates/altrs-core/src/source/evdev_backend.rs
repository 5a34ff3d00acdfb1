// Altrs Evdev Backend
// Samples keyboards and pointing devices through /dev/input

use std::collections::BTreeSet;

use evdev::{AbsoluteAxisType, Device, EventType, RelativeAxisType};

use crate::key::{Key, MouseButton};
use crate::window::{Point, Rect, WindowInfo};

use super::devices::{is_keyboard, is_pointer, matches_device_filter, DeviceCapabilities};
use super::{InputBackend, SourceError};

/// A device found by [`EvdevBackend::list_devices`]
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub path: String,
    pub keyboard: bool,
    pub pointer: bool,
}

/// Reads key, button and absolute pointer state straight from the kernel.
///
/// Devices are never grabbed, so input keeps reaching other applications.
/// Only devices with absolute axes give a pointer position. Evdev has no
/// notion of windows, so `active_window` is always `None`.
pub struct EvdevBackend {
    devices: Vec<Device>,
    screen: Rect,
}

fn capabilities(device: &Device) -> DeviceCapabilities {
    let has_ev_key = device.supported_events().contains(EventType::KEY);
    let supported_keys = device
        .supported_keys()
        .map(|keys| keys.iter().map(|k| k.code()).collect())
        .unwrap_or_default();
    let has_abs_xy = device.supported_absolute_axes().is_some_and(|axes| {
        axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
    });
    let has_rel_xy = device.supported_relative_axes().is_some_and(|axes| {
        axes.contains(RelativeAxisType::REL_X) && axes.contains(RelativeAxisType::REL_Y)
    });
    DeviceCapabilities::new(has_ev_key, supported_keys).with_axes(has_abs_xy, has_rel_xy)
}

impl EvdevBackend {
    /// Open every device matching `filter_names` (all keyboards and
    /// pointers when empty)
    pub fn open(filter_names: &[String], screen: Rect) -> Result<Self, SourceError> {
        let mut devices = Vec::new();
        for (path, device) in evdev::enumerate() {
            let name = device.name().unwrap_or("Unknown").to_string();
            let path = path.to_str().unwrap_or_default().to_string();
            if matches_device_filter(&name, &path, filter_names, &capabilities(&device)) {
                log::info!("Using input device {} ({})", name, path);
                devices.push(device);
            }
        }

        if devices.is_empty() {
            return Err(SourceError::Backend("No input devices found".to_string()));
        }
        Ok(Self { devices, screen })
    }

    pub fn list_devices() -> Vec<DeviceInfo> {
        evdev::enumerate()
            .map(|(path, device)| {
                let caps = capabilities(&device);
                DeviceInfo {
                    name: device.name().unwrap_or("Unknown").to_string(),
                    path: path.to_string_lossy().into_owned(),
                    keyboard: is_keyboard(&caps),
                    pointer: is_pointer(&caps),
                }
            })
            .collect()
    }

    fn key_codes(&mut self) -> Result<BTreeSet<u16>, SourceError> {
        let mut codes = BTreeSet::new();
        for device in &mut self.devices {
            let state = device.get_key_state()?;
            codes.extend(state.iter().map(|k| k.code()));
        }
        Ok(codes)
    }
}

impl InputBackend for EvdevBackend {
    fn pointer(&mut self) -> Result<Option<Point>, SourceError> {
        for device in &mut self.devices {
            let has_abs = device.supported_absolute_axes().is_some_and(|axes| {
                axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
            });
            if !has_abs {
                continue;
            }
            let state = device.get_abs_state()?;
            let x = &state[AbsoluteAxisType::ABS_X.0 as usize];
            let y = &state[AbsoluteAxisType::ABS_Y.0 as usize];
            if x.maximum <= x.minimum || y.maximum <= y.minimum {
                continue;
            }
            let fx = f64::from(x.value - x.minimum) / f64::from(x.maximum - x.minimum);
            let fy = f64::from(y.value - y.minimum) / f64::from(y.maximum - y.minimum);
            return Ok(Some(Point::new(
                self.screen.left + fx * self.screen.width,
                self.screen.top + fy * self.screen.height,
            )));
        }
        Ok(None)
    }

    fn pressed_keys(&mut self) -> Result<BTreeSet<Key>, SourceError> {
        Ok(self
            .key_codes()?
            .into_iter()
            .filter(|&code| code < 0x100)
            .map(Key::from)
            .collect())
    }

    fn pressed_buttons(&mut self) -> Result<BTreeSet<MouseButton>, SourceError> {
        Ok(self
            .key_codes()?
            .into_iter()
            .filter_map(MouseButton::from_evdev_code)
            .collect())
    }

    fn active_window(&mut self) -> Result<Option<WindowInfo>, SourceError> {
        Ok(None)
    }

    fn screen_rect(&self) -> Rect {
        self.screen
    }
}
