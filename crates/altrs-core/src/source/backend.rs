// Altrs Input Backend
// Raw OS state the sources sample each tick

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::key::{Key, MouseButton};
use crate::window::{Point, Rect, WindowInfo};

use super::SourceError;

/// Supplies the raw input state sources diff against.
///
/// Coordinates are in screen pixels.
pub trait InputBackend: Send {
    /// Pointer position, `None` when no pointing device reports one
    fn pointer(&mut self) -> Result<Option<Point>, SourceError>;

    fn pressed_keys(&mut self) -> Result<BTreeSet<Key>, SourceError>;

    fn pressed_buttons(&mut self) -> Result<BTreeSet<MouseButton>, SourceError>;

    fn active_window(&mut self) -> Result<Option<WindowInfo>, SourceError>;

    fn screen_rect(&self) -> Rect;

    fn dpi_scale(&self) -> f64 {
        1.0
    }
}

#[derive(Debug)]
struct ManualState {
    pointer: Option<Point>,
    keys: BTreeSet<Key>,
    buttons: BTreeSet<MouseButton>,
    window: Option<WindowInfo>,
    screen: Rect,
    dpi_scale: f64,
    failing: bool,
    pointer_failing: bool,
}

impl Default for ManualState {
    fn default() -> Self {
        Self {
            pointer: None,
            keys: BTreeSet::new(),
            buttons: BTreeSet::new(),
            window: None,
            screen: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            dpi_scale: 1.0,
            failing: false,
            pointer_failing: false,
        }
    }
}

/// Backend whose state is set by hand.
///
/// Clones share the same state, so a test (or a headless driver) can keep a
/// handle while the state manager owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualBackend {
    state: Arc<Mutex<ManualState>>,
}

impl ManualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pointer(&self, point: Option<Point>) {
        self.state.lock().pointer = point;
    }

    pub fn press_key(&self, key: Key) {
        self.state.lock().keys.insert(key);
    }

    pub fn release_key(&self, key: Key) {
        self.state.lock().keys.remove(&key);
    }

    pub fn press_button(&self, button: MouseButton) {
        self.state.lock().buttons.insert(button);
    }

    pub fn release_button(&self, button: MouseButton) {
        self.state.lock().buttons.remove(&button);
    }

    pub fn set_active_window(&self, window: Option<WindowInfo>) {
        self.state.lock().window = window;
    }

    pub fn set_screen(&self, screen: Rect) {
        self.state.lock().screen = screen;
    }

    pub fn set_dpi_scale(&self, scale: f64) {
        self.state.lock().dpi_scale = scale;
    }

    /// Make every query fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Make only pointer queries fail until cleared
    pub fn set_pointer_failing(&self, failing: bool) {
        self.state.lock().pointer_failing = failing;
    }

    fn check(&self) -> Result<(), SourceError> {
        if self.state.lock().failing {
            return Err(SourceError::Backend("manual backend set to fail".into()));
        }
        Ok(())
    }
}

impl InputBackend for ManualBackend {
    fn pointer(&mut self) -> Result<Option<Point>, SourceError> {
        self.check()?;
        let state = self.state.lock();
        if state.pointer_failing {
            return Err(SourceError::Backend("pointer query set to fail".into()));
        }
        Ok(state.pointer)
    }

    fn pressed_keys(&mut self) -> Result<BTreeSet<Key>, SourceError> {
        self.check()?;
        Ok(self.state.lock().keys.clone())
    }

    fn pressed_buttons(&mut self) -> Result<BTreeSet<MouseButton>, SourceError> {
        self.check()?;
        Ok(self.state.lock().buttons.clone())
    }

    fn active_window(&mut self) -> Result<Option<WindowInfo>, SourceError> {
        self.check()?;
        Ok(self.state.lock().window.clone())
    }

    fn screen_rect(&self) -> Rect {
        self.state.lock().screen
    }

    fn dpi_scale(&self) -> f64 {
        self.state.lock().dpi_scale
    }
}
