// Altrs Held Input State
// Tracks keys and buttons that are currently held down by our own output

use std::collections::BTreeSet;

use crate::key::{Key, MouseButton};

/// Keys and mouse buttons pressed through the simulator and not yet released.
///
/// Sorted sets keep release order deterministic.
#[derive(Debug, Clone, Default)]
pub struct HeldInputs {
    keys: BTreeSet<Key>,
    buttons: BTreeSet<MouseButton>,
}

impl HeldInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key(&mut self, key: Key) {
        self.keys.insert(key);
    }

    pub fn remove_key(&mut self, key: Key) {
        self.keys.remove(&key);
    }

    pub fn is_key_held(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn add_button(&mut self, button: MouseButton) {
        self.buttons.insert(button);
    }

    pub fn remove_button(&mut self, button: MouseButton) {
        self.buttons.remove(&button);
    }

    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn keys(&self) -> Vec<Key> {
        self.keys.iter().copied().collect()
    }

    pub fn buttons(&self) -> Vec<MouseButton> {
        self.buttons.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len() + self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.buttons.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.buttons.clear();
    }
}
