// Altrs Keyboard Source
// Raises Pressed/Released per key by diffing the backend's key set

use std::collections::BTreeSet;

use crate::event::{ControlType, EventArgs, EventReason};
use crate::ids::ItemId;
use crate::key::Key;

use super::{EventSink, InputSource, PollContext, SourceError, SourceType};

#[derive(Debug)]
pub struct KeyboardSource {
    id: ItemId,
    connected: bool,
    pressed: BTreeSet<Key>,
}

impl KeyboardSource {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            connected: false,
            pressed: BTreeSet::new(),
        }
    }

    fn raise(&self, sink: &mut EventSink, key: Key, reason: EventReason) {
        sink.raise(EventArgs::new(
            self.id,
            ControlType::Keyboard,
            key.code() as u32,
            reason,
        ));
    }
}

impl InputSource for KeyboardSource {
    fn id(&self) -> ItemId {
        self.id
    }

    fn source_type(&self) -> SourceType {
        SourceType::Keyboard
    }

    fn connect(&mut self, enable: bool) {
        self.connected = enable;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn update_state(
        &mut self,
        ctx: &mut PollContext<'_>,
        sink: &mut EventSink,
    ) -> Result<(), SourceError> {
        let now_pressed = ctx.backend.pressed_keys()?;

        if self.connected {
            for &key in now_pressed.difference(&self.pressed) {
                self.raise(sink, key, EventReason::Pressed);
            }
            for &key in self.pressed.difference(&now_pressed) {
                self.raise(sink, key, EventReason::Released);
            }
        }

        self.pressed = now_pressed;
        Ok(())
    }

    fn teardown(&mut self) {
        self.pressed.clear();
    }
}
