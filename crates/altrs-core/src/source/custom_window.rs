// Altrs Custom Window Source
// On-screen buttons clicked in the UI and fed back through the thread manager

use std::collections::BTreeSet;

use crate::event::{ControlType, EventArgs, EventReason};
use crate::ids::ItemId;

use super::{EventSink, InputSource, PollContext, SourceError, SourceType};

/// Buttons only change state when the UI submits an event for them.
/// Changes are queued and raised in submission order on the next poll, so a
/// press and release submitted within one tick still produce both events.
#[derive(Debug)]
pub struct CustomWindowSource {
    id: ItemId,
    connected: bool,
    /// Changes submitted by the UI since the last poll (button, down)
    pending: Vec<(u32, bool)>,
    pressed: BTreeSet<u32>,
}

impl CustomWindowSource {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            connected: false,
            pending: Vec::new(),
            pressed: BTreeSet::new(),
        }
    }

    pub fn is_pressed(&self, button_id: u32) -> bool {
        self.pressed.contains(&button_id)
    }
}

impl InputSource for CustomWindowSource {
    fn id(&self) -> ItemId {
        self.id
    }

    fn source_type(&self) -> SourceType {
        SourceType::CustomWindow
    }

    fn connect(&mut self, enable: bool) {
        self.connected = enable;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn update_state(
        &mut self,
        _ctx: &mut PollContext<'_>,
        sink: &mut EventSink,
    ) -> Result<(), SourceError> {
        for (button, down) in std::mem::take(&mut self.pending) {
            // Repeated presses or releases change nothing
            let changed = if down {
                self.pressed.insert(button)
            } else {
                self.pressed.remove(&button)
            };
            if !changed || !self.connected {
                continue;
            }
            let reason = if down {
                EventReason::Pressed
            } else {
                EventReason::Released
            };
            sink.raise(EventArgs::new(self.id, ControlType::CustomButton, button, reason));
        }
        Ok(())
    }

    fn receive_external_event(&mut self, args: &EventArgs) {
        if args.source_id != self.id || args.control_type != ControlType::CustomButton {
            return;
        }
        match args.reason {
            EventReason::Pressed => self.pending.push((args.control_data, true)),
            EventReason::Released => self.pending.push((args.control_data, false)),
            other => log::debug!("Custom window ignores {} events", other),
        }
    }

    fn teardown(&mut self) {
        self.pending.clear();
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::source::ManualBackend;
    use std::time::Instant;

    fn poll(source: &mut CustomWindowSource) -> Vec<EventArgs> {
        let config = AppConfig::default();
        let mut backend = ManualBackend::new();
        let mut ctx = PollContext {
            now: Instant::now(),
            config: &config,
            regions: &[],
            backend: &mut backend,
        };
        let mut sink = EventSink::new();
        source.update_state(&mut ctx, &mut sink).unwrap();
        sink.take_events().into_vec()
    }

    fn click(source_id: ItemId, button: u32, reason: EventReason) -> EventArgs {
        EventArgs::new(source_id, ControlType::CustomButton, button, reason)
    }

    #[test]
    fn test_click_is_raised_on_next_poll() {
        let mut source = CustomWindowSource::new(3);
        source.connect(true);

        source.receive_external_event(&click(3, 7, EventReason::Pressed));
        assert!(!source.is_pressed(7));

        let events = poll(&mut source);
        assert_eq!(events, vec![click(3, 7, EventReason::Pressed)]);
        assert!(source.is_pressed(7));

        source.receive_external_event(&click(3, 7, EventReason::Released));
        assert_eq!(poll(&mut source), vec![click(3, 7, EventReason::Released)]);
    }

    #[test]
    fn test_tap_within_one_tick_raises_both() {
        let mut source = CustomWindowSource::new(3);
        source.connect(true);
        source.receive_external_event(&click(3, 1, EventReason::Pressed));
        source.receive_external_event(&click(3, 1, EventReason::Released));
        assert_eq!(
            poll(&mut source),
            vec![click(3, 1, EventReason::Pressed), click(3, 1, EventReason::Released)]
        );
        assert!(!source.is_pressed(1));
        assert!(poll(&mut source).is_empty());
    }

    #[test]
    fn test_repeated_press_raises_once() {
        let mut source = CustomWindowSource::new(3);
        source.connect(true);
        source.receive_external_event(&click(3, 2, EventReason::Pressed));
        source.receive_external_event(&click(3, 2, EventReason::Pressed));
        assert_eq!(poll(&mut source), vec![click(3, 2, EventReason::Pressed)]);
        source.receive_external_event(&click(3, 2, EventReason::Pressed));
        assert!(poll(&mut source).is_empty());
    }

    #[test]
    fn test_other_sources_ignored() {
        let mut source = CustomWindowSource::new(3);
        source.connect(true);
        source.receive_external_event(&click(4, 1, EventReason::Pressed));
        source.receive_external_event(&EventArgs::new(
            3,
            ControlType::Keyboard,
            30,
            EventReason::Pressed,
        ));
        assert!(poll(&mut source).is_empty());
    }
}
