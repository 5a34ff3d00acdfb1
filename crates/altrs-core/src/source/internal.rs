// Altrs Internal Source
// Watches the active window for app switches and geometry changes

use crate::event::{ControlType, EventArgs, EventReason, ReportPayload};
use crate::ids::ItemId;
use crate::window::{Rect, WindowInfo};

use super::{EventSink, InputSource, PollContext, SourceError, SourceType};

/// Control data of the event raised when the focused window changes
pub const ACTIVE_WINDOW_CONTROL: u32 = 1;
/// Control data of the event raised when the focused window moves or resizes
pub const WINDOW_RECT_CONTROL: u32 = 2;

/// A change the state manager has to act on
#[derive(Debug, Clone, PartialEq)]
pub enum InternalChange {
    /// A different window (or none) has focus
    ActiveWindow(Option<WindowInfo>),
    /// The focused window's rectangle changed
    WindowRect(Option<Rect>),
}

#[derive(Debug)]
pub struct InternalSource {
    id: ItemId,
    connected: bool,
    sampled: bool,
    window: Option<WindowInfo>,
    changes: Vec<InternalChange>,
}

impl InternalSource {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            connected: false,
            sampled: false,
            window: None,
            changes: Vec::new(),
        }
    }

    /// Focused window from the last poll
    pub fn active_window(&self) -> Option<&WindowInfo> {
        self.window.as_ref()
    }

    pub fn take_changes(&mut self) -> Vec<InternalChange> {
        std::mem::take(&mut self.changes)
    }

    fn raise(&self, sink: &mut EventSink, control: u32) {
        if self.connected {
            sink.raise(EventArgs::new(
                self.id,
                ControlType::Internal,
                control,
                EventReason::Updated,
            ));
        }
    }
}

impl InputSource for InternalSource {
    fn id(&self) -> ItemId {
        self.id
    }

    fn source_type(&self) -> SourceType {
        SourceType::Internal
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
        let current = ctx.backend.active_window()?;

        let identity_changed = match (&self.window, &current) {
            (Some(old), Some(new)) => !old.same_identity(new),
            (None, None) => false,
            _ => true,
        };
        let old_rect = self.window.as_ref().and_then(|w| w.rect);
        let new_rect = current.as_ref().and_then(|w| w.rect);

        if identity_changed || !self.sampled {
            log::debug!(
                "Active window: {:?}",
                current.as_ref().and_then(|w| w.wm_class.as_deref())
            );
            self.changes.push(InternalChange::ActiveWindow(current.clone()));
            self.raise(sink, ACTIVE_WINDOW_CONTROL);
        }
        if old_rect != new_rect || !self.sampled {
            self.changes.push(InternalChange::WindowRect(new_rect));
            sink.report(ReportPayload::WindowRegionEvent { rect: new_rect });
            self.raise(sink, WINDOW_RECT_CONTROL);
        }

        self.window = current;
        self.sampled = true;
        Ok(())
    }

    fn teardown(&mut self) {
        self.window = None;
        self.sampled = false;
        self.changes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::source::ManualBackend;
    use std::time::Instant;

    fn poll(source: &mut InternalSource, backend: &mut ManualBackend) -> EventSink {
        let config = AppConfig::default();
        let mut ctx = PollContext {
            now: Instant::now(),
            config: &config,
            regions: &[],
            backend,
        };
        let mut sink = EventSink::new();
        source.update_state(&mut ctx, &mut sink).unwrap();
        sink
    }

    fn window(class: &str) -> WindowInfo {
        WindowInfo::with_details(Some(class.to_string()), Some("title".to_string()))
    }

    #[test]
    fn test_first_poll_reports_current_window() {
        let handle = ManualBackend::new();
        let mut backend = handle.clone();
        handle.set_active_window(Some(window("firefox")));

        let mut source = InternalSource::new(5);
        poll(&mut source, &mut backend);
        assert_eq!(
            source.take_changes(),
            vec![
                InternalChange::ActiveWindow(Some(window("firefox"))),
                InternalChange::WindowRect(None),
            ]
        );

        poll(&mut source, &mut backend);
        assert!(source.take_changes().is_empty());
    }

    #[test]
    fn test_app_switch_and_move() {
        let handle = ManualBackend::new();
        let mut backend = handle.clone();
        handle.set_active_window(Some(window("firefox")));
        let mut source = InternalSource::new(5);
        source.connect(true);
        poll(&mut source, &mut backend);
        source.take_changes();

        handle.set_active_window(Some(window("kitty")));
        let mut sink = poll(&mut source, &mut backend);
        assert_eq!(
            source.take_changes(),
            vec![InternalChange::ActiveWindow(Some(window("kitty")))]
        );
        let events = sink.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].control_type, ControlType::Internal);
        assert_eq!(events[0].control_data, ACTIVE_WINDOW_CONTROL);

        let rect = Rect::new(10.0, 10.0, 400.0, 300.0);
        handle.set_active_window(Some(window("kitty").with_rect(rect)));
        let mut sink = poll(&mut source, &mut backend);
        assert_eq!(
            source.take_changes(),
            vec![InternalChange::WindowRect(Some(rect))]
        );
        assert_eq!(
            sink.take_reports()[0].payload,
            ReportPayload::WindowRegionEvent { rect: Some(rect) }
        );
    }
}
