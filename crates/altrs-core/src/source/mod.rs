// Altrs Input Sources
// Uniform polling contract shared by mouse, keyboard, custom window and
// internal sources

pub mod backend;
pub mod custom_window;
pub mod devices;
pub mod internal;
pub mod keyboard;
pub mod mouse;

#[cfg(feature = "evdev")]
pub mod evdev_backend;

use std::collections::HashSet;
use std::time::Instant;

use smallvec::SmallVec;
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::AppConfig;
use crate::event::{EventArgs, EventId, EventReport, ReportPayload};
use crate::ids::ItemId;
use crate::item::Named;
use crate::profile::ScreenRegion;

pub use backend::{InputBackend, ManualBackend};
pub use custom_window::CustomWindowSource;
pub use internal::{InternalChange, InternalSource};
pub use keyboard::KeyboardSource;
pub use mouse::MouseSource;

#[cfg(feature = "evdev")]
pub use evdev_backend::{DeviceInfo, EvdevBackend};

/// Error types for source polling
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Backend query failed: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Kind of input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum SourceType {
    Mouse,
    Keyboard,
    CustomWindow,
    Internal,
}

/// Profile description of an input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub id: ItemId,
    pub name: String,
    pub source_type: SourceType,
}

impl SourceSpec {
    pub fn new(id: ItemId, name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            id,
            name: name.into(),
            source_type,
        }
    }
}

impl Named for SourceSpec {
    fn id(&self) -> ItemId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// What a source may read while polling
pub struct PollContext<'a> {
    pub now: Instant,
    pub config: &'a AppConfig,
    pub regions: &'a [ScreenRegion],
    pub backend: &'a mut dyn InputBackend,
}

/// Collects the events and reports raised during one poll.
///
/// Events keep the order they were raised in.
#[derive(Debug, Default)]
pub struct EventSink {
    events: SmallVec<[EventArgs; 8]>,
    reports: Vec<EventReport>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, args: EventArgs) {
        self.events.push(args);
    }

    pub fn report(&mut self, payload: ReportPayload) {
        self.reports.push(EventReport::new(payload));
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn take_events(&mut self) -> SmallVec<[EventArgs; 8]> {
        std::mem::take(&mut self.events)
    }

    pub fn take_reports(&mut self) -> Vec<EventReport> {
        std::mem::take(&mut self.reports)
    }
}

/// Polling contract of every input source.
///
/// `update_state` is called once per tick. The source samples its input,
/// compares it with the previous sample and raises one event per change.
/// A disconnected source keeps sampling but raises nothing.
pub trait InputSource: Send {
    fn id(&self) -> ItemId;

    fn source_type(&self) -> SourceType;

    /// Enable or disable event raising
    fn connect(&mut self, enable: bool);

    fn is_connected(&self) -> bool;

    fn update_state(
        &mut self,
        ctx: &mut PollContext<'_>,
        sink: &mut EventSink,
    ) -> Result<(), SourceError>;

    /// Fold an event produced elsewhere (e.g. a UI click) into the source's
    /// state as if it had been polled
    fn receive_external_event(&mut self, _args: &EventArgs) {}

    /// Event ids the current action set maps for this source
    fn set_monitored(&mut self, _events: &HashSet<EventId>) {}

    /// Clear per-run state when polling ends
    fn teardown(&mut self) {}
}

/// Build the source a profile entry describes.
///
/// The internal source is owned by the state manager and never built here.
pub fn create_source(spec: &SourceSpec) -> Option<Box<dyn InputSource>> {
    match spec.source_type {
        SourceType::Mouse => Some(Box::new(MouseSource::new(spec.id))),
        SourceType::Keyboard => Some(Box::new(KeyboardSource::new(spec.id))),
        SourceType::CustomWindow => Some(Box::new(CustomWindowSource::new(spec.id))),
        SourceType::Internal => None,
    }
}
