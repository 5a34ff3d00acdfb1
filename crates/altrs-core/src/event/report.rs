// Altrs Event Reports
// Notifications sent from the polling thread to the UI thread

use std::time::SystemTime;

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::ids::ItemId;
use crate::key::{Key, MouseButton};
use crate::state::LogicalState;
use crate::window::Rect;

use super::args::{EventArgs, EventReason};

/// Kind of an [`EventReport`], derived from its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum EventType {
    Control,
    StateChange,
    ProfileChange,
    KeyEvent,
    ToggleKeyEvent,
    RegionEvent,
    MouseButtonEvent,
    MouseScrollEvent,
    WindowRegionEvent,
    MenuOptionEvent,
}

/// Requests an action can make of the UI's menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum MenuOption {
    Open,
    Close,
    Next,
    Previous,
    Select,
}

/// Typed payload of a report
#[derive(Debug, Clone, PartialEq)]
pub enum ReportPayload {
    /// A raw input event (only reported when diagnostics are enabled)
    Control(EventArgs),
    StateChange {
        previous: LogicalState,
        current: LogicalState,
        mode_name: String,
        app_name: String,
        page_name: String,
    },
    ProfileChange {
        name: String,
    },
    KeyEvent {
        key: Key,
        pressed: bool,
    },
    ToggleKeyEvent {
        key: Key,
        on: bool,
    },
    RegionEvent {
        region_id: ItemId,
        reason: EventReason,
    },
    MouseButtonEvent {
        button: MouseButton,
        pressed: bool,
    },
    MouseScrollEvent {
        amount: i32,
    },
    WindowRegionEvent {
        rect: Option<Rect>,
    },
    MenuOptionEvent {
        option: MenuOption,
    },
}

/// A timestamped report
#[derive(Debug, Clone, PartialEq)]
pub struct EventReport {
    pub timestamp: SystemTime,
    pub payload: ReportPayload,
}

impl EventReport {
    pub fn new(payload: ReportPayload) -> Self {
        Self {
            timestamp: SystemTime::now(),
            payload,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self.payload {
            ReportPayload::Control(_) => EventType::Control,
            ReportPayload::StateChange { .. } => EventType::StateChange,
            ReportPayload::ProfileChange { .. } => EventType::ProfileChange,
            ReportPayload::KeyEvent { .. } => EventType::KeyEvent,
            ReportPayload::ToggleKeyEvent { .. } => EventType::ToggleKeyEvent,
            ReportPayload::RegionEvent { .. } => EventType::RegionEvent,
            ReportPayload::MouseButtonEvent { .. } => EventType::MouseButtonEvent,
            ReportPayload::MouseScrollEvent { .. } => EventType::MouseScrollEvent,
            ReportPayload::WindowRegionEvent { .. } => EventType::WindowRegionEvent,
            ReportPayload::MenuOptionEvent { .. } => EventType::MenuOptionEvent,
        }
    }
}
