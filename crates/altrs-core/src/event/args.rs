// Altrs Event Arguments
// Identity of a raised input event: source, control and reason

use std::fmt;

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::ids::ItemId;
use crate::window::Point;

use super::id::EventId;

/// Kind of control an event was raised for
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum ControlType {
    None = 0,
    /// The pointer itself (control data unused)
    MousePointer = 1,
    /// A mouse button (control data = button code)
    MouseButton = 2,
    /// A keyboard key (control data = key code)
    Keyboard = 3,
    /// A screen region (control data = region id)
    Region = 4,
    /// An on-screen button of a custom window (control data = button id)
    CustomButton = 5,
    /// Internal state such as the active window
    Internal = 6,
}

impl ControlType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ControlType::None),
            1 => Some(ControlType::MousePointer),
            2 => Some(ControlType::MouseButton),
            3 => Some(ControlType::Keyboard),
            4 => Some(ControlType::Region),
            5 => Some(ControlType::CustomButton),
            6 => Some(ControlType::Internal),
            _ => None,
        }
    }
}

/// Why an event was raised
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum EventReason {
    None = 0,
    Pressed = 1,
    Released = 2,
    Moved = 3,
    Updated = 4,
    Dwelled = 5,
    Inside = 6,
    Outside = 7,
}

impl EventReason {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(EventReason::None),
            1 => Some(EventReason::Pressed),
            2 => Some(EventReason::Released),
            3 => Some(EventReason::Moved),
            4 => Some(EventReason::Updated),
            5 => Some(EventReason::Dwelled),
            6 => Some(EventReason::Inside),
            7 => Some(EventReason::Outside),
            _ => None,
        }
    }
}

/// Extra data carried by an event that is not part of its identity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EventValue {
    #[default]
    None,
    /// Normalised pointer position
    Position(Point),
}

/// A raised input event.
///
/// `source_id`, `control_type`, `control_data` and `reason` form the event's
/// identity (see [`EventId`]); `value` is payload only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventArgs {
    pub source_id: ItemId,
    pub control_type: ControlType,
    pub control_data: u32,
    pub reason: EventReason,
    pub value: EventValue,
}

impl EventArgs {
    pub fn new(
        source_id: ItemId,
        control_type: ControlType,
        control_data: u32,
        reason: EventReason,
    ) -> Self {
        Self {
            source_id,
            control_type,
            control_data,
            reason,
            value: EventValue::None,
        }
    }

    pub fn with_value(mut self, value: EventValue) -> Self {
        self.value = value;
        self
    }

    /// Same control, different reason, no payload
    pub fn with_reason(&self, reason: EventReason) -> Self {
        Self::new(self.source_id, self.control_type, self.control_data, reason)
    }

    /// Packed table key for this event
    pub fn event_id(&self) -> EventId {
        EventId::encode(
            self.source_id,
            self.control_type,
            self.control_data,
            self.reason,
        )
    }

    /// Position payload, if any
    pub fn position(&self) -> Option<Point> {
        match self.value {
            EventValue::Position(p) => Some(p),
            EventValue::None => None,
        }
    }
}

impl fmt::Display for EventArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source {} {}:{} {}",
            self.source_id, self.control_type, self.control_data, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_enum_byte_round_trip() {
        for ct in ControlType::iter() {
            assert_eq!(ControlType::from_u8(ct as u8), Some(ct));
        }
        for reason in EventReason::iter() {
            assert_eq!(EventReason::from_u8(reason as u8), Some(reason));
        }
        assert_eq!(ControlType::from_u8(200), None);
        assert_eq!(EventReason::from_u8(8), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(EventReason::Dwelled.to_string(), "Dwelled");
        assert_eq!("Region".parse::<ControlType>(), Ok(ControlType::Region));
    }

    #[test]
    fn test_with_reason_drops_payload() {
        let moved = EventArgs::new(1, ControlType::Region, 3, EventReason::Inside)
            .with_value(EventValue::Position(Point::new(0.2, 0.3)));
        assert_eq!(moved.position(), Some(Point::new(0.2, 0.3)));

        let out = moved.with_reason(EventReason::Outside);
        assert_eq!(out.reason, EventReason::Outside);
        assert_eq!(out.control_data, 3);
        assert_eq!(out.position(), None);
    }
}
