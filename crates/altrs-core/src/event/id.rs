// Altrs Event Id
// Packs an event's identity into a single i64 table key
//
// Layout (most significant first):
//   bit 63      always 0
//   bits 48-62  source id (15 bits)
//   bits 40-47  control type
//   bits 8-39   control data (32 bits)
//   bits 0-7    event reason

use std::fmt;

use crate::ids::ItemId;

use super::args::{ControlType, EventReason};

/// Largest source id that survives packing
pub const MAX_SOURCE_ID: ItemId = 0x7FFF;

const SOURCE_SHIFT: u32 = 48;
const CONTROL_TYPE_SHIFT: u32 = 40;
const CONTROL_DATA_SHIFT: u32 = 8;

/// Decoded parts of an [`EventId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventParts {
    pub source_id: ItemId,
    pub control_type: ControlType,
    pub control_data: u32,
    pub reason: EventReason,
}

/// Packed event identity used as the action-mapping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub i64);

impl EventId {
    /// Pack an event identity.
    ///
    /// Source ids outside `0..=MAX_SOURCE_ID` are masked and will not decode
    /// to the same value; profiles never hand out such ids.
    pub fn encode(
        source_id: ItemId,
        control_type: ControlType,
        control_data: u32,
        reason: EventReason,
    ) -> Self {
        let source = (source_id & MAX_SOURCE_ID) << SOURCE_SHIFT;
        let ct = (control_type as i64) << CONTROL_TYPE_SHIFT;
        let data = (control_data as i64) << CONTROL_DATA_SHIFT;
        EventId(source | ct | data | reason as i64)
    }

    /// Unpack an event identity. Returns `None` for bytes that name no
    /// control type or reason.
    pub fn decode(self) -> Option<EventParts> {
        let raw = self.0;
        if raw < 0 {
            return None;
        }
        let source_id = (raw >> SOURCE_SHIFT) & MAX_SOURCE_ID;
        let control_type = ControlType::from_u8(((raw >> CONTROL_TYPE_SHIFT) & 0xFF) as u8)?;
        let control_data = ((raw >> CONTROL_DATA_SHIFT) & 0xFFFF_FFFF) as u32;
        let reason = EventReason::from_u8((raw & 0xFF) as u8)?;
        Some(EventParts {
            source_id,
            control_type,
            control_data,
            reason,
        })
    }

    /// The id of the same control with another reason
    pub fn with_reason(self, reason: EventReason) -> Self {
        EventId((self.0 & !0xFF) | reason as i64)
    }

    pub fn reason(self) -> Option<EventReason> {
        EventReason::from_u8((self.0 & 0xFF) as u8)
    }

    pub fn source_id(self) -> ItemId {
        (self.0 >> SOURCE_SHIFT) & MAX_SOURCE_ID
    }

    pub fn control_type(self) -> Option<ControlType> {
        ControlType::from_u8(((self.0 >> CONTROL_TYPE_SHIFT) & 0xFF) as u8)
    }

    pub fn control_data(self) -> u32 {
        ((self.0 >> CONTROL_DATA_SHIFT) & 0xFFFF_FFFF) as u32
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_round_trip_over_ranges() {
        let sources = [0, 1, 2, 255, 4096, MAX_SOURCE_ID];
        let data = [0u32, 1, 30, 0x110, 0xFFFF, 0x8000_0000, u32::MAX];
        for source_id in sources {
            for control_type in ControlType::iter() {
                for control_data in data {
                    for reason in EventReason::iter() {
                        let id = EventId::encode(source_id, control_type, control_data, reason);
                        assert!(id.0 >= 0);
                        assert_eq!(
                            id.decode(),
                            Some(EventParts {
                                source_id,
                                control_type,
                                control_data,
                                reason,
                            })
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_equal_tuples_encode_equal() {
        let a = EventId::encode(3, ControlType::Keyboard, 30, EventReason::Pressed);
        let b = EventId::encode(3, ControlType::Keyboard, 30, EventReason::Pressed);
        let c = EventId::encode(3, ControlType::Keyboard, 30, EventReason::Released);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_with_reason_keeps_control() {
        let pressed = EventId::encode(2, ControlType::MouseButton, 1, EventReason::Pressed);
        let released = pressed.with_reason(EventReason::Released);
        assert_eq!(
            released,
            EventId::encode(2, ControlType::MouseButton, 1, EventReason::Released)
        );
        assert_eq!(released.reason(), Some(EventReason::Released));
        assert_eq!(released.source_id(), 2);
        assert_eq!(released.control_type(), Some(ControlType::MouseButton));
        assert_eq!(released.control_data(), 1);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(EventId(-5).decode(), None);
        assert_eq!(EventId(0xFF).decode(), None);
    }
}
