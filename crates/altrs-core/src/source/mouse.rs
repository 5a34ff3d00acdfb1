// Altrs Mouse Source
// Buttons, pointer motion, screen regions and dwell detection

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use crate::event::{ControlType, EventArgs, EventId, EventReason, EventValue, ReportPayload};
use crate::ids::ItemId;
use crate::key::MouseButton;
use crate::window::Point;

use super::{EventSink, InputSource, PollContext, SourceError, SourceType};

/// Where the pointer came to rest and since when
#[derive(Debug, Clone, Copy)]
struct DwellAnchor {
    point: Point,
    since: Instant,
    fired: bool,
}

#[derive(Debug)]
pub struct MouseSource {
    id: ItemId,
    connected: bool,
    buttons: BTreeSet<MouseButton>,
    /// Last pointer position, normalised to the screen
    pointer: Option<Point>,
    inside: BTreeSet<ItemId>,
    dwell: Option<DwellAnchor>,
    /// Dwell events the action set maps for this source
    dwell_ids: HashSet<EventId>,
}

impl MouseSource {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            connected: false,
            buttons: BTreeSet::new(),
            pointer: None,
            inside: BTreeSet::new(),
            dwell: None,
            dwell_ids: HashSet::new(),
        }
    }

    /// Normalised pointer position from the last poll
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn is_inside(&self, region_id: ItemId) -> bool {
        self.inside.contains(&region_id)
    }

    fn args(&self, control_type: ControlType, data: u32, reason: EventReason) -> EventArgs {
        EventArgs::new(self.id, control_type, data, reason)
    }

    fn diff_buttons(&mut self, now_pressed: BTreeSet<MouseButton>, sink: &mut EventSink) {
        if self.connected {
            for &button in now_pressed.difference(&self.buttons) {
                let args = self.args(ControlType::MouseButton, button.code(), EventReason::Pressed);
                sink.raise(args);
            }
            for &button in self.buttons.difference(&now_pressed) {
                let args = self.args(ControlType::MouseButton, button.code(), EventReason::Released);
                sink.raise(args);
            }
        }
        self.buttons = now_pressed;
    }

    fn diff_pointer(&mut self, ctx: &PollContext<'_>, point: Point, sink: &mut EventSink) {
        let moved = self.pointer != Some(point);
        self.pointer = Some(point);

        if moved && self.connected {
            sink.raise(
                self.args(ControlType::MousePointer, 0, EventReason::Moved)
                    .with_value(EventValue::Position(point)),
            );
        }

        for region in ctx.regions {
            let region_id = region.id;
            let data = region_id as u32;
            let now_inside = region.contains(&point);
            let was_inside = self.inside.contains(&region_id);

            let reason = match (was_inside, now_inside) {
                (false, true) => {
                    self.inside.insert(region_id);
                    Some(EventReason::Inside)
                }
                (true, false) => {
                    self.inside.remove(&region_id);
                    Some(EventReason::Outside)
                }
                (true, true) if moved => Some(EventReason::Updated),
                _ => None,
            };

            let Some(reason) = reason else { continue };
            if !self.connected {
                continue;
            }
            sink.raise(
                self.args(ControlType::Region, data, reason)
                    .with_value(EventValue::Position(point)),
            );
            if reason != EventReason::Updated {
                sink.report(ReportPayload::RegionEvent { region_id, reason });
            }
        }

        // Regions removed from the profile are no longer tracked
        self.inside
            .retain(|id| ctx.regions.iter().any(|region| region.id == *id));

        self.poll_dwell(ctx, point, sink);
    }

    fn poll_dwell(&mut self, ctx: &PollContext<'_>, point: Point, sink: &mut EventSink) {
        let radius = ctx.config.get_double(crate::config::keys::DWELL_RADIUS);
        let anchor = match self.dwell {
            Some(anchor) if anchor.point.distance(&point) <= radius => anchor,
            _ => {
                self.dwell = Some(DwellAnchor {
                    point,
                    since: ctx.now,
                    fired: false,
                });
                return;
            }
        };

        if anchor.fired || ctx.now.duration_since(anchor.since) < ctx.config.dwell_time() {
            return;
        }
        self.dwell = Some(DwellAnchor { fired: true, ..anchor });

        if !self.connected {
            return;
        }

        let pointer_dwell = self.args(ControlType::MousePointer, 0, EventReason::Dwelled);
        if self.dwell_ids.contains(&pointer_dwell.event_id()) {
            sink.raise(pointer_dwell.with_value(EventValue::Position(point)));
        }
        for region in ctx.regions.iter().filter(|r| self.inside.contains(&r.id)) {
            let args = self.args(ControlType::Region, region.id as u32, EventReason::Dwelled);
            if self.dwell_ids.contains(&args.event_id()) {
                sink.raise(args.with_value(EventValue::Position(point)));
            }
        }
    }
}

impl InputSource for MouseSource {
    fn id(&self) -> ItemId {
        self.id
    }

    fn source_type(&self) -> SourceType {
        SourceType::Mouse
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
        // Sample first: a failed query must leave stored state untouched
        let buttons = ctx.backend.pressed_buttons()?;
        let pixel = ctx.backend.pointer()?;

        self.diff_buttons(buttons, sink);
        if let Some(point) = pixel.and_then(|p| ctx.backend.screen_rect().normalise(&p)) {
            self.diff_pointer(ctx, point, sink);
        }
        Ok(())
    }

    fn set_monitored(&mut self, events: &HashSet<EventId>) {
        self.dwell_ids = events
            .iter()
            .copied()
            .filter(|id| id.source_id() == self.id && id.reason() == Some(EventReason::Dwelled))
            .collect();
    }

    fn teardown(&mut self) {
        self.buttons.clear();
        self.pointer = None;
        self.inside.clear();
        self.dwell = None;
    }
}
