// Altrs Thread Manager
// Mailboxes between the UI thread and the polling thread

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::config::AppConfig;
use crate::event::{EventArgs, EventReport};
use crate::profile::Profile;

/// Most submitted events held between two drains
pub const MAX_SUBMITTED_EVENTS: usize = 1000;

/// Producer appends under the lock; consumer swaps the whole buffer out
/// with its own (cleared) one, so neither side holds the lock while working.
#[derive(Debug)]
struct DoubleBuffer<T> {
    pending: Mutex<Vec<T>>,
}

impl<T> DoubleBuffer<T> {
    fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, item: T) {
        self.pending.lock().push(item);
    }

    /// Push, dropping the oldest half first when `cap` is reached
    fn push_capped(&self, item: T, cap: usize) -> usize {
        let mut pending = self.pending.lock();
        let mut dropped = 0;
        if pending.len() >= cap {
            dropped = pending.len() / 2;
            pending.drain(..dropped);
        }
        pending.push(item);
        dropped
    }

    fn swap(&self, out: &mut Vec<T>) {
        out.clear();
        std::mem::swap(&mut *self.pending.lock(), out);
    }

    fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.pending.lock())
    }
}

/// Profile and config replacements waiting for the polling thread
#[derive(Debug, Default)]
pub struct ConfigUpdates {
    pub profile: Option<Profile>,
    pub config: Option<AppConfig>,
}

impl ConfigUpdates {
    pub fn is_empty(&self) -> bool {
        self.profile.is_none() && self.config.is_none()
    }
}

/// Shared between the UI thread and the polling thread, usually in an `Arc`.
///
/// `set_profile`, `set_app_config`, `submit_event`, `get_new_event_reports`
/// and `stop_polling` belong to the UI side; `receive_config_updates`,
/// `get_new_event_submissions` and `schedule_event_report` to the polling
/// side. No call waits on the other thread beyond a short lock.
#[derive(Debug)]
pub struct ThreadManager {
    pending_profile: Mutex<Option<Profile>>,
    pending_config: Mutex<Option<AppConfig>>,
    config_changed: AtomicBool,
    submitted: DoubleBuffer<EventArgs>,
    reports: DoubleBuffer<EventReport>,
    stop_requested: AtomicBool,
}

impl Default for ThreadManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadManager {
    pub fn new() -> Self {
        Self {
            pending_profile: Mutex::new(None),
            pending_config: Mutex::new(None),
            config_changed: AtomicBool::new(false),
            submitted: DoubleBuffer::new(),
            reports: DoubleBuffer::new(),
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Queue a profile for the next tick, replacing any not yet applied
    pub fn set_profile(&self, profile: Profile) {
        *self.pending_profile.lock() = Some(profile);
        self.config_changed.store(true, Ordering::Release);
    }

    /// Queue a config for the next tick, replacing any not yet applied
    pub fn set_app_config(&self, config: AppConfig) {
        *self.pending_config.lock() = Some(config);
        self.config_changed.store(true, Ordering::Release);
    }

    /// Take pending profile/config replacements, if any
    pub fn receive_config_updates(&self) -> Option<ConfigUpdates> {
        if !self.config_changed.swap(false, Ordering::AcqRel) {
            return None;
        }
        let updates = ConfigUpdates {
            profile: self.pending_profile.lock().take(),
            config: self.pending_config.lock().take(),
        };
        (!updates.is_empty()).then_some(updates)
    }

    pub fn submit_event(&self, args: EventArgs) {
        let dropped = self.submitted.push_capped(args, MAX_SUBMITTED_EVENTS);
        if dropped > 0 {
            log::warn!("Submitted event queue full, dropped {} oldest events", dropped);
        }
    }

    /// Swap submitted events into `out`, in submission order
    pub fn get_new_event_submissions(&self, out: &mut Vec<EventArgs>) {
        self.submitted.swap(out);
    }

    pub fn schedule_event_report(&self, report: EventReport) {
        self.reports.push(report);
    }

    pub fn get_new_event_reports(&self) -> Vec<EventReport> {
        self.reports.take()
    }

    pub fn stop_polling(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Allow a new polling run after a stop
    pub fn clear_stop(&self) {
        self.stop_requested.store(false, Ordering::Release);
    }
}
