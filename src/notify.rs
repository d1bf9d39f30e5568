//! Broadcast hub for lifecycle events plus the admin notification log.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::{Booking, BookingEvent, BookingStatus};

const CHANNEL_CAPACITY: usize = 256;

/// Default cap on retained notification records, oldest dropped first.
const DEFAULT_LOG_CAP: usize = 200;

/// Broadcast hub for booking lifecycle events.
pub struct NotifyHub {
    tx: broadcast::Sender<BookingEvent>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            tx: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.tx.subscribe()
    }

    /// Send an event. No-op if nobody is listening.
    pub fn send(&self, event: BookingEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewBooking,
    StatusUpdate,
    Calendar,
}

/// One entry in the admin's notification panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Ulid,
    pub title: String,
    pub message: String,
    pub time: DateTime<Utc>,
    pub read: bool,
    pub kind: NotificationKind,
}

/// Bounded, optionally persisted list of notification records.
///
/// The log is derived data: it can always be rebuilt from the bookings
/// collection, so persistence failures are logged and swallowed.
pub struct NotificationLog {
    path: Option<PathBuf>,
    entries: Vec<NotificationRecord>,
    cap: usize,
}

impl NotificationLog {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            cap: DEFAULT_LOG_CAP,
        }
    }

    /// Load from a JSON file, starting empty when the file is absent or
    /// unreadable.
    pub fn load(path: PathBuf) -> Self {
        let entries = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();
        Self {
            path: Some(path),
            entries,
            cap: DEFAULT_LOG_CAP,
        }
    }

    pub fn entries(&self) -> &[NotificationRecord] {
        &self.entries
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&mut self, id: Ulid) {
        if let Some(entry) = self.entries.iter_mut().find(|n| n.id == id) {
            entry.read = true;
        }
    }

    pub fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.read = true;
        }
    }

    /// Append a record for a broadcast event. Events that carry nothing an
    /// admin would act on produce no record.
    pub fn record(&mut self, event: &BookingEvent) {
        let (title, message, kind) = match event {
            BookingEvent::Created {
                guest_name,
                check_in,
                check_out,
                total_fee,
                ..
            } => (
                "New booking request".to_string(),
                format!("{guest_name} requested {check_in} to {check_out} (total {total_fee})"),
                NotificationKind::NewBooking,
            ),
            BookingEvent::Accepted {
                guest_name, nights, ..
            } => (
                "Booking accepted".to_string(),
                format!("{guest_name}'s stay confirmed, {nights} night(s) blocked"),
                NotificationKind::StatusUpdate,
            ),
            BookingEvent::Completed { id, released } => (
                "Booking completed".to_string(),
                if *released {
                    format!("booking {id} completed, dates released")
                } else {
                    format!("booking {id} completed, dates kept blocked")
                },
                NotificationKind::StatusUpdate,
            ),
            BookingEvent::Deleted { id } => (
                "Booking deleted".to_string(),
                format!("booking {id} removed"),
                NotificationKind::StatusUpdate,
            ),
            BookingEvent::DatesBlocked { dates } => (
                "Calendar updated".to_string(),
                format!("{} date(s) marked unavailable", dates.len()),
                NotificationKind::Calendar,
            ),
            BookingEvent::DatesReleased { dates } => (
                "Calendar updated".to_string(),
                format!("{} date(s) marked available", dates.len()),
                NotificationKind::Calendar,
            ),
        };
        self.push(NotificationRecord {
            id: Ulid::new(),
            title,
            message,
            time: Utc::now(),
            read: false,
            kind,
        });
    }

    /// Reconstruct the log from the bookings collection, one unread record
    /// per pending booking, newest first.
    pub fn rebuild(&mut self, bookings: &[Booking]) {
        self.entries.clear();
        let mut pending: Vec<&Booking> = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Pending)
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for booking in pending {
            self.push(NotificationRecord {
                id: Ulid::new(),
                title: "New booking request".to_string(),
                message: format!(
                    "{} requested {} to {} (total {})",
                    booking.guest_name, booking.check_in, booking.check_out, booking.total_fee
                ),
                time: booking.created_at,
                read: false,
                kind: NotificationKind::NewBooking,
            });
        }
    }

    /// Write the log to its backing file via a temp-file swap. In-memory
    /// logs and persistence failures are both fine to ignore.
    pub fn persist(&self) {
        let Some(path) = &self.path else { return };
        let result = serde_json::to_vec_pretty(&self.entries)
            .map_err(std::io::Error::other)
            .and_then(|bytes| {
                let tmp = path.with_extension("tmp");
                std::fs::write(&tmp, bytes)?;
                std::fs::rename(&tmp, path)
            });
        if let Err(e) = result {
            tracing::warn!("failed to persist notification log: {e}");
        }
    }

    fn push(&mut self, record: NotificationRecord) {
        self.entries.push(record);
        if self.entries.len() > self.cap {
            let excess = self.entries.len() - self.cap;
            self.entries.drain(..excess);
        }
    }
}
