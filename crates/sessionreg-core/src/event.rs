//! Event types for calendar events.
//!
//! [`CalendarEvent`] is the vendor-agnostic projection of a calendar event
//! after gateway normalization. The rest of the system never sees
//! vendor-specific field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized calendar event from any vendor.
///
/// Read fresh on every reconciliation pass; never cached across passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Stable vendor identifier for the event.
    pub id: String,
    /// The event title/subject.
    pub title: String,
    /// Whether the event has been cancelled.
    pub is_cancelled: bool,
    /// Whether the vendor reports this as a full-day event.
    ///
    /// Vendors report full-day events at UTC midnight regardless of the
    /// timezone they were created in; the timeslot normalizer compensates.
    pub is_all_day: bool,
    /// Attendee email addresses, unique, in order of appearance.
    pub attendees: Vec<String>,
    /// When the event starts (UTC instant).
    pub start: DateTime<Utc>,
    /// When the event ends (UTC instant).
    pub end: DateTime<Utc>,
    /// The originating timezone of the event, as an IANA identifier
    /// (e.g., "America/New_York"), if the vendor reported one.
    pub timezone: Option<String>,
}

impl CalendarEvent {
    /// Creates a new event with required fields.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_cancelled: false,
            is_all_day: false,
            attendees: Vec::new(),
            start,
            end,
            timezone: None,
        }
    }

    /// Builder method to mark the event cancelled.
    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.is_cancelled = cancelled;
        self
    }

    /// Builder method to mark the event as full-day.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.is_all_day = all_day;
        self
    }

    /// Builder method to add an attendee email.
    ///
    /// Duplicate addresses are ignored so the set stays unique.
    pub fn with_attendee(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        if !self.attendees.contains(&email) {
            self.attendees.push(email);
        }
        self
    }

    /// Builder method to set the originating timezone.
    pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
        self.timezone = Some(tz.into());
        self
    }

    /// Returns true if the title contains the configured topic substring.
    pub fn matches_topic(&self, topic: &str) -> bool {
        self.title.contains(topic)
    }
}
