//! Raw event representation before normalization.
//!
//! Vendors disagree on how they report times: Google sends RFC 3339 offsets
//! or bare dates, Microsoft Graph sends naive timestamps plus a zone label.
//! [`RawEvent`] preserves exactly what came over the wire so the normalizer
//! can decode it in one place and report failures per event.

/// A time value as the vendor reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTime {
    /// A timed value, possibly with a separate zone label.
    DateTime {
        /// The timestamp string as received.
        value: String,
        /// An IANA zone identifier accompanying the value, if any.
        time_zone: Option<String>,
    },
    /// A bare `YYYY-MM-DD` date, indicating a full-day event.
    Date(String),
}

impl RawTime {
    /// Convenience constructor for a timed value with a zone label.
    pub fn zoned(value: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self::DateTime {
            value: value.into(),
            time_zone: Some(time_zone.into()),
        }
    }

    /// Convenience constructor for a timed value with no zone label.
    pub fn timestamp(value: impl Into<String>) -> Self {
        Self::DateTime {
            value: value.into(),
            time_zone: None,
        }
    }

    /// Returns true if this is a bare date (full-day) value.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// A calendar event as received from a vendor, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// The vendor event identifier.
    pub id: String,
    /// The event title, if the vendor supplied one.
    pub summary: Option<String>,
    /// Whether the vendor reports the event as cancelled.
    pub cancelled: bool,
    /// Start time as reported.
    pub start: RawTime,
    /// End time as reported.
    pub end: RawTime,
    /// Attendee email addresses as reported, possibly with duplicates.
    pub attendees: Vec<String>,
}

impl RawEvent {
    /// Creates a raw event with required fields.
    pub fn new(id: impl Into<String>, start: RawTime, end: RawTime) -> Self {
        Self {
            id: id.into(),
            summary: None,
            cancelled: false,
            start,
            end,
            attendees: Vec::new(),
        }
    }

    /// Builder method to set the title.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the cancellation flag.
    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Builder method to add an attendee address.
    pub fn with_attendee(mut self, email: impl Into<String>) -> Self {
        self.attendees.push(email.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_time_kinds() {
        assert!(RawTime::Date("2024-09-20".to_string()).is_date());
        assert!(!RawTime::timestamp("2024-09-20T16:00:00Z").is_date());
        assert!(!RawTime::zoned("2024-09-20T16:00:00.0000000", "America/New_York").is_date());
    }

    #[test]
    fn raw_event_builder() {
        let event = RawEvent::new(
            "evt-1",
            RawTime::timestamp("2024-09-20T16:00:00Z"),
            RawTime::timestamp("2024-09-20T18:00:00Z"),
        )
        .with_summary("Team Session")
        .with_attendee("a@example.org")
        .with_attendee("a@example.org");

        assert_eq!(event.summary.as_deref(), Some("Team Session"));
        assert!(!event.cancelled);
        // Duplicates are kept here; the normalizer dedups.
        assert_eq!(event.attendees.len(), 2);
    }
}
