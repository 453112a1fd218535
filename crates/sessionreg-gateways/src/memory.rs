//! In-memory gateway doubles for tests.
//!
//! These implement the gateway traits over plain maps, with call counters
//! and injectable failures, so end-to-end reconciliation tests can assert
//! exactly which side effects a pass performed.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{
    CalendarGateway, CalendarSummary, DirectoryGateway, NotificationSender, PropertyMap,
};
use crate::raw_event::RawEvent;
use sessionreg_core::Contact;

/// An in-memory calendar with one named calendar and a fixed event list.
#[derive(Default)]
pub struct MemoryCalendar {
    calendars: Vec<CalendarSummary>,
    events: Vec<RawEvent>,
    markers: Mutex<BTreeMap<String, PropertyMap>>,
    marker_reads: Mutex<u32>,
    marker_writes: Mutex<u32>,
    fail_marker_writes: bool,
}

impl MemoryCalendar {
    /// Creates a calendar with the given display name.
    pub fn new(calendar_name: impl Into<String>) -> Self {
        Self {
            calendars: vec![CalendarSummary {
                id: "cal-1".to_string(),
                name: calendar_name.into(),
            }],
            ..Self::default()
        }
    }

    /// Builder method to add an event.
    pub fn with_event(mut self, event: RawEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Builder method to seed a pre-existing marker blob on an event.
    pub fn with_marker(self, event_id: impl Into<String>, properties: PropertyMap) -> Self {
        self.markers
            .lock()
            .expect("marker lock")
            .insert(event_id.into(), properties);
        self
    }

    /// Builder method to make every marker write fail.
    pub fn with_failing_marker_writes(mut self) -> Self {
        self.fail_marker_writes = true;
        self
    }

    /// The marker blob currently stored for an event, if any.
    pub fn stored_marker(&self, event_id: &str) -> Option<PropertyMap> {
        self.markers
            .lock()
            .expect("marker lock")
            .get(event_id)
            .cloned()
    }

    /// Number of marker reads performed so far.
    pub fn marker_reads(&self) -> u32 {
        *self.marker_reads.lock().expect("counter lock")
    }

    /// Number of marker writes attempted so far.
    pub fn marker_writes(&self) -> u32 {
        *self.marker_writes.lock().expect("counter lock")
    }
}

impl CalendarGateway for MemoryCalendar {
    fn list_calendars(&self) -> GatewayResult<Vec<CalendarSummary>> {
        Ok(self.calendars.clone())
    }

    fn list_events(&self, _calendar_id: &str, _days: i64) -> GatewayResult<Vec<RawEvent>> {
        Ok(self.events.clone())
    }

    fn marker(&self, _calendar_id: &str, event_id: &str) -> GatewayResult<Option<PropertyMap>> {
        *self.marker_reads.lock().expect("counter lock") += 1;
        Ok(self
            .markers
            .lock()
            .expect("marker lock")
            .get(event_id)
            .cloned())
    }

    fn set_marker(
        &self,
        _calendar_id: &str,
        event_id: &str,
        properties: &PropertyMap,
    ) -> GatewayResult<()> {
        *self.marker_writes.lock().expect("counter lock") += 1;
        if self.fail_marker_writes {
            return Err(GatewayError::server("injected marker write failure"));
        }
        self.markers
            .lock()
            .expect("marker lock")
            .insert(event_id.to_string(), properties.clone());
        Ok(())
    }
}

/// An in-memory directory with a fixed contact list.
#[derive(Default)]
pub struct MemoryDirectory {
    contacts: Vec<Contact>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a contact.
    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contacts.push(contact);
        self
    }
}

impl DirectoryGateway for MemoryDirectory {
    fn list_contacts(&self) -> GatewayResult<Vec<Contact>> {
        Ok(self.contacts.clone())
    }
}

/// A message captured by [`MemorySender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// An in-memory sender that records every message.
#[derive(Default)]
pub struct MemorySender {
    sent: Mutex<Vec<SentMail>>,
    fail_sends: bool,
}

impl MemorySender {
    /// Creates a sender that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to make every send fail.
    pub fn with_failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// The messages sent so far, in order.
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().expect("sent lock").clone()
    }
}

impl NotificationSender for MemorySender {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> GatewayResult<()> {
        if self.fail_sends {
            return Err(GatewayError::network("injected send failure"));
        }
        self.sent.lock().expect("sent lock").push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
