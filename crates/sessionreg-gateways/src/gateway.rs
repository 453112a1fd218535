//! Gateway traits abstracting over calendar vendors.
//!
//! A reconciliation pass talks to three collaborators: the calendar (events
//! and markers), the directory (contacts with role tags) and the mail sender.
//! Each is a separate trait so tests can substitute in-memory doubles per
//! concern, and so a deployment can mix vendors if it ever needs to.
//!
//! All operations are synchronous; a pass walks events sequentially and has
//! no use for in-flight concurrency.

use std::collections::BTreeMap;

use crate::error::GatewayResult;
use crate::raw_event::RawEvent;
use sessionreg_core::Contact;

/// The flat string-to-string property blob a vendor stores per event.
pub type PropertyMap = BTreeMap<String, String>;

/// A calendar as listed by the vendor, before resolution by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSummary {
    /// The vendor identifier used in subsequent calls.
    pub id: String,
    /// The display name the configuration matches against.
    pub name: String,
}

/// Read/write access to one vendor calendar account.
pub trait CalendarGateway {
    /// Lists the calendars visible to the authenticated account.
    fn list_calendars(&self) -> GatewayResult<Vec<CalendarSummary>>;

    /// Lists events in `[now, now + days]` for the given calendar.
    ///
    /// Events come back raw; normalization into [`sessionreg_core::CalendarEvent`]
    /// is a separate step so decode failures can be reported per event.
    fn list_events(&self, calendar_id: &str, days: i64) -> GatewayResult<Vec<RawEvent>>;

    /// Reads the marker property blob attached to an event.
    ///
    /// Returns `Ok(None)` when no blob is attached; that is the normal state
    /// for an event never notified, not an error.
    fn marker(&self, calendar_id: &str, event_id: &str) -> GatewayResult<Option<PropertyMap>>;

    /// Writes the marker property blob on an event, replacing any previous
    /// blob wholesale.
    fn set_marker(
        &self,
        calendar_id: &str,
        event_id: &str,
        properties: &PropertyMap,
    ) -> GatewayResult<()>;
}

/// Read access to the account's contact directory.
pub trait DirectoryGateway {
    /// Fetches all contacts with their email addresses and role tags.
    fn list_contacts(&self) -> GatewayResult<Vec<Contact>>;
}

/// Outbound mail delivery.
pub trait NotificationSender {
    /// Sends one message to the configured recipient.
    fn send(&self, recipient: &str, subject: &str, body: &str) -> GatewayResult<()>;
}
