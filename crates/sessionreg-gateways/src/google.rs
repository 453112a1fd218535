//! Google gateway.
//!
//! Spans three Google services under one OAuth token: Calendar v3 for events
//! and markers, the People API for the directory and Gmail for delivery.
//!
//! Markers are stored as the event's private extended properties, which
//! Calendar patches as a flat string map with no extension lifecycle to
//! manage. Role tags come from the contact's organization titles, which is
//! where the People API surfaces directory labels.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{
    CalendarGateway, CalendarSummary, DirectoryGateway, NotificationSender, PropertyMap,
};
use crate::raw_event::{RawEvent, RawTime};
use sessionreg_core::Contact;

const DEFAULT_CALENDAR_URL: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_PEOPLE_URL: &str = "https://people.googleapis.com/v1";
const DEFAULT_GMAIL_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// A gateway backed by the Google Calendar, People and Gmail APIs.
pub struct GoogleGateway {
    client: reqwest::blocking::Client,
    calendar_url: String,
    people_url: String,
    gmail_url: String,
    token: String,
}

impl GoogleGateway {
    /// Creates a gateway authenticated with the given bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            calendar_url: DEFAULT_CALENDAR_URL.to_string(),
            people_url: DEFAULT_PEOPLE_URL.to_string(),
            gmail_url: DEFAULT_GMAIL_URL.to_string(),
            token: token.into(),
        }
    }

    /// Builder method to point all three services at one endpoint.
    ///
    /// Used by tests to target a local stub server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        self.calendar_url = base.clone();
        self.people_url = base.clone();
        self.gmail_url = base;
        self
    }

    fn check(
        &self,
        response: reqwest::blocking::Response,
    ) -> GatewayResult<reqwest::blocking::Response> {
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(GatewayError::from_status(status, body).with_gateway("google"))
    }
}

#[derive(Deserialize)]
struct CalendarList {
    #[serde(default)]
    items: Vec<CalendarEntry>,
}

#[derive(Deserialize)]
struct CalendarEntry {
    id: String,
    summary: String,
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    summary: Option<String>,
    #[serde(default)]
    status: Option<String>,
    start: GoogleTime,
    end: GoogleTime,
    #[serde(default)]
    attendees: Vec<GoogleAttendee>,
    #[serde(default)]
    extended_properties: Option<ExtendedProperties>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTime {
    date_time: Option<String>,
    date: Option<String>,
    time_zone: Option<String>,
}

#[derive(Deserialize)]
struct GoogleAttendee {
    email: String,
}

#[derive(Deserialize)]
struct ExtendedProperties {
    #[serde(default)]
    private: Option<PropertyMap>,
}

#[derive(Deserialize)]
struct ConnectionList {
    #[serde(default)]
    connections: Vec<Person>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    #[serde(default)]
    names: Vec<PersonName>,
    #[serde(default)]
    email_addresses: Vec<PersonEmail>,
    #[serde(default)]
    organizations: Vec<Organization>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonName {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct PersonEmail {
    value: String,
}

#[derive(Deserialize)]
struct Organization {
    title: Option<String>,
}

impl GoogleTime {
    fn into_raw(self, event_id: &str) -> Result<RawTime, GatewayError> {
        if let Some(date_time) = self.date_time {
            return Ok(RawTime::DateTime {
                value: date_time,
                time_zone: self.time_zone,
            });
        }
        if let Some(date) = self.date {
            return Ok(RawTime::Date(date));
        }
        Err(GatewayError::invalid_response(format!(
            "event '{event_id}' has a time with neither dateTime nor date"
        ))
        .with_gateway("google"))
    }
}

impl GoogleEvent {
    fn into_raw(self) -> Result<RawEvent, GatewayError> {
        let cancelled = self.status.as_deref() == Some("cancelled");
        let start = self.start.into_raw(&self.id)?;
        let end = self.end.into_raw(&self.id)?;
        let mut raw = RawEvent::new(self.id, start, end).with_cancelled(cancelled);
        if let Some(summary) = self.summary {
            raw = raw.with_summary(summary);
        }
        for attendee in self.attendees {
            raw = raw.with_attendee(attendee.email);
        }
        Ok(raw)
    }
}

impl CalendarGateway for GoogleGateway {
    fn list_calendars(&self) -> GatewayResult<Vec<CalendarSummary>> {
        let response = self
            .client
            .get(format!("{}/users/me/calendarList", self.calendar_url))
            .bearer_auth(&self.token)
            .send()?;
        let listed: CalendarList = self.check(response)?.json()?;
        Ok(listed
            .items
            .into_iter()
            .map(|c| CalendarSummary {
                id: c.id,
                name: c.summary,
            })
            .collect())
    }

    fn list_events(&self, calendar_id: &str, days: i64) -> GatewayResult<Vec<RawEvent>> {
        let now = Utc::now();
        let until = now + Duration::days(days);
        let response = self
            .client
            .get(format!(
                "{}/calendars/{calendar_id}/events",
                self.calendar_url
            ))
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", now.to_rfc3339()),
                ("timeMax", until.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()?;
        let listed: EventList = self.check(response)?.json()?;

        debug!(calendar_id, count = listed.items.len(), "listed events");
        listed.items.into_iter().map(GoogleEvent::into_raw).collect()
    }

    fn marker(&self, calendar_id: &str, event_id: &str) -> GatewayResult<Option<PropertyMap>> {
        let response = self
            .client
            .get(format!(
                "{}/calendars/{calendar_id}/events/{event_id}",
                self.calendar_url
            ))
            .bearer_auth(&self.token)
            .send()?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let event: GoogleEvent = self.check(response)?.json()?;
        Ok(event.extended_properties.and_then(|ext| ext.private))
    }

    fn set_marker(
        &self,
        calendar_id: &str,
        event_id: &str,
        properties: &PropertyMap,
    ) -> GatewayResult<()> {
        let payload = json!({
            "extendedProperties": { "private": properties }
        });
        let response = self
            .client
            .patch(format!(
                "{}/calendars/{calendar_id}/events/{event_id}",
                self.calendar_url
            ))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()?;
        self.check(response)?;
        Ok(())
    }
}

impl DirectoryGateway for GoogleGateway {
    fn list_contacts(&self) -> GatewayResult<Vec<Contact>> {
        let response = self
            .client
            .get(format!("{}/people/me/connections", self.people_url))
            .bearer_auth(&self.token)
            .query(&[("personFields", "names,emailAddresses,organizations")])
            .send()?;
        let listed: ConnectionList = self.check(response)?.json()?;
        Ok(listed
            .connections
            .into_iter()
            .map(|p| Contact {
                display_name: p
                    .names
                    .into_iter()
                    .find_map(|n| n.display_name)
                    .unwrap_or_default(),
                emails: p.email_addresses.into_iter().map(|e| e.value).collect(),
                roles: p
                    .organizations
                    .into_iter()
                    .filter_map(|o| o.title)
                    .collect(),
            })
            .collect())
    }
}

impl NotificationSender for GoogleGateway {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> GatewayResult<()> {
        let rfc822 = format!("To: {recipient}\r\nSubject: {subject}\r\n\r\n{body}");
        let payload = json!({ "raw": URL_SAFE_NO_PAD.encode(rfc822.as_bytes()) });
        let response = self
            .client
            .post(format!("{}/users/me/messages/send", self.gmail_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()?;
        self.check(response)?;
        debug!(recipient, subject, "mail accepted");
        Ok(())
    }
}
