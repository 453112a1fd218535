//! Microsoft Graph gateway.
//!
//! One adapter implements all three gateway traits against the Graph REST
//! API: calendars and calendar views for events, open type extensions for
//! the marker blob, `/me/contacts` for the directory and `/me/sendMail` for
//! delivery.
//!
//! Markers live in an open type extension named after the configured
//! namespace. Graph refuses a second POST of the same extension name with
//! 409, so writes fall back to PATCH when the extension already exists.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{
    CalendarGateway, CalendarSummary, DirectoryGateway, NotificationSender, PropertyMap,
};
use crate::raw_event::{RawEvent, RawTime};
use sessionreg_core::Contact;

const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_EXTENSION_NAME: &str = "org.mantabots";

/// A gateway backed by the Microsoft Graph API.
pub struct GraphGateway {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
    extension_name: String,
}

impl GraphGateway {
    /// Creates a gateway authenticated with the given bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            extension_name: DEFAULT_EXTENSION_NAME.to_string(),
        }
    }

    /// Builder method to point the gateway at a different endpoint.
    ///
    /// Used by tests to target a local stub server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder method to set the extension namespace markers are stored in.
    pub fn with_extension_name(mut self, name: impl Into<String>) -> Self {
        self.extension_name = name.into();
        self
    }

    fn get(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    fn check(
        &self,
        response: reqwest::blocking::Response,
        expected: u16,
    ) -> GatewayResult<reqwest::blocking::Response> {
        let status = response.status().as_u16();
        if status == expected {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(GatewayError::from_status(status, body).with_gateway("graph"))
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ListResponse<T> {
    #[serde(default)]
    value: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphCalendar {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEvent {
    id: String,
    subject: Option<String>,
    #[serde(default)]
    is_cancelled: bool,
    #[serde(default)]
    is_all_day: bool,
    start: GraphTime,
    end: GraphTime,
    #[serde(default)]
    attendees: Vec<GraphAttendee>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphTime {
    date_time: String,
    time_zone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphAttendee {
    email_address: GraphEmail,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEmail {
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphContact {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email_addresses: Vec<GraphEmail>,
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    message: MailMessage<'a>,
    save_to_sent_items: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailMessage<'a> {
    subject: &'a str,
    body: MailBody<'a>,
    to_recipients: Vec<Recipient<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailBody<'a> {
    content_type: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient<'a> {
    email_address: RecipientAddress<'a>,
}

#[derive(Serialize)]
struct RecipientAddress<'a> {
    address: &'a str,
}

impl GraphTime {
    fn into_raw(self, all_day: bool) -> RawTime {
        if all_day {
            // Graph reports full-day boundaries as midnight timestamps; keep
            // the date part only so normalization treats them as dates.
            RawTime::Date(self.date_time.chars().take(10).collect())
        } else {
            RawTime::DateTime {
                value: self.date_time,
                time_zone: self.time_zone,
            }
        }
    }
}

/// Flattens an extension JSON object into the marker property blob.
///
/// Graph echoes its own metadata alongside the stored properties; scalar
/// values are kept (numbers and booleans as their string form), nested
/// values are dropped.
fn flatten_extension(value: &Value) -> PropertyMap {
    let mut props = PropertyMap::new();
    if let Some(object) = value.as_object() {
        for (key, value) in object {
            match value {
                Value::String(s) => {
                    props.insert(key.clone(), s.clone());
                }
                Value::Bool(b) => {
                    props.insert(key.clone(), b.to_string());
                }
                Value::Number(n) => {
                    props.insert(key.clone(), n.to_string());
                }
                _ => {}
            }
        }
    }
    props
}

impl CalendarGateway for GraphGateway {
    fn list_calendars(&self) -> GatewayResult<Vec<CalendarSummary>> {
        let response = self.get("/me/calendars").send()?;
        let response = self.check(response, 200)?;
        let listed: ListResponse<GraphCalendar> = response.json()?;
        Ok(listed
            .value
            .into_iter()
            .map(|c| CalendarSummary {
                id: c.id,
                name: c.name,
            })
            .collect())
    }

    fn list_events(&self, calendar_id: &str, days: i64) -> GatewayResult<Vec<RawEvent>> {
        let now = Utc::now();
        let until = now + Duration::days(days);
        let response = self
            .get(&format!("/me/calendars/{calendar_id}/calendarview"))
            .query(&[
                ("startDateTime", now.to_rfc3339()),
                ("endDateTime", until.to_rfc3339()),
            ])
            .send()?;
        let response = self.check(response, 200)?;
        let listed: ListResponse<GraphEvent> = response.json()?;

        debug!(calendar_id, count = listed.value.len(), "listed events");
        Ok(listed
            .value
            .into_iter()
            .map(|e| {
                let all_day = e.is_all_day;
                let mut raw = RawEvent::new(e.id, e.start.into_raw(all_day), e.end.into_raw(all_day))
                    .with_cancelled(e.is_cancelled);
                if let Some(subject) = e.subject {
                    raw = raw.with_summary(subject);
                }
                for attendee in e.attendees {
                    raw = raw.with_attendee(attendee.email_address.address);
                }
                raw
            })
            .collect())
    }

    fn marker(&self, _calendar_id: &str, event_id: &str) -> GatewayResult<Option<PropertyMap>> {
        let response = self
            .get(&format!(
                "/me/events/{event_id}/extensions/{}",
                self.extension_name
            ))
            .send()?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let response = self.check(response, 200)?;
        let body: Value = response.json()?;
        Ok(Some(flatten_extension(&body)))
    }

    fn set_marker(
        &self,
        _calendar_id: &str,
        event_id: &str,
        properties: &PropertyMap,
    ) -> GatewayResult<()> {
        let mut payload = serde_json::Map::new();
        payload.insert(
            "@odata.type".to_string(),
            Value::String("microsoft.graph.openTypeExtension".to_string()),
        );
        payload.insert(
            "extensionName".to_string(),
            Value::String(self.extension_name.clone()),
        );
        for (key, value) in properties {
            payload.insert(key.clone(), Value::String(value.clone()));
        }
        let payload = Value::Object(payload);

        let response = self
            .client
            .post(format!("{}/me/events/{event_id}/extensions", self.base_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()?;
        if response.status().as_u16() == 409 {
            // The extension already exists; replace it in place.
            let response = self
                .client
                .patch(format!(
                    "{}/me/events/{event_id}/extensions/{}",
                    self.base_url, self.extension_name
                ))
                .bearer_auth(&self.token)
                .json(&payload)
                .send()?;
            self.check(response, 200)?;
            return Ok(());
        }
        self.check(response, 201)?;
        Ok(())
    }
}

impl DirectoryGateway for GraphGateway {
    fn list_contacts(&self) -> GatewayResult<Vec<Contact>> {
        let response = self.get("/me/contacts").send()?;
        let response = self.check(response, 200)?;
        let listed: ListResponse<GraphContact> = response.json()?;
        Ok(listed
            .value
            .into_iter()
            .map(|c| Contact {
                display_name: c.display_name,
                emails: c.email_addresses.into_iter().map(|e| e.address).collect(),
                roles: c.categories,
            })
            .collect())
    }
}

impl NotificationSender for GraphGateway {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> GatewayResult<()> {
        let request = SendMailRequest {
            message: MailMessage {
                subject,
                body: MailBody {
                    content_type: "Text",
                    content: body,
                },
                to_recipients: vec![Recipient {
                    email_address: RecipientAddress { address: recipient },
                }],
            },
            save_to_sent_items: true,
        };
        let response = self
            .client
            .post(format!("{}/me/sendMail", self.base_url))
            .bearer_auth(&self.token)
            .json(&request)
            .send()?;
        self.check(response, 202)?;
        debug!(recipient, subject, "mail accepted");
        Ok(())
    }
}
