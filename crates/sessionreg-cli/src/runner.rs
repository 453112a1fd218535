//! The registration pass.
//!
//! One run scans the configured calendar window, reconciles each event
//! against its persisted marker and sends at most one notification per
//! event. Events are processed sequentially; a failure on one event is
//! logged and counted, never fatal to the pass.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::AppError;
use sessionreg_core::{
    AttendeeSet, CalendarEvent, CanonicalInterval, MarkerError, RegistrationMarker, TemplateError,
    TimeslotError, classify, gate, reconcile, registration_timeslot, render, split_message,
};
use sessionreg_gateways::{
    CalendarGateway, DirectoryGateway, GatewayError, NotificationSender, NormalizeError,
    normalize_event,
};

/// Counters for one completed pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Events returned by the calendar window query.
    pub scanned: u32,
    /// Events for which a notification was sent.
    pub notified: u32,
    /// Events gated out or already up to date.
    pub skipped: u32,
    /// Events abandoned because of a per-event failure.
    pub failed: u32,
}

/// What happened to one event.
enum Disposition {
    Notified,
    Skipped(&'static str),
}

/// Per-event failures. Logged and counted; the pass continues.
#[derive(Debug, Error)]
enum EventError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Timeslot(#[from] TimeslotError),
    #[error(transparent)]
    Marker(#[from] MarkerError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Runs one registration pass end to end.
///
/// Setup failures (calendar resolution, contact fetch, event listing) are
/// fatal; everything past that point is per-event. There is no cross-process
/// locking: overlapping runs may both notify the same event (at-least-once
/// delivery).
pub fn run_pass(
    calendar: &dyn CalendarGateway,
    directory: &dyn DirectoryGateway,
    sender: &dyn NotificationSender,
    config: &Config,
    recipient: &str,
    template: &str,
) -> Result<PassSummary, AppError> {
    let zone = config.zone()?;
    let roles = config.role_set();

    let calendar_id = calendar
        .list_calendars()?
        .into_iter()
        .find(|c| c.name == config.calendar.name)
        .map(|c| c.id)
        .ok_or_else(|| AppError::CalendarNotFound(config.calendar.name.clone()))?;

    let contacts = directory.list_contacts()?;
    let raw_events = calendar.list_events(&calendar_id, config.calendar.days)?;
    info!(
        calendar = %config.calendar.name,
        days = config.calendar.days,
        events = raw_events.len(),
        contacts = contacts.len(),
        "scanning window"
    );

    let mut summary = PassSummary::default();
    for raw in &raw_events {
        summary.scanned += 1;
        let event_id = raw.id.clone();
        let result = process_event(
            calendar,
            sender,
            config,
            recipient,
            template,
            zone,
            &roles,
            &contacts,
            &calendar_id,
            raw,
        );
        match result {
            Ok(Disposition::Notified) => summary.notified += 1,
            Ok(Disposition::Skipped(reason)) => {
                debug!(event = %event_id, reason, "skipped");
                summary.skipped += 1;
            }
            Err(error) => {
                error!(event = %event_id, %error, "event abandoned");
                summary.failed += 1;
            }
        }
    }

    info!(
        scanned = summary.scanned,
        notified = summary.notified,
        skipped = summary.skipped,
        failed = summary.failed,
        "pass complete"
    );
    Ok(summary)
}

/// Handles one event: gate, reconcile, notify, commit.
#[allow(clippy::too_many_arguments)]
fn process_event(
    calendar: &dyn CalendarGateway,
    sender: &dyn NotificationSender,
    config: &Config,
    recipient: &str,
    template: &str,
    zone: Tz,
    roles: &sessionreg_core::RoleSet,
    contacts: &[sessionreg_core::Contact],
    calendar_id: &str,
    raw: &sessionreg_gateways::RawEvent,
) -> Result<Disposition, EventError> {
    let event = normalize_event(raw)?;
    let attendees = classify(&event.attendees, contacts, roles);

    // Gating happens before any marker traffic; a refused event leaves no
    // trace on the vendor side.
    if let Some(refusal) = gate(&event, &config.calendar.topic, &attendees) {
        let reason = match refusal {
            sessionreg_core::GateRefusal::Cancelled => "cancelled",
            sessionreg_core::GateRefusal::TopicMismatch => "topic mismatch",
            sessionreg_core::GateRefusal::NoAttendees => "no classified attendees",
        };
        return Ok(Disposition::Skipped(reason));
    }

    let interval = registration_timeslot(&event, zone, config.calendar.full_day)?;
    let marker = match calendar.marker(calendar_id, &event.id)? {
        Some(props) => RegistrationMarker::from_properties(&props, roles)?,
        None => None,
    };

    let decision = reconcile(interval, marker.as_ref(), &attendees);
    if !decision.should_notify() {
        return Ok(Disposition::Skipped("up to date"));
    }

    let fields = render_fields(config, &event, interval, zone, &decision.recipients);
    let message = split_message(&render(template, &fields))?;
    sender.send(recipient, &message.subject, &message.body)?;

    // The marker commits only after the send succeeded, and always carries
    // the full current set so the next pass diffs against it.
    let committed = RegistrationMarker::committed(interval, &attendees);
    calendar.set_marker(calendar_id, &event.id, &committed.to_properties())?;

    info!(
        event = %event.id,
        outcome = ?decision.outcome,
        recipients = decision.recipients.total(),
        "notification sent"
    );
    Ok(Disposition::Notified)
}

/// Builds the placeholder values for the mail template.
///
/// Times render in the configured zone. Each role bucket contributes one
/// placeholder holding a dashed list of recipient names.
fn render_fields(
    config: &Config,
    event: &CalendarEvent,
    interval: CanonicalInterval,
    zone: Tz,
    recipients: &AttendeeSet,
) -> BTreeMap<String, String> {
    let start = interval.start.with_timezone(&zone);
    let end = interval.end.with_timezone(&zone);

    let mut fields = BTreeMap::new();
    fields.insert("team".to_string(), config.team.clone());
    fields.insert("event_id".to_string(), event.id.clone());
    fields.insert("title".to_string(), event.title.clone());
    fields.insert(
        "date".to_string(),
        start.format("%A, %d. %B %Y").to_string(),
    );
    fields.insert(
        "start_time".to_string(),
        start.format("%A, %d. %B %Y at %I:%M%p").to_string(),
    );
    fields.insert(
        "end_time".to_string(),
        end.format("%A, %d. %B %Y at %I:%M%p").to_string(),
    );
    for (bucket, members) in recipients.iter() {
        let list = members
            .iter()
            .map(|c| format!("- {}", c.name))
            .collect::<Vec<_>>()
            .join("\n");
        fields.insert(bucket.to_string(), list);
    }
    fields
}
