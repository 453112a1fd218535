//! Normalization of raw vendor events into [`CalendarEvent`].
//!
//! Decoding happens per event so one malformed payload skips that event
//! only, never the pass. Three wire shapes are accepted:
//!
//! - RFC 3339 timestamps with an offset (Google timed events)
//! - naive timestamps plus an IANA zone label (Microsoft Graph)
//! - bare `YYYY-MM-DD` dates, decoded as UTC midnight with the full-day
//!   flag set so the timeslot normalizer can reinterpret them locally

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::raw_event::{RawEvent, RawTime};
use sessionreg_core::CalendarEvent;

/// Errors produced while decoding one raw event.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A timestamp string matched none of the accepted shapes.
    #[error("event '{event_id}' has an unparseable {field} time: '{value}'")]
    InvalidTime {
        event_id: String,
        field: &'static str,
        value: String,
    },

    /// A zone label is not a known IANA identifier.
    #[error("event '{event_id}' names an unknown timezone '{zone}'")]
    UnknownZone { event_id: String, zone: String },

    /// A naive timestamp falls in a DST gap of its zone.
    #[error("event '{event_id}' {field} time '{value}' does not exist in '{zone}'")]
    NonexistentLocalTime {
        event_id: String,
        field: &'static str,
        value: String,
        zone: String,
    },

    /// Start and end use different value kinds (date vs timestamp).
    #[error("event '{event_id}' mixes date and timestamp values")]
    MixedTimeKinds { event_id: String },
}

/// Decodes one raw event into the vendor-agnostic shape.
pub fn normalize_event(raw: &RawEvent) -> Result<CalendarEvent, NormalizeError> {
    if raw.start.is_date() != raw.end.is_date() {
        return Err(NormalizeError::MixedTimeKinds {
            event_id: raw.id.clone(),
        });
    }

    let all_day = raw.start.is_date();
    let (start, start_zone) = decode_time(&raw.id, "start", &raw.start)?;
    let (end, end_zone) = decode_time(&raw.id, "end", &raw.end)?;

    let mut event = CalendarEvent::new(
        &raw.id,
        raw.summary.clone().unwrap_or_default(),
        start,
        end,
    )
    .with_cancelled(raw.cancelled)
    .with_all_day(all_day);

    if let Some(zone) = start_zone.or(end_zone) {
        event = event.with_timezone(zone);
    }
    for attendee in &raw.attendees {
        event = event.with_attendee(attendee.clone());
    }
    Ok(event)
}

/// Decodes one time value, returning the UTC instant and the zone label the
/// vendor attached, if any.
fn decode_time(
    event_id: &str,
    field: &'static str,
    raw: &RawTime,
) -> Result<(DateTime<Utc>, Option<String>), NormalizeError> {
    match raw {
        RawTime::Date(date) => {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                NormalizeError::InvalidTime {
                    event_id: event_id.to_string(),
                    field,
                    value: date.clone(),
                }
            })?;
            let midnight = parsed.and_hms_opt(0, 0, 0).expect("valid time");
            Ok((Utc.from_utc_datetime(&midnight), None))
        }
        RawTime::DateTime { value, time_zone } => {
            // Offset-carrying timestamps decode directly.
            if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
                return Ok((dt.with_timezone(&Utc), time_zone.clone()));
            }

            // Otherwise the value is naive and the zone label is required
            // to anchor it. Graph sends 7 fractional digits; chrono's %.f
            // accepts any precision.
            let naive =
                NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map_err(|_| {
                    NormalizeError::InvalidTime {
                        event_id: event_id.to_string(),
                        field,
                        value: value.clone(),
                    }
                })?;
            let zone_name = time_zone.as_deref().unwrap_or("UTC");
            let zone: Tz = zone_name.parse().map_err(|_| NormalizeError::UnknownZone {
                event_id: event_id.to_string(),
                zone: zone_name.to_string(),
            })?;
            let instant = match zone.from_local_datetime(&naive) {
                LocalResult::Single(dt) => dt,
                LocalResult::Ambiguous(earliest, _) => earliest,
                LocalResult::None => {
                    return Err(NormalizeError::NonexistentLocalTime {
                        event_id: event_id.to_string(),
                        field,
                        value: value.clone(),
                        zone: zone_name.to_string(),
                    });
                }
            };
            Ok((instant.with_timezone(&Utc), time_zone.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn decodes_rfc3339_with_offset() {
        let raw = RawEvent::new(
            "evt-1",
            RawTime::timestamp("2024-09-20T12:00:00-04:00"),
            RawTime::timestamp("2024-09-20T14:00:00-04:00"),
        )
        .with_summary("Team Session");

        let event = normalize_event(&raw).unwrap();
        assert_eq!(event.start, utc(2024, 9, 20, 16, 0, 0));
        assert_eq!(event.end, utc(2024, 9, 20, 18, 0, 0));
        assert!(!event.is_all_day);
        assert!(event.timezone.is_none());
    }

    #[test]
    fn decodes_naive_with_zone_label() {
        // Graph shape: 7 fractional digits, zone carried separately.
        let raw = RawEvent::new(
            "evt-2",
            RawTime::zoned("2024-09-20T12:00:00.0000000", "America/New_York"),
            RawTime::zoned("2024-09-20T14:00:00.0000000", "America/New_York"),
        );

        let event = normalize_event(&raw).unwrap();
        assert_eq!(event.start, utc(2024, 9, 20, 16, 0, 0));
        assert_eq!(event.timezone.as_deref(), Some("America/New_York"));
    }

    #[test]
    fn decodes_bare_date_as_utc_midnight_full_day() {
        let raw = RawEvent::new(
            "evt-3",
            RawTime::Date("2024-09-20".to_string()),
            RawTime::Date("2024-09-21".to_string()),
        );

        let event = normalize_event(&raw).unwrap();
        assert!(event.is_all_day);
        assert_eq!(event.start, utc(2024, 9, 20, 0, 0, 0));
        assert_eq!(event.end, utc(2024, 9, 21, 0, 0, 0));
    }

    #[test]
    fn missing_summary_becomes_empty_title() {
        let raw = RawEvent::new(
            "evt-4",
            RawTime::timestamp("2024-09-20T12:00:00Z"),
            RawTime::timestamp("2024-09-20T13:00:00Z"),
        );
        let event = normalize_event(&raw).unwrap();
        assert_eq!(event.title, "");
    }

    #[test]
    fn attendees_are_deduplicated() {
        let raw = RawEvent::new(
            "evt-5",
            RawTime::timestamp("2024-09-20T12:00:00Z"),
            RawTime::timestamp("2024-09-20T13:00:00Z"),
        )
        .with_attendee("a@example.org")
        .with_attendee("b@example.org")
        .with_attendee("a@example.org");

        let event = normalize_event(&raw).unwrap();
        assert_eq!(event.attendees, vec!["a@example.org", "b@example.org"]);
    }

    #[test]
    fn rejects_unknown_zone() {
        let raw = RawEvent::new(
            "evt-6",
            RawTime::zoned("2024-09-20T12:00:00", "Mars/Olympus_Mons"),
            RawTime::zoned("2024-09-20T13:00:00", "Mars/Olympus_Mons"),
        );
        assert!(matches!(
            normalize_event(&raw),
            Err(NormalizeError::UnknownZone { .. })
        ));
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let raw = RawEvent::new(
            "evt-7",
            RawTime::timestamp("yesterday"),
            RawTime::timestamp("2024-09-20T13:00:00Z"),
        );
        assert!(matches!(
            normalize_event(&raw),
            Err(NormalizeError::InvalidTime { field: "start", .. })
        ));
    }

    #[test]
    fn rejects_mixed_kinds() {
        let raw = RawEvent::new(
            "evt-8",
            RawTime::Date("2024-09-20".to_string()),
            RawTime::timestamp("2024-09-20T13:00:00Z"),
        );
        assert!(matches!(
            normalize_event(&raw),
            Err(NormalizeError::MixedTimeKinds { .. })
        ));
    }

    #[test]
    fn dst_gap_time_is_rejected() {
        let raw = RawEvent::new(
            "evt-9",
            RawTime::zoned("2024-03-10T02:30:00", "America/New_York"),
            RawTime::zoned("2024-03-10T03:30:00", "America/New_York"),
        );
        assert!(matches!(
            normalize_event(&raw),
            Err(NormalizeError::NonexistentLocalTime { field: "start", .. })
        ));
    }

    #[test]
    fn dst_fold_maps_to_earliest_instant() {
        let raw = RawEvent::new(
            "evt-10",
            RawTime::zoned("2024-11-03T01:30:00", "America/New_York"),
            RawTime::zoned("2024-11-03T03:00:00", "America/New_York"),
        );
        let event = normalize_event(&raw).unwrap();
        // Earliest mapping is still EDT (-04:00).
        assert_eq!(event.start, utc(2024, 11, 3, 5, 30, 0));
    }
}
