//! Timeslot normalization.
//!
//! This module converts a raw event's start/end plus full-day flags into a
//! [`CanonicalInterval`]: a single canonical UTC window used for
//! schedule-change comparison. It masks the vendor quirk where full-day
//! events are reported at UTC midnight regardless of the timezone they were
//! created in.
//!
//! Normalization is a pure function: the same event and configuration always
//! produce the same interval.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::CalendarEvent;

/// Errors produced while normalizing an event timeslot.
#[derive(Debug, Error)]
pub enum TimeslotError {
    /// The wall-clock time does not exist in the target zone (DST gap).
    #[error("local time {naive} does not exist in zone {zone}")]
    NonexistentLocalTime {
        /// The wall-clock time that failed to map.
        naive: NaiveDateTime,
        /// The zone it was interpreted in.
        zone: Tz,
    },

    /// The normalized interval ends before it starts.
    #[error("normalized interval ends before it starts ({start} > {end})")]
    ReversedInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A canonical UTC interval for one event.
///
/// This is the registration-relevant window, which may differ from the raw
/// event window when the full-day override is configured. Invariant:
/// `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalInterval {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (inclusive; full-day windows end at 23:59:59 local).
    pub end: DateTime<Utc>,
}

impl CanonicalInterval {
    /// Creates a new interval.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "CanonicalInterval start must be <= end");
        Self { start, end }
    }

    /// Returns the duration of the interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Computes the canonical registration timeslot for an event.
///
/// - For vendor full-day events (`is_all_day`), the UTC-midnight wall clocks
///   are reinterpreted as local midnight in `zone` and one second is
///   subtracted from the end so the window stays inclusive of the last
///   calendar day.
/// - When `treat_as_full_day` is set, the window is widened to cover the
///   whole local day: start floored to 00:00:00 and end raised to 23:59:59
///   in `zone`. This lets the workflow notify about an evening session as if
///   it covered the whole day.
///
/// # Errors
///
/// Returns [`TimeslotError`] when a wall clock cannot be mapped into `zone`
/// or the vendor interval is reversed; the caller skips the event.
pub fn registration_timeslot(
    event: &CalendarEvent,
    zone: Tz,
    treat_as_full_day: bool,
) -> Result<CanonicalInterval, TimeslotError> {
    let mut start = event.start;
    let mut end = event.end;

    if event.is_all_day {
        // Full-day events appear to start at 00:00 UTC even if created in
        // another timezone, so the UTC wall clock is the reliable part.
        start = local_instant(zone, start.naive_utc())?.with_timezone(&Utc);
        end = local_instant(zone, end.naive_utc())?.with_timezone(&Utc) - Duration::seconds(1);
    }

    if treat_as_full_day {
        let local_start = start.with_timezone(&zone);
        let local_end = end.with_timezone(&zone);
        start = local_instant(
            zone,
            local_start
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .expect("valid time"),
        )?
        .with_timezone(&Utc);
        end = local_instant(
            zone,
            local_end
                .date_naive()
                .and_hms_opt(23, 59, 59)
                .expect("valid time"),
        )?
        .with_timezone(&Utc);
    }

    if end < start {
        return Err(TimeslotError::ReversedInterval { start, end });
    }

    Ok(CanonicalInterval { start, end })
}

/// Maps a wall-clock time into `zone`.
///
/// Ambiguous mappings (DST fold) resolve to the earliest valid instant so
/// the result stays deterministic.
fn local_instant(zone: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, TimeslotError> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(TimeslotError::NonexistentLocalTime { naive, zone }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn evening_session() -> CalendarEvent {
        // 16:00-18:00 Eastern on 2024-09-20, stored as UTC by the vendor.
        CalendarEvent::new(
            "evt-1",
            "Team Session",
            utc(2024, 9, 20, 20, 0, 0),
            utc(2024, 9, 20, 22, 0, 0),
        )
    }

    fn vendor_all_day() -> CalendarEvent {
        // One-day full-day event, reported at UTC midnight by the vendor.
        CalendarEvent::new(
            "evt-2",
            "Team Session",
            utc(2024, 9, 20, 0, 0, 0),
            utc(2024, 9, 21, 0, 0, 0),
        )
        .with_all_day(true)
    }

    mod canonical_interval {
        use super::*;

        #[test]
        fn duration() {
            let interval =
                CanonicalInterval::new(utc(2024, 9, 20, 10, 0, 0), utc(2024, 9, 20, 12, 0, 0));
            assert_eq!(interval.duration(), Duration::hours(2));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn reversed_interval_panics() {
            CanonicalInterval::new(utc(2024, 9, 20, 12, 0, 0), utc(2024, 9, 20, 10, 0, 0));
        }
    }

    mod timed_events {
        use super::*;

        #[test]
        fn passthrough_without_full_day() {
            let event = evening_session();
            let interval = registration_timeslot(&event, New_York, false).unwrap();
            assert_eq!(interval.start, event.start);
            assert_eq!(interval.end, event.end);
        }

        #[test]
        fn full_day_override_widens_to_local_day() {
            let event = evening_session();
            let interval = registration_timeslot(&event, New_York, true).unwrap();
            // Local midnight EDT is 04:00 UTC; 23:59:59 EDT is 03:59:59 UTC next day.
            assert_eq!(interval.start, utc(2024, 9, 20, 4, 0, 0));
            assert_eq!(interval.end, utc(2024, 9, 21, 3, 59, 59));
        }

        #[test]
        fn reversed_vendor_interval_is_rejected() {
            let event = CalendarEvent::new(
                "evt-bad",
                "Team Session",
                utc(2024, 9, 20, 22, 0, 0),
                utc(2024, 9, 20, 20, 0, 0),
            );
            let err = registration_timeslot(&event, New_York, false).unwrap_err();
            assert!(matches!(err, TimeslotError::ReversedInterval { .. }));
        }
    }

    mod all_day_events {
        use super::*;

        #[test]
        fn utc_midnight_reinterpreted_as_local_midnight() {
            let interval = registration_timeslot(&vendor_all_day(), New_York, false).unwrap();
            // Local midnight on the reported calendar date, converted to UTC.
            assert_eq!(interval.start, utc(2024, 9, 20, 4, 0, 0));
            // End is exclusive at the vendor, minus one second keeps the last day.
            assert_eq!(interval.end, utc(2024, 9, 21, 3, 59, 59));
        }

        #[test]
        fn all_day_with_full_day_override_is_stable() {
            let plain = registration_timeslot(&vendor_all_day(), New_York, false).unwrap();
            let widened = registration_timeslot(&vendor_all_day(), New_York, true).unwrap();
            assert_eq!(plain, widened);
        }

        #[test]
        fn winter_date_uses_standard_offset() {
            let event = CalendarEvent::new(
                "evt-3",
                "Team Session",
                utc(2024, 12, 20, 0, 0, 0),
                utc(2024, 12, 21, 0, 0, 0),
            )
            .with_all_day(true);
            let interval = registration_timeslot(&event, New_York, false).unwrap();
            // EST is UTC-5 in December.
            assert_eq!(interval.start, utc(2024, 12, 20, 5, 0, 0));
            assert_eq!(interval.end, utc(2024, 12, 21, 4, 59, 59));
        }
    }

    mod determinism {
        use super::*;

        #[test]
        fn repeated_calls_are_identical() {
            for event in [evening_session(), vendor_all_day()] {
                for full_day in [false, true] {
                    let a = registration_timeslot(&event, New_York, full_day).unwrap();
                    let b = registration_timeslot(&event, New_York, full_day).unwrap();
                    assert_eq!(a, b);
                }
            }
        }

        #[test]
        fn ambiguous_fold_resolves_to_earliest() {
            // 01:30 on 2025-11-02 happens twice in New York; the earliest
            // mapping (EDT, UTC-4) wins.
            let naive = utc(2025, 11, 2, 1, 30, 0).naive_utc();
            let resolved = local_instant(New_York, naive).unwrap();
            assert_eq!(resolved.with_timezone(&Utc), utc(2025, 11, 2, 5, 30, 0));
        }

        #[test]
        fn dst_gap_is_an_error() {
            // 02:30 on 2025-03-09 does not exist in New York.
            let naive = utc(2025, 3, 9, 2, 30, 0).naive_utc();
            let err = local_instant(New_York, naive).unwrap_err();
            assert!(matches!(err, TimeslotError::NonexistentLocalTime { .. }));
        }
    }
}
