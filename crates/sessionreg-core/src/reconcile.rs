//! The registration reconciler.
//!
//! Compares the freshly computed canonical interval and attendee set against
//! the previously persisted marker and decides whether a notification is due
//! and who receives it. The per-event state is derived each pass, never
//! persisted:
//!
//! | Previous marker | Interval match | Attendee delta | Action                   |
//! |-----------------|----------------|----------------|--------------------------|
//! | absent          | n/a            | n/a            | notify all, write marker |
//! | present         | mismatch       | any            | notify all, write marker |
//! | present         | match          | empty          | skip, no write           |
//! | present         | match          | non-empty      | notify new, write full   |

use chrono::Duration;

use crate::attendees::AttendeeSet;
use crate::event::CalendarEvent;
use crate::marker::RegistrationMarker;
use crate::timeslot::CanonicalInterval;

/// The derived per-pass registration state of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// No committed marker exists for the event.
    NeverSent,
    /// A marker exists but its interval no longer matches the live window.
    SentStale,
    /// The marker's interval matches the live window.
    SentCurrent,
}

/// Why an event was gated out before any marker read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRefusal {
    /// The vendor marked the event cancelled.
    Cancelled,
    /// The title does not contain the configured topic substring.
    TopicMismatch,
    /// No attendee classified into any recognized role.
    NoAttendees,
}

/// How the reconciler classified the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The notified window no longer matches the live window (or the event
    /// was never notified): everyone needs the corrected time.
    ScheduleChanged,
    /// The window is unchanged but new attendees appeared.
    AttendeeDelta,
    /// Nothing to do.
    UpToDate,
}

/// The reconciler's only output: send-or-skip, and to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationDecision {
    /// How the event was classified.
    pub outcome: Outcome,
    /// The role-partitioned recipients (empty when up to date).
    pub recipients: AttendeeSet,
}

impl ReconciliationDecision {
    /// Returns true if a notification is due.
    pub fn should_notify(&self) -> bool {
        self.outcome != Outcome::UpToDate
    }
}

/// Checks the gating conditions that must hold before any marker read or
/// write is attempted. An event refused here produces no side effect at all.
pub fn gate(event: &CalendarEvent, topic: &str, attendees: &AttendeeSet) -> Option<GateRefusal> {
    if event.is_cancelled {
        return Some(GateRefusal::Cancelled);
    }
    if !event.matches_topic(topic) {
        return Some(GateRefusal::TopicMismatch);
    }
    if attendees.is_empty() {
        return Some(GateRefusal::NoAttendees);
    }
    None
}

/// Derives the registration state from the marker and the live interval.
pub fn state(interval: CanonicalInterval, marker: Option<&RegistrationMarker>) -> RegistrationState {
    let Some(marker) = marker else {
        return RegistrationState::NeverSent;
    };
    // An absent marker behaves like a large positive delta; a present one is
    // stale as soon as the notified window drifted in either direction.
    let delta_start = marker.start - interval.start;
    let delta_end = interval.end - marker.end;
    if delta_start > Duration::zero() || delta_end > Duration::zero() {
        RegistrationState::SentStale
    } else {
        RegistrationState::SentCurrent
    }
}

/// Decides whether a notification is due and computes the recipient subset.
///
/// Schedule changes supersede attendee deltas: when the window moved, the
/// entire current attendee set is notified, not just the newcomers.
pub fn reconcile(
    interval: CanonicalInterval,
    marker: Option<&RegistrationMarker>,
    attendees: &AttendeeSet,
) -> ReconciliationDecision {
    match state(interval, marker) {
        RegistrationState::NeverSent | RegistrationState::SentStale => ReconciliationDecision {
            outcome: Outcome::ScheduleChanged,
            recipients: attendees.clone(),
        },
        RegistrationState::SentCurrent => {
            let marker = marker.expect("SentCurrent implies a marker");
            let delta = attendees.newly_added(&marker.roles);
            if delta.is_empty() {
                ReconciliationDecision {
                    outcome: Outcome::UpToDate,
                    recipients: AttendeeSet::default(),
                }
            } else {
                ReconciliationDecision {
                    outcome: Outcome::AttendeeDelta,
                    recipients: delta,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{ContactRef, RoleSet};
    use chrono::{DateTime, TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn interval() -> CanonicalInterval {
        CanonicalInterval::new(utc(2024, 9, 20, 4, 0, 0), utc(2024, 9, 21, 3, 59, 59))
    }

    fn attendees(students: &[&str], adults: &[&str]) -> AttendeeSet {
        let mut set = AttendeeSet::empty(&RoleSet::students_and_adults());
        for s in students {
            set.push("students", ContactRef::new(*s, "Student"));
        }
        for a in adults {
            set.push("adults", ContactRef::new(*a, "Adult"));
        }
        set
    }

    fn committed(set: &AttendeeSet) -> RegistrationMarker {
        RegistrationMarker::committed(interval(), set)
    }

    mod gating {
        use super::*;

        fn event() -> CalendarEvent {
            CalendarEvent::new(
                "evt-1",
                "Team Session",
                utc(2024, 9, 20, 20, 0, 0),
                utc(2024, 9, 20, 22, 0, 0),
            )
        }

        #[test]
        fn eligible_event_passes() {
            let set = attendees(&["ada@example.org"], &[]);
            assert_eq!(gate(&event(), "Team Session", &set), None);
        }

        #[test]
        fn cancelled_event_is_refused() {
            let set = attendees(&["ada@example.org"], &[]);
            assert_eq!(
                gate(&event().with_cancelled(true), "Team Session", &set),
                Some(GateRefusal::Cancelled)
            );
        }

        #[test]
        fn topic_mismatch_is_refused() {
            let set = attendees(&["ada@example.org"], &[]);
            assert_eq!(
                gate(&event(), "Scrimmage", &set),
                Some(GateRefusal::TopicMismatch)
            );
        }

        #[test]
        fn empty_attendee_set_is_refused() {
            let set = attendees(&[], &[]);
            assert_eq!(
                gate(&event(), "Team Session", &set),
                Some(GateRefusal::NoAttendees)
            );
        }
    }

    mod derived_state {
        use super::*;

        #[test]
        fn absent_marker_is_never_sent() {
            assert_eq!(state(interval(), None), RegistrationState::NeverSent);
        }

        #[test]
        fn matching_interval_is_current() {
            let marker = committed(&attendees(&["ada@example.org"], &[]));
            assert_eq!(state(interval(), Some(&marker)), RegistrationState::SentCurrent);
        }

        #[test]
        fn moved_end_is_stale() {
            let marker = committed(&attendees(&["ada@example.org"], &[]));
            let moved = CanonicalInterval::new(interval().start, interval().end + Duration::hours(1));
            assert_eq!(state(moved, Some(&marker)), RegistrationState::SentStale);
        }

        #[test]
        fn earlier_start_is_stale() {
            let marker = committed(&attendees(&["ada@example.org"], &[]));
            let moved =
                CanonicalInterval::new(interval().start - Duration::hours(1), interval().end);
            assert_eq!(state(moved, Some(&marker)), RegistrationState::SentStale);
        }

        #[test]
        fn shrunken_window_is_current() {
            // The marker still covers the live window; nothing drifted outward.
            let marker = committed(&attendees(&["ada@example.org"], &[]));
            let shrunk =
                CanonicalInterval::new(interval().start + Duration::hours(1), interval().end);
            assert_eq!(state(shrunk, Some(&marker)), RegistrationState::SentCurrent);
        }
    }

    mod decisions {
        use super::*;

        #[test]
        fn never_sent_notifies_everyone() {
            let set = attendees(&["ada@example.org", "jean@example.org"], &["grace@example.org"]);
            let decision = reconcile(interval(), None, &set);
            assert_eq!(decision.outcome, Outcome::ScheduleChanged);
            assert!(decision.should_notify());
            assert_eq!(decision.recipients, set);
        }

        #[test]
        fn schedule_change_supersedes_attendee_delta() {
            // Both the window and the attendees changed: everyone current is
            // notified, not just the newcomer.
            let old = attendees(&["ada@example.org"], &[]);
            let marker = committed(&old);
            let current = attendees(&["ada@example.org", "jean@example.org"], &[]);
            let moved = CanonicalInterval::new(interval().start, interval().end + Duration::hours(1));

            let decision = reconcile(moved, Some(&marker), &current);
            assert_eq!(decision.outcome, Outcome::ScheduleChanged);
            assert_eq!(decision.recipients, current);
        }

        #[test]
        fn unchanged_event_is_up_to_date() {
            let set = attendees(&["ada@example.org"], &["grace@example.org"]);
            let marker = committed(&set);
            let decision = reconcile(interval(), Some(&marker), &set);
            assert_eq!(decision.outcome, Outcome::UpToDate);
            assert!(!decision.should_notify());
            assert!(decision.recipients.is_empty());
        }

        #[test]
        fn grown_attendee_set_notifies_exactly_the_newcomers() {
            let old = attendees(&["ada@example.org"], &["grace@example.org"]);
            let marker = committed(&old);
            let current = attendees(
                &["ada@example.org", "jean@example.org"],
                &["grace@example.org"],
            );

            let decision = reconcile(interval(), Some(&marker), &current);
            assert_eq!(decision.outcome, Outcome::AttendeeDelta);
            let students: Vec<&str> = decision
                .recipients
                .bucket("students")
                .iter()
                .map(|c| c.mail.as_str())
                .collect();
            assert_eq!(students, vec!["jean@example.org"]);
            assert!(decision.recipients.bucket("adults").is_empty());
        }

        #[test]
        fn removed_attendee_alone_is_up_to_date() {
            let old = attendees(&["ada@example.org", "jean@example.org"], &[]);
            let marker = committed(&old);
            let current = attendees(&["ada@example.org"], &[]);
            let decision = reconcile(interval(), Some(&marker), &current);
            assert_eq!(decision.outcome, Outcome::UpToDate);
        }
    }
}
