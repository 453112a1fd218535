//! Core types: events, timeslots, attendee roles, markers, reconciliation

pub mod attendees;
pub mod contact;
pub mod event;
pub mod marker;
pub mod reconcile;
pub mod template;
pub mod timeslot;
pub mod tracing;

pub use attendees::{AttendeeSet, classify};
pub use contact::{Contact, ContactRef, Role, RoleSet};
pub use event::CalendarEvent;
pub use marker::{MarkerError, RegistrationMarker};
pub use reconcile::{
    GateRefusal, Outcome, ReconciliationDecision, RegistrationState, gate, reconcile, state,
};
pub use template::{Message, TemplateError, render, split_message};
pub use timeslot::{CanonicalInterval, TimeslotError, registration_timeslot};
pub use crate::tracing::{LogMode, TracingError, init_tracing};
