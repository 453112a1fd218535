//! The persisted registration marker.
//!
//! A [`RegistrationMarker`] is the "last notified" snapshot attached to one
//! calendar event, stored vendor-side as a flat property blob. It is the
//! only durable state this system owns.
//!
//! Wire shape: `sent` as "true"/"false", `start`/`end` as
//! `%Y-%m-%dT%H:%M:%S%.6f%z` timestamps, and one property per role bucket
//! holding `;`-joined JSON identity records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::attendees::AttendeeSet;
use crate::contact::{ContactRef, RoleSet};
use crate::timeslot::CanonicalInterval;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%z";

/// Errors produced while decoding a marker property blob.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// A marker with `sent=true` is missing a required field.
    #[error("marker is marked sent but is missing the '{0}' property")]
    MissingField(&'static str),

    /// A timestamp property failed to parse.
    #[error("marker property '{field}' holds an invalid timestamp")]
    InvalidTimestamp {
        field: &'static str,
        #[source]
        source: chrono::ParseError,
    },

    /// A role bucket holds an unparseable identity record.
    #[error("marker bucket '{bucket}' holds an invalid identity record")]
    InvalidRecord {
        bucket: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The persisted "last notified" state for one event.
///
/// Invariant: `sent` is always true for a decoded marker; an absent blob or
/// `sent=false` decodes to `None` ("never notified").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationMarker {
    /// Canonical UTC start of the interval that was last notified.
    pub start: DateTime<Utc>,
    /// Canonical UTC end of the interval that was last notified.
    pub end: DateTime<Utc>,
    /// The full attendee set that was notified, per role bucket.
    pub roles: BTreeMap<String, Vec<ContactRef>>,
}

impl RegistrationMarker {
    /// Builds the marker to commit after a successful send.
    ///
    /// Always encodes the full current attendee set and interval, not the
    /// delta: the next pass diffs against the last fully-committed set.
    pub fn committed(interval: CanonicalInterval, attendees: &AttendeeSet) -> Self {
        Self {
            start: interval.start,
            end: interval.end,
            roles: attendees.clone().into_buckets(),
        }
    }

    /// The interval that was last notified.
    pub fn interval(&self) -> CanonicalInterval {
        CanonicalInterval::new(self.start, self.end)
    }

    /// Encodes the marker into the flat property blob.
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        props.insert("sent".to_string(), "true".to_string());
        props.insert(
            "start".to_string(),
            self.start.format(TIMESTAMP_FORMAT).to_string(),
        );
        props.insert(
            "end".to_string(),
            self.end.format(TIMESTAMP_FORMAT).to_string(),
        );
        for (bucket, members) in &self.roles {
            let records: Vec<String> = members
                .iter()
                .map(|c| serde_json::to_string(c).expect("ContactRef serializes"))
                .collect();
            props.insert(bucket.clone(), records.join(";"));
        }
        props
    }

    /// Decodes a flat property blob.
    ///
    /// Returns `Ok(None)` when the blob does not represent a committed
    /// marker (`sent` absent or not "true"). Unknown properties (vendor
    /// metadata) are ignored; only the buckets declared in `roles` are read,
    /// and a missing bucket decodes as empty.
    pub fn from_properties(
        props: &BTreeMap<String, String>,
        roles: &RoleSet,
    ) -> Result<Option<Self>, MarkerError> {
        if props.get("sent").map(String::as_str) != Some("true") {
            return Ok(None);
        }

        let start = parse_timestamp(props, "start")?;
        let end = parse_timestamp(props, "end")?;

        let mut buckets = BTreeMap::new();
        for bucket in roles.buckets() {
            let members = match props.get(bucket) {
                Some(raw) if !raw.is_empty() => raw
                    .split(';')
                    .map(|record| {
                        serde_json::from_str::<ContactRef>(record).map_err(|source| {
                            MarkerError::InvalidRecord {
                                bucket: bucket.to_string(),
                                source,
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            buckets.insert(bucket.to_string(), members);
        }

        Ok(Some(Self {
            start,
            end,
            roles: buckets,
        }))
    }
}

fn parse_timestamp(
    props: &BTreeMap<String, String>,
    field: &'static str,
) -> Result<DateTime<Utc>, MarkerError> {
    let raw = props.get(field).ok_or(MarkerError::MissingField(field))?;
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| MarkerError::InvalidTimestamp { field, source })
}
