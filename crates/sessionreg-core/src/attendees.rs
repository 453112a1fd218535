//! Attendee classification.
//!
//! Resolves event attendee emails against the directory and partitions them
//! into role buckets. An attendee matching no contact, or a contact carrying
//! no recognized tag, is logged and dropped; that is an observable warning,
//! not a failure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::contact::{Contact, ContactRef, RoleSet};

/// Event attendees partitioned into role buckets.
///
/// Within each bucket, order of appearance in the attendee list is
/// preserved. A contact holding several recognized tags appears in every
/// matching bucket; that duplication is intentional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeSet {
    buckets: BTreeMap<String, Vec<ContactRef>>,
}

impl AttendeeSet {
    /// Creates an attendee set with one empty bucket per recognized role.
    pub fn empty(roles: &RoleSet) -> Self {
        Self {
            buckets: roles
                .buckets()
                .map(|b| (b.to_string(), Vec::new()))
                .collect(),
        }
    }

    /// Appends a contact to a bucket.
    pub fn push(&mut self, bucket: &str, contact: ContactRef) {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .push(contact);
    }

    /// Returns the members of a bucket (empty slice if absent).
    pub fn bucket(&self, name: &str) -> &[ContactRef] {
        self.buckets.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates `(bucket, members)` pairs in stable (alphabetical) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ContactRef])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total number of classified attendees across all buckets.
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Returns true if every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Consumes the set, returning the underlying bucket map.
    pub fn into_buckets(self) -> BTreeMap<String, Vec<ContactRef>> {
        self.buckets
    }

    /// Computes the members present here but absent from `previous`,
    /// bucket by bucket, matching on the email identity key.
    ///
    /// Buckets `previous` does not know about are returned whole.
    pub fn newly_added(&self, previous: &BTreeMap<String, Vec<ContactRef>>) -> AttendeeSet {
        let mut delta = AttendeeSet::default();
        for (bucket, members) in &self.buckets {
            let known: Vec<&str> = previous
                .get(bucket)
                .map(|old| old.iter().map(|c| c.mail.as_str()).collect())
                .unwrap_or_default();
            let new: Vec<ContactRef> = members
                .iter()
                .filter(|c| !known.contains(&c.mail.as_str()))
                .cloned()
                .collect();
            delta.buckets.insert(bucket.clone(), new);
        }
        delta
    }
}

impl From<BTreeMap<String, Vec<ContactRef>>> for AttendeeSet {
    fn from(buckets: BTreeMap<String, Vec<ContactRef>>) -> Self {
        Self { buckets }
    }
}

/// Classifies event attendees against the directory.
///
/// For each attendee email (in order), the first contact with an exactly
/// matching address wins; the contact is appended to every bucket whose tag
/// it carries. Absence of matches yields empty buckets, never an error.
pub fn classify(attendees: &[String], contacts: &[Contact], roles: &RoleSet) -> AttendeeSet {
    let mut set = AttendeeSet::empty(roles);

    for email in attendees {
        let Some(contact) = contacts.iter().find(|c| c.has_email(email)) else {
            warn!(attendee = %email, "attendee not found in contacts");
            continue;
        };

        let mut classified = false;
        for tag in &contact.roles {
            if let Some(bucket) = roles.bucket_for(tag) {
                set.push(bucket, ContactRef::new(email, &contact.display_name));
                classified = true;
            }
        }
        if !classified {
            warn!(
                contact = %contact.display_name,
                "contact carries no recognized role tag"
            );
        }
    }

    set
}
