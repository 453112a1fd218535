//! Directory contacts and the configurable role set.
//!
//! Contacts come from the directory gateway with zero or more role tags
//! (vendor "categories"). Which tags are recognized, and which bucket each
//! tag feeds, is declared configuration rather than hard-coded: one workflow
//! may run with `{student, adult}`, another with `{student, coach, mentor}`.

use serde::{Deserialize, Serialize};

/// A directory contact.
///
/// Sourced fresh each run from the directory gateway; read-only to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// The contact's display name.
    pub display_name: String,
    /// Email addresses for this contact (vendor-normalized strings).
    pub emails: Vec<String>,
    /// Role tags attached to the contact (vendor categories, free-form).
    pub roles: Vec<String>,
}

impl Contact {
    /// Creates a new contact with the given display name.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            emails: Vec::new(),
            roles: Vec::new(),
        }
    }

    /// Builder method to add an email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.emails.push(email.into());
        self
    }

    /// Builder method to add a role tag.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Returns true if one of the contact's addresses matches `email`
    /// exactly (case-sensitive, vendor-normalized comparison).
    pub fn has_email(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e == email)
    }
}

/// The stable identity of a contact as persisted in a registration marker.
///
/// Serialization must be round-trippable: the email is the identity key used
/// for attendee-delta matching, the name is carried for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    /// The attendee email that matched this contact.
    pub mail: String,
    /// The contact's display name.
    pub name: String,
}

impl ContactRef {
    /// Creates a new contact reference.
    pub fn new(mail: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mail: mail.into(),
            name: name.into(),
        }
    }
}

/// One recognized role: a tag to match against contact roles and the bucket
/// it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// The tag as it appears on contacts, matched case-insensitively.
    pub tag: String,
    /// The bucket (and marker property) name, e.g. "students".
    pub bucket: String,
}

/// The closed, ordered set of recognized attendee roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Builds a role set from `(tag, bucket)` pairs, preserving order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            roles: pairs
                .into_iter()
                .map(|(tag, bucket)| Role {
                    tag: tag.into(),
                    bucket: bucket.into(),
                })
                .collect(),
        }
    }

    /// The default student/adult pairing.
    pub fn students_and_adults() -> Self {
        Self::from_pairs([("student", "students"), ("adult", "adults")])
    }

    /// Iterates the recognized roles in declaration order.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    /// Iterates the bucket names in declaration order.
    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.bucket.as_str())
    }

    /// Returns the bucket fed by `tag`, if the tag is recognized.
    pub fn bucket_for(&self, tag: &str) -> Option<&str> {
        self.roles
            .iter()
            .find(|r| r.tag.eq_ignore_ascii_case(tag))
            .map(|r| r.bucket.as_str())
    }

    /// Number of recognized roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns true if no roles are declared.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self::students_and_adults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_builder() {
        let contact = Contact::new("Ada Lovelace")
            .with_email("ada@example.org")
            .with_email("ada@school.org")
            .with_role("Student");

        assert!(contact.has_email("ada@example.org"));
        assert!(contact.has_email("ada@school.org"));
        assert!(!contact.has_email("other@example.org"));
        assert_eq!(contact.roles, vec!["Student"]);
    }

    #[test]
    fn email_match_is_case_sensitive() {
        let contact = Contact::new("Ada").with_email("Ada@Example.org");
        assert!(!contact.has_email("ada@example.org"));
        assert!(contact.has_email("Ada@Example.org"));
    }

    #[test]
    fn role_set_lookup_ignores_tag_case() {
        let roles = RoleSet::students_and_adults();
        assert_eq!(roles.bucket_for("student"), Some("students"));
        assert_eq!(roles.bucket_for("Student"), Some("students"));
        assert_eq!(roles.bucket_for("ADULT"), Some("adults"));
        assert_eq!(roles.bucket_for("coach"), None);
    }

    #[test]
    fn role_set_preserves_declaration_order() {
        let roles = RoleSet::from_pairs([
            ("student", "students"),
            ("coach", "coaches"),
            ("mentor", "mentors"),
        ]);
        let buckets: Vec<&str> = roles.buckets().collect();
        assert_eq!(buckets, vec!["students", "coaches", "mentors"]);
        assert_eq!(roles.len(), 3);
    }

    #[test]
    fn contact_ref_serializes_to_identity_record() {
        let c = ContactRef::new("ada@example.org", "Ada Lovelace");
        let json = serde_json::to_string(&c).unwrap();
        let parsed: ContactRef = serde_json::from_str(&json).unwrap();
        assert_eq!(c, parsed);
        assert!(json.contains("\"mail\""));
        assert!(json.contains("\"name\""));
    }
}
