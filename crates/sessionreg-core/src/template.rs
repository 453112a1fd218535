//! Mail template rendering.
//!
//! A pure string-transform collaborator: literal `{{placeholder}}`
//! substitution with no escaping and no loops. Placeholders with no
//! supplied value are left verbatim, which doubles as the fallback when a
//! custom template references a bucket the workflow does not use.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors produced while splitting a rendered template into a message.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The rendered template has no `Subject:` line.
    #[error("rendered template has no 'Subject:' line")]
    MissingSubject,
}

/// A rendered mail message, split into subject and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The subject line, trimmed.
    pub subject: String,
    /// Everything after the subject line.
    pub body: String,
}

/// Replaces every `{{key}}` occurrence with its value.
///
/// Substitution is literal and sequential over the keys in map order, so a
/// value containing a later key's placeholder is itself expanded.
pub fn render(template: &str, fields: &BTreeMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in fields {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

/// Splits a rendered template into subject and body.
///
/// The subject is the remainder of the first line starting with `Subject:`;
/// the body is everything after that line.
pub fn split_message(rendered: &str) -> Result<Message, TemplateError> {
    let start = rendered
        .find("Subject:")
        .ok_or(TemplateError::MissingSubject)?;
    let after = start + "Subject:".len();
    let line_end = rendered[after..]
        .find('\n')
        .map(|i| after + i)
        .unwrap_or(rendered.len());

    Ok(Message {
        subject: rendered[after..line_end].trim().to_string(),
        body: rendered
            .get(line_end + 1..)
            .unwrap_or_default()
            .to_string(),
    })
}
