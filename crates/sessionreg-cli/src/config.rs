//! Batch configuration.
//!
//! Loaded from a TOML file; every knob except the calendar name has a
//! default matching the team's standing workflow. Validation happens once
//! at startup, before any gateway call, so a bad configuration never leaves
//! a half-processed pass behind.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use sessionreg_core::RoleSet;

/// Errors produced while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file '{path}'")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("configuration names no calendar ([calendar] name is required)")]
    MissingCalendarName,

    #[error("'{0}' is not a known IANA timezone")]
    InvalidTimeZone(String),

    #[error("[calendar.roles] must declare at least one role")]
    EmptyRoleSet,

    #[error("[mail] to is required")]
    MissingRecipient,
}

/// The full batch configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Team name substituted into the mail template.
    #[serde(default = "default_team")]
    pub team: String,
    pub mail: MailConfig,
    pub calendar: CalendarConfig,
}

/// Mail delivery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// The single recipient every notification goes to.
    pub to: String,
    /// Path to the mail template file.
    #[serde(default = "default_template")]
    pub template: String,
}

/// Calendar scanning settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarConfig {
    /// Display name of the calendar to scan.
    pub name: String,
    /// Substring an event title must contain to be considered.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// How many days ahead to scan.
    #[serde(default = "default_days")]
    pub days: i64,
    /// IANA timezone the sessions are anchored in.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Whether to widen every session window to the whole local day.
    #[serde(default = "default_full_day")]
    pub full_day: bool,
    /// Recognized role tags, mapping tag to bucket name.
    #[serde(default = "default_roles")]
    pub roles: BTreeMap<String, String>,
}

fn default_team() -> String {
    "MantaBots".to_string()
}

fn default_template() -> String {
    "mail_pattern.txt".to_string()
}

fn default_topic() -> String {
    "Team Session".to_string()
}

fn default_days() -> i64 {
    1
}

fn default_time_zone() -> String {
    "America/New_York".to_string()
}

fn default_full_day() -> bool {
    true
}

fn default_roles() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("student".to_string(), "students".to_string()),
        ("adult".to_string(), "adults".to_string()),
    ])
}

impl Config {
    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates field values beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calendar.name.trim().is_empty() {
            return Err(ConfigError::MissingCalendarName);
        }
        if self.mail.to.trim().is_empty() {
            return Err(ConfigError::MissingRecipient);
        }
        if self.calendar.roles.is_empty() {
            return Err(ConfigError::EmptyRoleSet);
        }
        self.zone()?;
        Ok(())
    }

    /// The configured timezone, parsed.
    pub fn zone(&self) -> Result<Tz, ConfigError> {
        self.calendar
            .time_zone
            .parse()
            .map_err(|_| ConfigError::InvalidTimeZone(self.calendar.time_zone.clone()))
    }

    /// The configured role set.
    pub fn role_set(&self) -> RoleSet {
        RoleSet::from_pairs(
            self.calendar
                .roles
                .iter()
                .map(|(tag, bucket)| (tag.clone(), bucket.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let file = write_config(
            r#"
            [mail]
            to = "team@example.org"

            [calendar]
            name = "Team Calendar"
            "#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.team, "MantaBots");
        assert_eq!(config.mail.template, "mail_pattern.txt");
        assert_eq!(config.calendar.topic, "Team Session");
        assert_eq!(config.calendar.days, 1);
        assert_eq!(config.calendar.time_zone, "America/New_York");
        assert!(config.calendar.full_day);
        assert_eq!(config.role_set().len(), 2);
        assert_eq!(config.role_set().bucket_for("Student"), Some("students"));
    }

    #[test]
    fn full_config_overrides_defaults() {
        let file = write_config(
            r#"
            team = "RoboRaiders"

            [mail]
            to = "raiders@example.org"
            template = "notify.txt"

            [calendar]
            name = "Robotics"
            topic = "Scrimmage"
            days = 7
            time_zone = "Europe/Paris"
            full_day = false

            [calendar.roles]
            student = "students"
            coach = "coaches"
            "#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.team, "RoboRaiders");
        assert_eq!(config.calendar.days, 7);
        assert_eq!(config.zone().unwrap(), chrono_tz::Europe::Paris);
        assert_eq!(config.role_set().bucket_for("coach"), Some("coaches"));
        assert_eq!(config.role_set().bucket_for("adult"), None);
    }

    #[test]
    fn missing_calendar_name_is_fatal() {
        let file = write_config(
            r#"
            [mail]
            to = "team@example.org"

            [calendar]
            name = "  "
            "#,
        );
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::MissingCalendarName)
        ));
    }

    #[test]
    fn bad_timezone_is_fatal() {
        let file = write_config(
            r#"
            [mail]
            to = "team@example.org"

            [calendar]
            name = "Team Calendar"
            time_zone = "Mars/Olympus_Mons"
            "#,
        );
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let file = write_config(
            r#"
            [mail]
            to = "team@example.org"
            cc = "other@example.org"

            [calendar]
            name = "Team Calendar"
            "#,
        );
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(matches!(
            Config::load("/nonexistent/sessionreg.toml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
