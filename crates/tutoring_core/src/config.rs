//! Runtime configuration loaded from a TOML file.
//!
//! # Invariants
//! - `signing_secret` is always present and long enough to sign links.
//! - `Debug` output never contains the secret.

use crate::link::feedback_link::{FeedbackLinkSigner, DEFAULT_MAX_AGE_SECS, MIN_SECRET_BYTES};
use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_PATH: &str = "tutoring.sqlite3";
const DEFAULT_MAIL_FROM: &str = "no-reply@tutoring.invalid";
const DEFAULT_SITE_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_SCHEDULE_WINDOW_DAYS: u32 = 7;

/// On-disk shape; every key is optional except where `AppConfig` says so.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    log_level: Option<String>,
    log_dir: Option<PathBuf>,
    signing_secret: Option<String>,
    feedback_link_max_age_secs: Option<u64>,
    mail_from: Option<String>,
    site_base_url: Option<String>,
    schedule_window_days: Option<u32>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    /// A value is present but unusable.
    Invalid { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "unable to read config file `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "unable to parse config file: {err}"),
            Self::Invalid { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

/// Validated application settings.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub signing_secret: String,
    pub feedback_link_max_age_secs: u64,
    pub mail_from: String,
    pub site_base_url: String,
    pub schedule_window_days: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_path", &self.database_path)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .field("signing_secret", &"<redacted>")
            .field("feedback_link_max_age_secs", &self.feedback_link_max_age_secs)
            .field("mail_from", &self.mail_from)
            .field("site_base_url", &self.site_base_url)
            .field("schedule_window_days", &self.schedule_window_days)
            .finish()
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents).map_err(ConfigError::Parse)?;

        let signing_secret = file.signing_secret.ok_or(ConfigError::Invalid {
            key: "signing_secret",
            message: "is required".to_string(),
        })?;
        if signing_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid {
                key: "signing_secret",
                message: format!("must be at least {MIN_SECRET_BYTES} bytes"),
            });
        }

        let log_level = match file.log_level {
            Some(level) => normalize_level(&level).map_err(|err| ConfigError::Invalid {
                key: "log_level",
                message: err.to_string(),
            })?,
            None => default_log_level(),
        };

        if let Some(dir) = file.log_dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    key: "log_dir",
                    message: "must be an absolute path".to_string(),
                });
            }
        }

        let feedback_link_max_age_secs = file
            .feedback_link_max_age_secs
            .unwrap_or(DEFAULT_MAX_AGE_SECS);
        if feedback_link_max_age_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "feedback_link_max_age_secs",
                message: "must be positive".to_string(),
            });
        }

        let schedule_window_days = file
            .schedule_window_days
            .unwrap_or(DEFAULT_SCHEDULE_WINDOW_DAYS);
        if schedule_window_days == 0 {
            return Err(ConfigError::Invalid {
                key: "schedule_window_days",
                message: "must be positive".to_string(),
            });
        }

        Ok(Self {
            database_path: file
                .database_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            log_level: log_level.to_string(),
            log_dir: file.log_dir,
            signing_secret,
            feedback_link_max_age_secs,
            mail_from: file
                .mail_from
                .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            site_base_url: file
                .site_base_url
                .unwrap_or_else(|| DEFAULT_SITE_BASE_URL.to_string()),
            schedule_window_days,
        })
    }

    /// Link signer keyed with the configured secret.
    pub fn link_signer(&self) -> Result<FeedbackLinkSigner, ConfigError> {
        FeedbackLinkSigner::new(&self.signing_secret).map_err(|err| ConfigError::Invalid {
            key: "signing_secret",
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_LINE: &str = "signing_secret = \"0123456789abcdef0123\"\n";

    #[test]
    fn minimal_file_falls_back_to_defaults() {
        let config = AppConfig::from_toml_str(SECRET_LINE).unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.feedback_link_max_age_secs, 86_400);
        assert_eq!(config.schedule_window_days, 7);
        assert_eq!(config.log_dir, None);
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let text = format!(
            "{SECRET_LINE}database_path = \"/var/lib/tutoring/db.sqlite3\"
log_level = \"WARNING\"
log_dir = \"/var/log/tutoring\"
feedback_link_max_age_secs = 3600
mail_from = \"tutoring@example.edu\"
site_base_url = \"https://tutoring.example.edu\"
schedule_window_days = 14
"
        );
        let config = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/tutoring")));
        assert_eq!(config.feedback_link_max_age_secs, 3600);
        assert_eq!(config.schedule_window_days, 14);
        assert_eq!(config.site_base_url, "https://tutoring.example.edu");
    }

    #[test]
    fn missing_or_short_secret_is_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str(""),
            Err(ConfigError::Invalid { key: "signing_secret", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("signing_secret = \"short\""),
            Err(ConfigError::Invalid { key: "signing_secret", .. })
        ));
    }

    #[test]
    fn bad_values_are_rejected() {
        let relative_dir = format!("{SECRET_LINE}log_dir = \"logs\"");
        assert!(matches!(
            AppConfig::from_toml_str(&relative_dir),
            Err(ConfigError::Invalid { key: "log_dir", .. })
        ));

        let zero_age = format!("{SECRET_LINE}feedback_link_max_age_secs = 0");
        assert!(matches!(
            AppConfig::from_toml_str(&zero_age),
            Err(ConfigError::Invalid { key: "feedback_link_max_age_secs", .. })
        ));

        let unknown_key = format!("{SECRET_LINE}colour = \"blue\"");
        assert!(matches!(
            AppConfig::from_toml_str(&unknown_key),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = AppConfig::from_toml_str(SECRET_LINE).unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("0123456789abcdef0123"));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tutoring.toml");
        std::fs::write(&path, SECRET_LINE).unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert!(config.link_signer().is_ok());

        let missing = AppConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
