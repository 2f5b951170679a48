//! Server configuration from environment variables

use crate::llm::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
use crate::responder::DelayRange;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DELAY_MIN_MS: u64 = 1000;
const DEFAULT_DELAY_MAX_MS: u64 = 3000;
const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown responder '{0}': expected rules, contacts or remote")]
    UnknownResponder(String),
    #[error("TELEDESK_REMOTE_URL must be set when TELEDESK_RESPONDER=remote")]
    MissingRemoteUrl,
}

/// Which backend answers questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderKind {
    /// Canned keyword answers after a simulated delay
    Rules,
    /// Local model writing SQL against the contacts database
    Contacts,
    /// Another server's `/api/teleData`
    Remote { base_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub responder: ResponderKind,
    pub contacts_db: PathBuf,
    pub ollama_url: String,
    pub ollama_model: String,
    pub delay: DelayRange,
    pub response_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let responder = match lookup("TELEDESK_RESPONDER")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            None | Some("" | "rules") => ResponderKind::Rules,
            Some("contacts") => ResponderKind::Contacts,
            Some("remote") => ResponderKind::Remote {
                base_url: lookup("TELEDESK_REMOTE_URL")
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::MissingRemoteUrl)?,
            },
            Some(other) => return Err(ConfigError::UnknownResponder(other.to_string())),
        };

        let contacts_db = lookup("TELEDESK_CONTACTS_DB").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.teledesk/contacts.db"))
            },
            PathBuf::from,
        );

        Ok(Self {
            port: lookup("TELEDESK_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            responder,
            contacts_db,
            ollama_url: lookup("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: lookup("OLLAMA_MODEL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            delay: DelayRange::new(
                Duration::from_millis(number("TELEDESK_DELAY_MIN_MS", DEFAULT_DELAY_MIN_MS)),
                Duration::from_millis(number("TELEDESK_DELAY_MAX_MS", DEFAULT_DELAY_MAX_MS)),
            ),
            response_timeout: Duration::from_secs(number(
                "TELEDESK_RESPONSE_TIMEOUT_SECS",
                DEFAULT_RESPONSE_TIMEOUT_SECS,
            )),
        })
    }
}
