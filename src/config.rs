use std::env;

use chrono_tz::Tz;

use crate::i18n;
use crate::services::table::{LockPolicy, TableSettings};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub event_service: EventServiceConfig,
    pub ui: UiConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static` (stylesheet and the focus/scroll script).
    pub static_dir: String,
}

#[derive(Debug, Clone)]
pub struct EventServiceConfig {
    /// Base URL of the event service, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Path of the listing endpoint below `base_url`.
    pub events_path: String,
    /// Path of the submission endpoint below `base_url` (`/edit` on older deployments).
    pub edit_path: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Short language code used for labels, messages and date formatting.
    pub language: String,
    pub timezone: Tz,
    /// Number of scouter slots every row is padded to.
    pub scouter_slots: usize,
    pub lock_policy: LockPolicy,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Replenish interval for the submit endpoint, in seconds per request (per IP)
    pub submit_per_second: u64,
    /// Burst size for the submit endpoint
    pub submit_burst: u32,
}

impl UiConfig {
    pub fn table_settings(&self) -> TableSettings {
        TableSettings {
            timezone: self.timezone,
            scouter_slots: self.scouter_slots,
            lock_policy: self.lock_policy,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let base_url = var("EVENT_SERVICE_URL")
            .ok_or_else(|| ConfigError::MissingEnv("EVENT_SERVICE_URL".to_string()))?;
        url::Url::parse(&base_url)
            .map_err(|_| ConfigError::InvalidValue("EVENT_SERVICE_URL".to_string()))?;

        let language = i18n::normalize_language(&or_default("LANGUAGE", i18n::DEFAULT_LANG));
        if !i18n::is_supported_language(&language) {
            return Err(ConfigError::InvalidValue("LANGUAGE".to_string()));
        }

        let scouter_slots: usize = or_default("SCOUTER_SLOTS", "3")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SCOUTER_SLOTS".to_string()))?;
        if !(1..=8).contains(&scouter_slots) {
            return Err(ConfigError::InvalidValue("SCOUTER_SLOTS".to_string()));
        }

        Ok(Config {
            server: ServerConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: or_default("PORT", "3000")
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                static_dir: or_default("STATIC_DIR", "static"),
            },
            event_service: EventServiceConfig {
                base_url,
                events_path: or_default("EVENTS_PATH", "/list/events"),
                edit_path: or_default("EDIT_PATH", "/list/edit"),
                timeout_seconds: or_default("EVENT_SERVICE_TIMEOUT_SECONDS", "30")
                    .parse()
                    .unwrap_or(30),
            },
            ui: UiConfig {
                language,
                timezone: or_default("TIMEZONE", "Europe/Berlin")
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("TIMEZONE".to_string()))?,
                scouter_slots,
                lock_policy: or_default("LOCK_POLICY", "full")
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("LOCK_POLICY".to_string()))?,
            },
            rate_limit: RateLimitConfig {
                submit_per_second: or_default("RATE_LIMIT_SUBMIT_PER_SECOND", "1")
                    .parse()
                    .unwrap_or(1),
                submit_burst: or_default("RATE_LIMIT_SUBMIT_BURST", "5")
                    .parse()
                    .unwrap_or(5),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                static_dir: "static".to_string(),
            },
            event_service: EventServiceConfig {
                base_url: "http://localhost:5000".to_string(),
                events_path: "/list/events".to_string(),
                edit_path: "/list/edit".to_string(),
                timeout_seconds: 30,
            },
            ui: UiConfig {
                language: i18n::DEFAULT_LANG.to_string(),
                timezone: chrono_tz::Europe::Berlin,
                scouter_slots: 3,
                lock_policy: LockPolicy::Full,
            },
            rate_limit: RateLimitConfig {
                submit_per_second: 1,
                submit_burst: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_service_url_is_set() {
        let config = Config::from_vars(vars(&[("EVENT_SERVICE_URL", "http://events:5000")])).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.event_service.events_path, "/list/events");
        assert_eq!(config.event_service.edit_path, "/list/edit");
        assert_eq!(config.ui.language, "de");
        assert_eq!(config.ui.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.ui.scouter_slots, 3);
        assert_eq!(config.ui.lock_policy, LockPolicy::Full);
    }

    #[test]
    fn service_url_is_required() {
        let err = Config::from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref k) if k == "EVENT_SERVICE_URL"));
    }

    #[test]
    fn rejects_unsupported_language_and_bad_slots() {
        let err = Config::from_vars(vars(&[
            ("EVENT_SERVICE_URL", "http://events"),
            ("LANGUAGE", "fr"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == "LANGUAGE"));

        let err = Config::from_vars(vars(&[
            ("EVENT_SERVICE_URL", "http://events"),
            ("SCOUTER_SLOTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == "SCOUTER_SLOTS"));
    }

    #[test]
    fn parses_overrides() {
        let config = Config::from_vars(vars(&[
            ("EVENT_SERVICE_URL", "http://events"),
            ("EDIT_PATH", "/edit"),
            ("LANGUAGE", "en-US"),
            ("TIMEZONE", "UTC"),
            ("SCOUTER_SLOTS", "4"),
            ("LOCK_POLICY", "scouters"),
        ]))
        .unwrap();

        assert_eq!(config.event_service.edit_path, "/edit");
        assert_eq!(config.ui.language, "en");
        assert_eq!(config.ui.timezone, chrono_tz::UTC);
        assert_eq!(config.ui.scouter_slots, 4);
        assert_eq!(config.ui.lock_policy, LockPolicy::Scouters);
    }
}
