//! Controller configuration

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::messages::Locale;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/top100Films";
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_QUERY_DEBOUNCE_MS: u64 = 500;
/// Scroll events have their own, fixed quiet period
pub const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 50.0;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {message}")]
    InvalidValue {
        name: &'static str,
        value: String,
        message: String,
    },

    #[error("failed to read {name}: {source}")]
    EnvVar {
        name: &'static str,
        #[source]
        source: std::env::VarError,
    },
}

/// Recognized options for a [`SearchController`](crate::SearchController)
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search endpoint
    pub endpoint: String,
    /// Results per page (`_limit`)
    pub page_size: usize,
    /// Quiet period after the last keystroke before page 1 is fetched
    pub query_debounce_ms: u64,
    /// Quiet period after the last near-bottom scroll event
    pub scroll_debounce_ms: u64,
    /// Distance from the bottom of the list, in pixels, that triggers a prefetch
    pub scroll_threshold_px: f64,
    pub request_timeout_ms: u64,
    pub locale: Locale,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            query_debounce_ms: DEFAULT_QUERY_DEBOUNCE_MS,
            scroll_debounce_ms: DEFAULT_SCROLL_DEBOUNCE_MS,
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            locale: Locale::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_query_debounce(mut self, wait: Duration) -> Self {
        self.query_debounce_ms = wait.as_millis() as u64;
        self
    }

    pub fn with_scroll_threshold_px(mut self, px: f64) -> Self {
        self.scroll_threshold_px = px;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn query_debounce(&self) -> Duration {
        Duration::from_millis(self.query_debounce_ms)
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Build a configuration from environment variables, falling back to defaults.
    ///
    /// # Environment Variables
    ///
    /// - `AUTOCOMPLETE_ENDPOINT`: search endpoint URL
    /// - `AUTOCOMPLETE_PAGE_SIZE`: results per page
    /// - `AUTOCOMPLETE_DEBOUNCE_MS`: keystroke debounce in milliseconds
    /// - `AUTOCOMPLETE_SCROLL_THRESHOLD_PX`: prefetch distance from the bottom
    /// - `AUTOCOMPLETE_LOCALE`: `en` or `fa`
    ///
    /// Blank variables count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let endpoint = env_var("AUTOCOMPLETE_ENDPOINT")?.unwrap_or(defaults.endpoint);
        let page_size = parse_env("AUTOCOMPLETE_PAGE_SIZE", defaults.page_size, |s| {
            match s.parse::<usize>() {
                Ok(0) => Err("page size must be at least 1".to_string()),
                Ok(n) => Ok(n),
                Err(e) => Err(e.to_string()),
            }
        })?;
        let query_debounce_ms = parse_env("AUTOCOMPLETE_DEBOUNCE_MS", defaults.query_debounce_ms, |s| {
            s.parse::<u64>().map_err(|e| e.to_string())
        })?;
        let scroll_threshold_px = parse_env(
            "AUTOCOMPLETE_SCROLL_THRESHOLD_PX",
            defaults.scroll_threshold_px,
            |s| match s.parse::<f64>() {
                Ok(px) if px.is_finite() && px >= 0.0 => Ok(px),
                Ok(_) => Err("threshold must be a non-negative number".to_string()),
                Err(e) => Err(e.to_string()),
            },
        )?;
        let locale = parse_env("AUTOCOMPLETE_LOCALE", defaults.locale, |s| s.parse::<Locale>())?;

        Ok(Self {
            endpoint,
            page_size,
            query_debounce_ms,
            scroll_threshold_px,
            locale,
            ..defaults
        })
    }
}

fn env_var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar { name, source }),
    }
}

fn parse_env<T>(
    name: &'static str,
    default: T,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    match env_var(name)? {
        None => Ok(default),
        Some(value) => parse(value.trim()).map_err(|message| ConfigError::InvalidValue {
            name,
            value,
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.scroll_debounce(), Duration::from_millis(300));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: SearchConfig =
            serde_json::from_str(r#"{ "page_size": 10, "locale": "fa" }"#).unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.locale, Locale::Fa);
        assert_eq!(config.query_debounce_ms, DEFAULT_QUERY_DEBOUNCE_MS);
    }

    #[test]
    fn builder_clamps_page_size() {
        let config = SearchConfig::default()
            .with_page_size(0)
            .with_query_debounce(Duration::from_millis(250));
        assert_eq!(config.page_size, 1);
        assert_eq!(config.query_debounce_ms, 250);
    }

    // All environment cases live in one test so parallel tests never race on the
    // process environment.
    #[test]
    fn from_env_parses_and_rejects() {
        let vars = [
            "AUTOCOMPLETE_ENDPOINT",
            "AUTOCOMPLETE_PAGE_SIZE",
            "AUTOCOMPLETE_DEBOUNCE_MS",
            "AUTOCOMPLETE_SCROLL_THRESHOLD_PX",
            "AUTOCOMPLETE_LOCALE",
        ];
        for var in vars {
            std::env::remove_var(var);
        }
        assert_eq!(SearchConfig::from_env().unwrap(), SearchConfig::default());

        std::env::set_var("AUTOCOMPLETE_ENDPOINT", "http://search.test/films");
        std::env::set_var("AUTOCOMPLETE_PAGE_SIZE", " 15 ");
        std::env::set_var("AUTOCOMPLETE_DEBOUNCE_MS", "");
        std::env::set_var("AUTOCOMPLETE_LOCALE", "fa");
        let config = SearchConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "http://search.test/films");
        assert_eq!(config.page_size, 15);
        assert_eq!(config.query_debounce_ms, DEFAULT_QUERY_DEBOUNCE_MS);
        assert_eq!(config.locale, Locale::Fa);

        std::env::set_var("AUTOCOMPLETE_PAGE_SIZE", "0");
        let err = SearchConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("AUTOCOMPLETE_PAGE_SIZE"), "{err}");

        std::env::set_var("AUTOCOMPLETE_PAGE_SIZE", "20");
        std::env::set_var("AUTOCOMPLETE_SCROLL_THRESHOLD_PX", "-4");
        assert!(matches!(
            SearchConfig::from_env(),
            Err(ConfigError::InvalidValue { name: "AUTOCOMPLETE_SCROLL_THRESHOLD_PX", .. })
        ));

        for var in vars {
            std::env::remove_var(var);
        }
    }
}
