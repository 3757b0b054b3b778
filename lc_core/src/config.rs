//! Process-wide settings, built once at startup and passed down.

use std::{path::PathBuf, time::Duration};

pub static DEFAULT_CALENDAR_URL: &str = "http://www.belchertownps.org/sites/default/files/menus";
pub static DEFAULT_CACHE_DIR: &str = "./cache";
pub const DEFAULT_CACHE_TIMEOUT: u64 = 28800;
pub const DEFAULT_CACHE_THRESHOLD: usize = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 20;
pub static DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root under which the monthly menu pages are published.
    pub calendar_url: String,
    /// Timeout of a single menu page request.
    pub request_timeout: Duration,
    /// How long a served feed stays cached. Zero never expires.
    pub cache_timeout: Duration,
    pub cache_dir: PathBuf,
    /// Maximum number of cached feeds.
    pub cache_threshold: usize,
    pub log_level: String,
}

impl Config {
    /// The calendar root without trailing slashes.
    pub fn calendar_root(&self) -> &str {
        self.calendar_url.trim_end_matches('/')
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendar_url: String::from(DEFAULT_CALENDAR_URL),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
            cache_timeout: Duration::from_secs(DEFAULT_CACHE_TIMEOUT),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_threshold: DEFAULT_CACHE_THRESHOLD,
            log_level: String::from(DEFAULT_LOG_LEVEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_root_strips_trailing_slashes() {
        let config = Config {
            calendar_url: String::from("http://example.org/menus//"),
            ..Config::default()
        };
        assert_eq!(config.calendar_root(), "http://example.org/menus");
    }

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.calendar_root(), DEFAULT_CALENDAR_URL);
        assert_eq!(config.cache_timeout, Duration::from_secs(28800));
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.cache_threshold, 1000);
        assert_eq!(config.log_level, "info");
    }
}
