use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::analytics::FacadeOptions;
use crate::constants::{
    DEFAULT_FETCH_CONCURRENCY, DEFAULT_TOPIC_LIMIT_SCHOOL, DEFAULT_TOPIC_LIMIT_SCOPED,
    MAX_TOPIC_LIMIT,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Upper bound on concurrent collaborator calls while building one report.
    pub fetch_concurrency: usize,
    pub topic_limit_school: usize,
    pub topic_limit_scoped: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            topic_limit_school: DEFAULT_TOPIC_LIMIT_SCHOOL,
            topic_limit_scoped: DEFAULT_TOPIC_LIMIT_SCOPED,
        }
    }
}

impl AnalyticsConfig {
    /// Weakest-topic cap for a view. An explicit request wins but is kept within
    /// `1..=MAX_TOPIC_LIMIT`.
    pub fn topic_limit(&self, school_wide: bool, requested: Option<usize>) -> usize {
        let limit = match requested {
            Some(requested) => requested,
            None if school_wide => self.topic_limit_school,
            None => self.topic_limit_scoped,
        };
        limit.clamp(1, MAX_TOPIC_LIMIT)
    }

    pub fn facade_options(&self, topic_limit: usize) -> FacadeOptions {
        FacadeOptions {
            topic_limit,
            fetch_concurrency: self.fetch_concurrency.max(1),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/assessment.sled"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            analytics: AnalyticsConfig {
                fetch_concurrency: env_or_parse(
                    "ANALYTICS_FETCH_CONCURRENCY",
                    DEFAULT_FETCH_CONCURRENCY,
                )
                .max(1),
                topic_limit_school: env_or_parse(
                    "ANALYTICS_TOPIC_LIMIT_SCHOOL",
                    DEFAULT_TOPIC_LIMIT_SCHOOL,
                ),
                topic_limit_scoped: env_or_parse(
                    "ANALYTICS_TOPIC_LIMIT_SCOPED",
                    DEFAULT_TOPIC_LIMIT_SCOPED,
                ),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
