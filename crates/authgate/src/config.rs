use std::{env, time::Duration};

/// Server configuration loaded from environment variables.
///
/// Auth settings live in `authgate_auth::AuthConfig`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
    /// Longest an auth event stream stays open, in seconds (default: 3600)
    pub events_max_duration_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REQUEST_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
    /// - `EVENTS_MAX_DURATION_SECS` - Auth event stream lifetime (default: 3600)
    pub fn from_env() -> Self {
        Self {
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            events_max_duration_secs: env::var("EVENTS_MAX_DURATION_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn events_max_duration(&self) -> Duration {
        Duration::from_secs(self.events_max_duration_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            events_max_duration_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        let config = Config {
            request_timeout_secs: 30,
            events_max_duration_secs: 60,
        };

        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.events_max_duration(), Duration::from_secs(60));
    }

    #[test]
    fn default_values() {
        let config = Config::default();

        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.events_max_duration_secs, 3600);
    }
}
