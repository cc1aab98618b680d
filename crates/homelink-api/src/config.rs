//! Callback server configuration.

use std::time::{Duration, Instant};

use homelink_core::Settings;

/// Callback server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Upper bound on one token exchange.
    pub exchange_timeout: Duration,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl ApiConfig {
    /// Creates a new configuration with the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Derive the server configuration from runtime settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.listen_host.clone(), settings.listen_port)
            .with_exchange_timeout(settings.http_timeout)
    }

    /// Sets the token exchange timeout.
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            exchange_timeout: Duration::from_secs(15),
            start_time: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.exchange_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_api_config_new() {
        let config = ApiConfig::new("127.0.0.1", 3000).with_exchange_timeout(Duration::from_secs(2));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.exchange_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_api_config_from_settings() {
        let settings = Settings::from_lookup(|key| match key {
            "TELEGRAM_BOT_TOKEN" => Some("t".to_string()),
            "HOMELINK_CLIENT_ID" => Some("id".to_string()),
            "HOMELINK_CLIENT_SECRET" => Some("secret".to_string()),
            "HOMELINK_LISTEN_PORT" => Some("9090".to_string()),
            "HOMELINK_HTTP_TIMEOUT_SECS" => Some("4".to_string()),
            _ => None,
        })
        .unwrap();

        let config = ApiConfig::from_settings(&settings);
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
        assert_eq!(config.exchange_timeout, Duration::from_secs(4));
    }
}
