use std::time::Duration;

use dealer_events::ReconnectConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for each background service (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// First delay before resubscribing to the change feed (default: `1000`).
    pub realtime_initial_delay_ms: u64,
    /// Cap on the resubscribe delay (default: `30`).
    pub realtime_max_delay_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                    |
    /// | `REALTIME_INITIAL_DELAY_MS` | `1000`                  |
    /// | `REALTIME_MAX_DELAY_SECS`   | `30`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", "30")
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let realtime_initial_delay_ms: u64 = env_or("REALTIME_INITIAL_DELAY_MS", "1000")
            .parse()
            .expect("REALTIME_INITIAL_DELAY_MS must be a valid u64");

        let realtime_max_delay_secs: u64 = env_or("REALTIME_MAX_DELAY_SECS", "30")
            .parse()
            .expect("REALTIME_MAX_DELAY_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            realtime_initial_delay_ms,
            realtime_max_delay_secs,
        }
    }

    /// Backoff parameters for the realtime fan-out.
    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.realtime_initial_delay_ms),
            max_delay: Duration::from_secs(self.realtime_max_delay_secs),
            ..ReconnectConfig::default()
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}
