//! Server configuration from environment variables.

use fitroom_core::call::DEFAULT_MAX_DURATION_MINUTES;

/// Runtime configuration for the fitroom server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:3040`.
    pub bind_addr: String,
    /// Maximum duration applied to new calls, in minutes.
    pub max_call_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3040".to_string(),
            max_call_minutes: DEFAULT_MAX_DURATION_MINUTES,
        }
    }
}

impl ServerConfig {
    /// Reads `FITROOM_ADDR` and `FITROOM_MAX_CALL_MINUTES`, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind_addr = std::env::var("FITROOM_ADDR").unwrap_or(defaults.bind_addr);
        let max_call_minutes = std::env::var("FITROOM_MAX_CALL_MINUTES")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.max_call_minutes);
        Self {
            bind_addr,
            max_call_minutes,
        }
    }
}
