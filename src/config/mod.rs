use std::env;
use std::time::Duration;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app_host: String,
    pub app_port: u16,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub db_path: String,
    pub db_max_connections: u32,
    pub static_dir: String,
    pub ssh_timeout_secs: u64,
    pub ssh_read_quiet_ms: u64,
    pub ping_timeout_secs: u64,
    pub ping_max_amount: u32,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    /// Unparsable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            app_host: get("APP_HOST", "localhost"),
            app_port: get("APP_TCP_PORT", "3000").parse().unwrap_or(3000),
            log_level: get("APP_LOG_LEVEL", "info"),
            log_dir: lookup("LOG_DIR").filter(|dir| !dir.trim().is_empty()),
            db_path: get("DB_PATH", "hosts.db"),
            db_max_connections: get("DB_MAX_CONNECTIONS", "5").parse().unwrap_or(5),
            static_dir: get("STATIC_DIR", "static"),
            ssh_timeout_secs: get("SSH_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            ssh_read_quiet_ms: get("SSH_READ_QUIET_MS", "1500").parse().unwrap_or(1500),
            ping_timeout_secs: get("PING_TIMEOUT_SECS", "2").parse().unwrap_or(2),
            ping_max_amount: get("PING_MAX_AMOUNT", "20").parse().unwrap_or(20),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    pub fn ssh_read_quiet(&self) -> Duration {
        Duration::from_millis(self.ssh_read_quiet_ms)
    }
}
