//! Service configuration from environment

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::recommendations::{DEFAULT_LIMIT, DEFAULT_WINDOW_DAYS};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP API listen address
    pub http_addr: SocketAddr,
    /// Append-only entry log
    pub log_path: PathBuf,
    /// Recommendations returned when the request gives no limit
    pub recommendation_limit: i64,
    /// History page size when the request gives no limit
    pub history_limit: usize,
    /// Trailing window for recommendations, in days
    pub window_days: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            log_path: PathBuf::from("data/emissions.log"),
            recommendation_limit: DEFAULT_LIMIT,
            history_limit: 50,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Missing or unparsable values fall back to the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let listen_ip: IpAddr = lookup("CARBON_LISTEN_ADDR")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.http_addr.ip());

        let http_port: u16 = lookup("CARBON_HTTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.http_addr.port());

        Self {
            http_addr: SocketAddr::new(listen_ip, http_port),
            log_path: lookup("CARBON_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
            recommendation_limit: lookup("CARBON_RECOMMENDATION_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.recommendation_limit),
            history_limit: lookup("CARBON_HISTORY_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.history_limit),
            window_days: lookup("CARBON_WINDOW_DAYS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.window_days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.http_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_path, PathBuf::from("data/emissions.log"));
        assert_eq!(config.recommendation_limit, 5);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.window_days, 30);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CARBON_LISTEN_ADDR", "0.0.0.0"),
            ("CARBON_HTTP_PORT", "9090"),
            ("CARBON_LOG_PATH", "/tmp/carbon.log"),
            ("CARBON_RECOMMENDATION_LIMIT", "three"),
            ("CARBON_WINDOW_DAYS", "7"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.http_addr, "0.0.0.0:9090".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_path, PathBuf::from("/tmp/carbon.log"));
        assert_eq!(config.recommendation_limit, 5);
        assert_eq!(config.window_days, 7);
    }
}
