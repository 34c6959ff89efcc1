//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `MERCHANT_TOKEN`: bearer token merchants must present (default: none, every merchant is trusted)
/// - `CONFLICT_RETRIES`: re-attempts of a write that lost a race (default `0`)
///
/// Unparseable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub merchant_token: Option<String>,
    pub conflict_retries: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            merchant_token: lookup("MERCHANT_TOKEN").filter(|token| !token.is_empty()),
            conflict_retries: lookup("CONFLICT_RETRIES")
                .and_then(|r| r.parse().ok())
                .unwrap_or(defaults.conflict_retries),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            merchant_token: None,
            conflict_retries: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.merchant_token, None);
        assert_eq!(config.conflict_retries, 0);
    }

    #[test]
    fn test_values_from_vars() {
        let config = from_map(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("RUST_LOG", "debug"),
            ("MERCHANT_TOKEN", "s3cret"),
            ("CONFLICT_RETRIES", "3"),
        ]);
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.merchant_token.as_deref(), Some("s3cret"));
        assert_eq!(config.conflict_retries, 3);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = from_map(&[("PORT", "http"), ("CONFLICT_RETRIES", "-1")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.conflict_retries, 0);
    }

    #[test]
    fn test_empty_token_means_no_token() {
        let config = from_map(&[("MERCHANT_TOKEN", "")]);
        assert_eq!(config.merchant_token, None);
    }

    #[test]
    fn test_addr_default() {
        assert_eq!(Config::default().addr(), "0.0.0.0:3000");
    }
}
