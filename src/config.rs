use std::net::IpAddr;
use std::str::FromStr;

use tracing::Level;

const DEV_JWT_SECRET: &str = "insecure-development-secret";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("JWT_SECRET must be set when DEBUG is disabled")]
    MissingSecret,
}

/// Server configuration, read once at startup and shared immutably.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub port_attempts: u16,
    pub database_url: Option<String>,
    pub max_db_connections: u32,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub debug: bool,
    pub log_level: Level,
    pub allowed_origins: Vec<String>,
    pub security_headers: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = parse_or(&lookup, "DEBUG", false)?;

        let jwt_secret = match non_empty(&lookup, "JWT_SECRET") {
            Some(secret) => secret,
            None if debug => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::MissingSecret),
        };

        let allowed_origins = non_empty(&lookup, "ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: parse_or(&lookup, "HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or(&lookup, "PORT", 9500)?,
            port_attempts: parse_or(&lookup, "PORT_ATTEMPTS", 5)?,
            database_url: non_empty(&lookup, "DATABASE_URL"),
            max_db_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            redis_url: non_empty(&lookup, "REDIS_URL"),
            jwt_secret,
            jwt_ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 24)?,
            debug,
            log_level: parse_or(&lookup, "LOG_LEVEL", Level::INFO)?,
            allowed_origins,
            security_headers: parse_or(&lookup, "SECURITY_HEADERS", !debug)?,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_secret() {
        let config = config_from(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 9500);
        assert_eq!(config.port_attempts, 5);
        assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));
        assert!(config.database_url.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(config.jwt_ttl_hours, 24);
        assert!(!config.debug);
        assert!(config.security_headers);
        assert_eq!(config.log_level, Level::INFO);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_missing_secret_outside_debug() {
        match config_from(&[]) {
            Err(ConfigError::MissingSecret) => {}
            other => panic!("Expected MissingSecret, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_falls_back_to_dev_secret() {
        let config = config_from(&[("DEBUG", "true")]).unwrap();
        assert!(config.debug);
        assert!(config.uses_dev_secret());
        assert!(!config.security_headers);
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let result = config_from(&[("JWT_SECRET", "x"), ("PORT", "not-a-port")]);
        match result {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "PORT");
                assert_eq!(value, "not-a-port");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_origins_and_overrides() {
        let config = config_from(&[
            ("JWT_SECRET", "x"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,,"),
            ("DATABASE_URL", "postgres://localhost/social"),
            ("LOG_LEVEL", "debug"),
            ("SECURITY_HEADERS", "false"),
        ])
        .unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/social")
        );
        assert_eq!(config.log_level, Level::DEBUG);
        assert!(!config.security_headers);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = config_from(&[("JWT_SECRET", "x"), ("REDIS_URL", "   ")]).unwrap();
        assert!(config.redis_url.is_none());
    }
}
