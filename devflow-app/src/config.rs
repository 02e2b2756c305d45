use crate::infrastructure::db::RetryPolicy;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub txn_max_retries: u32,
    pub txn_retry_base: Duration,
    pub interaction_queue_capacity: usize,
    pub interaction_max_attempts: u32,
    pub session_ttl_hours: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            bind_addr: try_load(&lookup, "BIND_ADDR", "127.0.0.1:3000")?,
            db_max_connections: try_load(&lookup, "DB_MAX_CONNECTIONS", "10")?,
            txn_max_retries: try_load(&lookup, "TXN_MAX_RETRIES", "3")?,
            txn_retry_base: Duration::from_millis(try_load(&lookup, "TXN_RETRY_BASE_MS", "25")?),
            interaction_queue_capacity: try_load(&lookup, "INTERACTION_QUEUE_CAPACITY", "1024")?,
            interaction_max_attempts: try_load(&lookup, "INTERACTION_MAX_ATTEMPTS", "3")?,
            session_ttl_hours: try_load(&lookup, "SESSION_TTL_HOURS", "24")?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.txn_max_retries, self.txn_retry_base)
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        tracing::info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "sqlite::memory:")])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.retry_policy(), RetryPolicy::new(3, Duration::from_millis(25)));
        assert_eq!(config.interaction_queue_capacity, 1024);
        assert_eq!(config.interaction_max_attempts, 3);
        assert_eq!(config.session_ttl_hours, 24);
    }

    #[test]
    fn test_missing_database_url() {
        assert_eq!(
            AppConfig::from_lookup(lookup_from(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn test_invalid_value() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("TXN_MAX_RETRIES", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TXN_MAX_RETRIES", .. }));
    }
}
