use std::time::Duration;

use crate::errors::AppError;

/// Retry schedule for notification delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (1-based): base, 2x, 4x, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1 << exp)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 5, base_backoff: Duration::from_millis(200) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// `None` runs on the in-memory registry with seeded directory data.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub notify: RetryPolicy,
}

impl AppConfig {
    /// Read from the process environment (after `dotenvy` has loaded `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let number = |key: &str, default: u64| -> Result<u64, AppError> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| AppError::Config(format!("{key} must be a non-negative integer, got '{raw}'"))),
                None => Ok(default),
            }
        };

        let max_attempts = number("NOTIFY_MAX_ATTEMPTS", 5)?;
        if max_attempts == 0 {
            return Err(AppError::Config("NOTIFY_MAX_ATTEMPTS must be at least 1".into()));
        }

        Ok(AppConfig {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_max_connections: u32::try_from(number("DB_MAX_CONNECTIONS", 8)?)
                .map_err(|_| AppError::Config("DB_MAX_CONNECTIONS is too large".into()))?,
            notify: RetryPolicy {
                max_attempts: u32::try_from(max_attempts)
                    .map_err(|_| AppError::Config("NOTIFY_MAX_ATTEMPTS is too large".into()))?,
                base_backoff: Duration::from_millis(number("NOTIFY_BACKOFF_MS", 200)?),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.db_max_connections, 8);
        assert_eq!(cfg.notify, RetryPolicy::default());
    }

    #[test]
    fn overrides_and_blank_database_url() {
        let cfg = config(&[("DATABASE_URL", " "), ("NOTIFY_BACKOFF_MS", "50"), ("DB_MAX_CONNECTIONS", "2")]).unwrap();
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.db_max_connections, 2);
        assert_eq!(cfg.notify.base_backoff, Duration::from_millis(50));
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        assert!(matches!(config(&[("DB_MAX_CONNECTIONS", "eight")]), Err(AppError::Config(_))));
        assert!(matches!(config(&[("NOTIFY_MAX_ATTEMPTS", "0")]), Err(AppError::Config(_))));
    }

    #[test]
    fn backoff_doubles() {
        let p = RetryPolicy { max_attempts: 4, base_backoff: Duration::from_millis(100) };
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(3), Duration::from_millis(400));
    }
}
