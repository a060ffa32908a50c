use anyhow::{Context, Result};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_RECONCILE_CONCURRENCY: usize = 8;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub max_connections: u32,
    pub reconcile_concurrency: usize,
}

impl ServiceConfig {
    pub fn worker_from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is required")?;
        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let reconcile_concurrency = match lookup("RECONCILE_CONCURRENCY") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("RECONCILE_CONCURRENCY is not a number: {raw}"))?
                .clamp(1, 64),
            None => DEFAULT_RECONCILE_CONCURRENCY,
        };

        Ok(Self {
            database_url,
            redis_url,
            max_connections,
            reconcile_concurrency,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServiceConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn database_url_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/cobranza")]).unwrap();

        assert_eq!(config.redis_url, None);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.reconcile_concurrency, 8);
    }

    #[test]
    fn concurrency_is_clamped() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/cobranza"),
            ("REDIS_URL", "redis://localhost"),
            ("RECONCILE_CONCURRENCY", "500"),
        ])
        .unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost"));
        assert_eq!(config.reconcile_concurrency, 64);
    }

    #[test]
    fn rejects_non_numeric_pool_size() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/cobranza"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ])
        .unwrap_err();

        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }
}
