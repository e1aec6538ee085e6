use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use turnstile_application::{MembershipWriteMode, ReadRetryPolicy};
use turnstile_core::{AppError, TenantId, UserIdentity};

const MIN_API_TOKEN_LENGTH: usize = 32;

/// Backing store for the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStoreConfig {
    /// PostgreSQL store reached through `DATABASE_URL`.
    Postgres { database_url: String },
    /// Process-local store, emptied on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub catalog_store: CatalogStoreConfig,
    pub frontend_url: String,
    pub api_token: String,
    pub api_subject: String,
    pub tenant_id: TenantId,
    pub api_host: String,
    pub api_port: u16,
    pub membership_write_mode: MembershipWriteMode,
    pub read_retry: ReadRetryPolicy,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let catalog_store = match lookup("CATALOG_STORE")
            .unwrap_or_else(|| "postgres".to_owned())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" => CatalogStoreConfig::Postgres {
                database_url: required(&lookup, "DATABASE_URL")?,
            },
            "memory" => CatalogStoreConfig::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "CATALOG_STORE must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        if migrate_only && catalog_store == CatalogStoreConfig::Memory {
            return Err(AppError::Validation(
                "the migrate command requires CATALOG_STORE=postgres".to_owned(),
            ));
        }

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let api_token = required(&lookup, "API_TOKEN")?;
        if api_token.len() < MIN_API_TOKEN_LENGTH {
            return Err(AppError::Validation(format!(
                "API_TOKEN must be at least {MIN_API_TOKEN_LENGTH} characters"
            )));
        }

        let api_subject = lookup("API_SUBJECT")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "admin".to_owned());
        let tenant_id = uuid::Uuid::parse_str(required(&lookup, "TENANT_ID")?.trim())
            .map(TenantId::from_uuid)
            .map_err(|error| AppError::Validation(format!("invalid TENANT_ID: {error}")))?;

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let membership_write_mode = lookup("MEMBERSHIP_WRITE_MODE")
            .map(|value| MembershipWriteMode::from_str(value.as_str()))
            .transpose()?
            .unwrap_or_default();

        let attempts = parse_number(&lookup, "READ_RETRY_ATTEMPTS")?.unwrap_or(3);
        let backoff_ms = parse_number(&lookup, "READ_RETRY_BACKOFF_MS")?.unwrap_or(50);
        let read_retry = ReadRetryPolicy::new(
            u32::try_from(attempts).unwrap_or(u32::MAX),
            Duration::from_millis(backoff_ms),
        );

        Ok(Self {
            migrate_only,
            catalog_store,
            frontend_url,
            api_token,
            api_subject,
            tenant_id,
            api_host,
            api_port,
            membership_write_mode,
            read_retry,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    /// Caller identity bound to the configured API token.
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(
            self.api_subject.as_str(),
            self.api_subject.as_str(),
            self.tenant_id,
        )
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, AppError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<u64>, AppError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use turnstile_application::MembershipWriteMode;
    use turnstile_core::AppError;

    use super::{ApiConfig, CatalogStoreConfig};

    const TENANT: &str = "5f0c6a3e-9c1b-4f7e-8a52-2d4b7e1f0c11";
    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    fn load(values: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(false, |name| values.get(name).cloned())
    }

    #[test]
    fn memory_store_needs_no_database() {
        let config = load(&[
            ("CATALOG_STORE", "memory"),
            ("API_TOKEN", TOKEN),
            ("TENANT_ID", TENANT),
            ("MEMBERSHIP_WRITE_MODE", "strict"),
        ])
        .unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(config.catalog_store, CatalogStoreConfig::Memory);
        assert_eq!(config.membership_write_mode, MembershipWriteMode::Strict);
        assert_eq!(config.api_subject, "admin");
        assert_eq!(config.read_retry.attempts(), 3);
        assert_eq!(config.identity().tenant_id().to_string(), TENANT);
    }

    #[test]
    fn postgres_store_requires_database_url() {
        let result = load(&[("API_TOKEN", TOKEN), ("TENANT_ID", TENANT)]);
        assert!(matches!(
            result,
            Err(AppError::Validation(message)) if message.contains("DATABASE_URL")
        ));
    }

    #[test]
    fn short_api_token_is_rejected() {
        let result = load(&[
            ("CATALOG_STORE", "memory"),
            ("API_TOKEN", "short"),
            ("TENANT_ID", TENANT),
        ]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
