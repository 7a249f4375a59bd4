//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. Everything is read once at startup.

use shop_auth::auth::{CredentialHasher, HashingConfig, TokenConfig};
use shop_auth::db::{DatabaseConfig, timeouts::DEFAULT_STORE_TIMEOUT};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8001;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Which credential store backs the service
    pub store_backend: StoreBackend,
    /// Database configuration (used by the PostgreSQL backend)
    pub database: DatabaseConfig,
    /// Bound on every store call
    pub store_timeout: Duration,
    /// Security configuration
    pub security: SecurityConfig,
    /// Prometheus exporter address, if enabled
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Password hasher work factor
    pub hashing: HashingConfig,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("hashing", &self.hashing)
            .finish()
    }
}

/// Credential store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}' (expected postgres or memory)")),
        }
    }
}

/// Values supplied on the command line, taking priority over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub in_memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values from CLI args
    ///
    /// # Errors
    ///
    /// Returns error if `JWT_SECRET` is missing or short, or if a set
    /// variable cannot be parsed
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        // Bind address
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => match std::env::var("SERVER_BIND") {
                Ok(raw) => parse_value("SERVER_BIND", &raw)?,
                Err(_) => {
                    let port = parse_env_or("PORT", DEFAULT_PORT)?;
                    SocketAddr::from(([0, 0, 0, 0], port))
                }
            },
        };

        let store_backend = if overrides.in_memory {
            StoreBackend::Memory
        } else {
            parse_env_or("STORE_BACKEND", StoreBackend::Postgres)?
        };

        // Database configuration
        let defaults = DatabaseConfig::development();
        let database_url = overrides
            .database_url
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or(defaults.database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            )?,
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs)?,
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs)?,
        };

        let store_timeout = Duration::from_millis(parse_env_or(
            "STORE_TIMEOUT_MS",
            DEFAULT_STORE_TIMEOUT.as_millis() as u64,
        )?);

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        if jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        let hashing_defaults = HashingConfig::default();
        let security = SecurityConfig {
            jwt_secret,
            access_token_ttl: Duration::from_secs(parse_env_or("ACCESS_TOKEN_TTL_SECS", 900)?),
            refresh_token_ttl: Duration::from_secs(parse_env_or(
                "REFRESH_TOKEN_TTL_SECS",
                604_800,
            )?),
            hashing: HashingConfig {
                memory_kib: parse_env_or("ARGON2_MEMORY_KIB", hashing_defaults.memory_kib)?,
                iterations: parse_env_or("ARGON2_ITERATIONS", hashing_defaults.iterations)?,
                parallelism: parse_env_or("ARGON2_PARALLELISM", hashing_defaults.parallelism)?,
            },
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_value("METRICS_BIND", &raw)?),
            _ => None,
        };

        Ok(ServerConfig {
            bind,
            store_backend,
            database,
            store_timeout,
            security,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.access_token_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_TTL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.security.refresh_token_ttl <= self.security.access_token_ttl {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_SECS".to_string(),
                reason: format!(
                    "Must be greater than access token lifetime ({}s)",
                    self.security.access_token_ttl.as_secs()
                ),
            });
        }

        if self.store_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "STORE_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        self.security
            .hashing
            .validate()
            .map_err(|e| ConfigError::Invalid {
                var: "ARGON2_*".to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    /// Signing configuration for the token issuer and verifier
    pub fn token_config(&self) -> Result<TokenConfig, ConfigError> {
        let to_chrono = |var: &str, d: Duration| {
            chrono::Duration::from_std(d).map_err(|e| ConfigError::Invalid {
                var: var.to_string(),
                reason: e.to_string(),
            })
        };
        TokenConfig::new(
            &self.security.jwt_secret,
            to_chrono("ACCESS_TOKEN_TTL_SECS", self.security.access_token_ttl)?,
            to_chrono("REFRESH_TOKEN_TTL_SECS", self.security.refresh_token_ttl)?,
        )
        .map_err(|e| ConfigError::Invalid {
            var: "JWT_SECRET".to_string(),
            reason: e.to_string(),
        })
    }

    /// Password hasher with the configured work factor
    pub fn credential_hasher(&self) -> Result<CredentialHasher, ConfigError> {
        CredentialHasher::new(self.security.hashing).map_err(|e| ConfigError::Invalid {
            var: "ARGON2_*".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an environment variable with default fallback
///
/// An unset variable yields the default; a set but unparseable one is an
/// error rather than a silent fallback.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "JWT_SECRET",
        "SERVER_BIND",
        "PORT",
        "DATABASE_URL",
        "STORE_BACKEND",
        "STORE_TIMEOUT_MS",
        "ACCESS_TOKEN_TTL_SECS",
        "REFRESH_TOKEN_TTL_SECS",
        "ARGON2_MEMORY_KIB",
        "ARGON2_ITERATIONS",
        "ARGON2_PARALLELISM",
        "DB_MAX_CONNECTIONS",
        "DB_MIN_CONNECTIONS",
        "DB_CONNECTION_TIMEOUT_SECS",
        "DB_IDLE_TIMEOUT_SECS",
        "DB_MAX_LIFETIME_SECS",
        "METRICS_BIND",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment run under #[serial]
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment run under #[serial]
        unsafe { std::env::set_var(key, value) };
    }

    fn sample_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8001".parse().unwrap(),
            store_backend: StoreBackend::Memory,
            database: DatabaseConfig::development(),
            store_timeout: Duration::from_secs(5),
            security: SecurityConfig {
                jwt_secret: "a".repeat(32),
                access_token_ttl: Duration::from_secs(900),
                refresh_token_ttl: Duration::from_secs(604_800),
                hashing: HashingConfig::for_tests(),
            },
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    #[serial]
    fn test_missing_secret_fails_closed() {
        clear_env();
        let err = ServerConfig::from_env(CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    #[serial]
    fn test_short_secret_rejected() {
        clear_env();
        set_env("JWT_SECRET", "too-short");
        let err = ServerConfig::from_env(CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        set_env("JWT_SECRET", &"s".repeat(32));
        let config = ServerConfig::from_env(CliOverrides::default()).unwrap();

        assert_eq!(config.bind, "0.0.0.0:8001".parse::<SocketAddr>().unwrap());
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.security.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.security.refresh_token_ttl, Duration::from_secs(604_800));
        assert_eq!(config.security.hashing, HashingConfig::default());
        assert!(config.metrics_bind.is_none());
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn test_port_and_overrides() {
        clear_env();
        set_env("JWT_SECRET", &"s".repeat(32));
        set_env("PORT", "9100");
        let config = ServerConfig::from_env(CliOverrides::default()).unwrap();
        assert_eq!(config.bind.port(), 9100);

        set_env("SERVER_BIND", "127.0.0.1:7000");
        let config = ServerConfig::from_env(CliOverrides::default()).unwrap();
        assert_eq!(config.bind, "127.0.0.1:7000".parse::<SocketAddr>().unwrap());

        let config = ServerConfig::from_env(CliOverrides {
            bind: Some("127.0.0.1:7001".parse().unwrap()),
            database_url: Some("postgres://cli@localhost/db".to_string()),
            in_memory: true,
        })
        .unwrap();
        assert_eq!(config.bind.port(), 7001);
        assert_eq!(config.database.database_url, "postgres://cli@localhost/db");
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }

    #[test]
    #[serial]
    fn test_unparseable_value_is_error() {
        clear_env();
        set_env("JWT_SECRET", &"s".repeat(32));
        set_env("STORE_TIMEOUT_MS", "soon");
        let err = ServerConfig::from_env(CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "STORE_TIMEOUT_MS"));

        set_env("STORE_TIMEOUT_MS", "100");
        set_env("STORE_BACKEND", "redis");
        let err = ServerConfig::from_env(CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "STORE_BACKEND"));
        clear_env();
    }

    #[test]
    fn test_validation_access_ttl_not_shorter() {
        let mut config = sample_config();
        config.security.refresh_token_ttl = config.security.access_token_ttl;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "REFRESH_TOKEN_TTL_SECS"));
    }

    #[test]
    fn test_validation_zero_values() {
        let mut config = sample_config();
        config.security.access_token_ttl = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.store_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_argon2_params() {
        let mut config = sample_config();
        config.security.hashing.iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = sample_config();
        assert!(!format!("{config:?}").contains(&"a".repeat(32)));
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
