/// Configuration management for the social network service
///
/// Loads configuration from environment variables (after `.env` is applied by
/// `dotenvy` in `main`).
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token issuing configuration
    pub auth: AuthConfig,
    /// Scheduled post worker configuration
    pub scheduler: SchedulerConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production") || self.env.eq_ignore_ascii_case("prod")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown STORAGE_BACKEND '{other}' (expected postgres or memory)"),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Database URL, required for the postgres backend
    pub url: Option<String>,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Token issuing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
}

/// Scheduled post worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub batch_size: i64,
    /// Attempts before a job is marked failed
    pub max_attempts: i32,
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

// Only ever used outside production; production requires JWT_SECRET.
const DEVELOPMENT_JWT_SECRET: &str = "development-only-secret-change-me-0123456789";

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("APP_PORT", 8080),
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        };

        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Postgres,
        };

        let url = std::env::var("DATABASE_URL").ok();
        if backend == StorageBackend::Postgres && url.is_none() {
            bail!("DATABASE_URL environment variable not set");
        }

        let database = DatabaseConfig {
            backend,
            url,
            max_connections: env_parse("DB_MAX_CONNECTIONS", default_max_connections()),
            min_connections: env_parse("DB_MIN_CONNECTIONS", default_min_connections()),
        };

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if !app.is_production() => DEVELOPMENT_JWT_SECRET.to_string(),
            Err(_) => bail!("JWT_SECRET must be set in production"),
        };

        let auth = AuthConfig {
            jwt_secret,
            access_token_ttl_secs: env_parse("JWT_ACCESS_TTL_SECS", 86_400),
        };

        let scheduler = SchedulerConfig {
            enabled: env_parse("SCHEDULER_ENABLED", true),
            poll_interval_secs: env_parse("SCHEDULER_POLL_INTERVAL_SECS", 5),
            batch_size: env_parse("SCHEDULER_BATCH_SIZE", 50),
            max_attempts: env_parse("SCHEDULER_MAX_ATTEMPTS", 3),
        };

        let config = Config {
            app,
            cors,
            database,
            auth,
            scheduler,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.app.is_production() {
            let wildcard = self
                .cors
                .allowed_origins
                .split(',')
                .any(|origin| origin.trim() == "*");
            if wildcard {
                bail!("CORS_ALLOWED_ORIGINS must not contain '*' in production");
            }
        }
        if self.auth.access_token_ttl_secs <= 0 {
            bail!("JWT_ACCESS_TTL_SECS must be positive");
        }
        if self.scheduler.max_attempts < 1 {
            bail!("SCHEDULER_MAX_ATTEMPTS must be at least 1");
        }
        Ok(())
    }

    /// Allowed CORS origins, trimmed, empty entries removed
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors
            .allowed_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}
