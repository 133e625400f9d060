/// Configuration management for the API server
///
/// Loaded from environment variables, with a `.env` file picked up in
/// development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `PORT`: port to bind to (default: 3000)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: `*`)
/// - `APP_ENV`: `production` enables HSTS (default: development)
/// - `JWT_SECRET`: access token signing secret (required)
/// - `JWT_REFRESH_SECRET`: refresh token signing secret (required)
/// - `JWT_EXPIRES_IN`: access token lifetime (default: `1h`)
/// - `JWT_REFRESH_EXPIRES_IN`: refresh token lifetime (default: `7d`)
/// - `UPLOAD_DIR`: where uploaded files are stored (default: `./uploads`)
/// - `PUBLIC_FILES_URL`: URL prefix uploads are served under (default: `/files`)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
///
/// Durations are plain seconds or a number with an `s`, `m`, `h` or `d`
/// suffix.
///
/// # Example
///
/// ```no_run
/// use jobtrack_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use chrono::Duration;
use jobtrack_shared::auth::jwt::{JwtError, TokenConfig};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Access token secret
    pub secret: String,

    /// Refresh token secret
    pub refresh_secret: String,

    /// Access token lifetime
    pub access_ttl: Duration,

    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Upload storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory uploads are written to
    pub upload_dir: PathBuf,

    /// URL prefix the directory is served under
    pub public_url: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL`, `JWT_SECRET` or `JWT_REFRESH_SECRET` is missing
    /// - A numeric or duration variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let port = get("PORT", "3000")
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let max_connections = get("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let cors_origins = get("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let access_ttl = parse_duration(&get("JWT_EXPIRES_IN", "1h"))
            .context("JWT_EXPIRES_IN is not a valid duration")?;
        let refresh_ttl = parse_duration(&get("JWT_REFRESH_EXPIRES_IN", "7d"))
            .context("JWT_REFRESH_EXPIRES_IN is not a valid duration")?;

        let log_format = match get("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            api: ApiConfig {
                host: get("API_HOST", "0.0.0.0"),
                port,
                cors_origins,
                production: get("APP_ENV", "development").eq_ignore_ascii_case("production"),
            },
            database: DatabaseConfig {
                url: require("DATABASE_URL")?,
                max_connections,
            },
            jwt: JwtConfig {
                secret: require("JWT_SECRET")?,
                refresh_secret: require("JWT_REFRESH_SECRET")?,
                access_ttl,
                refresh_ttl,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from(get("UPLOAD_DIR", "./uploads")),
                public_url: get("PUBLIC_FILES_URL", "/files"),
            },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Signing configuration for the token issuer
    pub fn token_config(&self) -> Result<TokenConfig, JwtError> {
        Ok(TokenConfig::new(&self.jwt.secret, &self.jwt.refresh_secret)?
            .with_ttls(self.jwt.access_ttl, self.jwt.refresh_ttl))
    }
}

/// Longest accepted token lifetime: ten years
const MAX_TTL_SECONDS: i64 = 3650 * 24 * 60 * 60;

/// Parses `3600`, `90s`, `15m`, `1h` or `7d`
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    let (number, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], Some(c)),
        _ => (value, None),
    };

    let amount: i64 = number
        .parse()
        .with_context(|| format!("invalid duration '{}'", value))?;
    if amount <= 0 {
        anyhow::bail!("duration '{}' must be positive", value);
    }

    let unit_seconds: i64 = match unit {
        None | Some('s') => 1,
        Some('m') => 60,
        Some('h') => 60 * 60,
        Some('d') => 24 * 60 * 60,
        Some(other) => anyhow::bail!("unknown duration unit '{}' in '{}'", other, value),
    };

    let seconds = amount
        .checked_mul(unit_seconds)
        .filter(|s| *s <= MAX_TTL_SECONDS)
        .with_context(|| format!("duration '{}' exceeds the 3650 day maximum", value))?;

    Ok(Duration::seconds(seconds))
}
