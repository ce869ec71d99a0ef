// config.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    // Upload storage
    pub upload_dir: String,
    pub upload_max_bytes: usize,
    pub log_level: String,
}

const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. `init` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;

        let port = parse_or("PORT", lookup("PORT"), 8000u16)?;
        let database_max_connections =
            parse_or("DATABASE_MAX_CONNECTIONS", lookup("DATABASE_MAX_CONNECTIONS"), 10u32)?;
        let upload_max_bytes =
            parse_or("UPLOAD_MAX_BYTES", lookup("UPLOAD_MAX_BYTES"), DEFAULT_UPLOAD_MAX_BYTES)?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let upload_dir = lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads/images".to_string());
        let log_level = lookup("RUST_LOG_LEVEL").unwrap_or_else(|| "debug".to_string());

        Ok(Config {
            database_url,
            database_max_connections,
            jwt_secret,
            port,
            cors_origins,
            upload_dir,
            upload_max_bytes,
            log_level,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
