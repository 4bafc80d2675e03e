//! Configuration resolution for leafling
//!
//! Resolution priority per value: environment variable, then TOML config
//! file, then compiled default. Provider API keys and the JWT secret are
//! resolved once at startup and injected into the adapters; business logic
//! never reads process environment directly.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// Default listen port, matching the original deployment
const DEFAULT_PORT: u16 = 3000;

/// Default JWT lifetime in minutes
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Secret used to sign and verify bearer tokens
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    /// API key for the plant identification provider
    pub plant_id_api_key: String,
    /// API key for the text-generation provider
    pub gemini_api_key: String,
}

/// On-disk TOML configuration (all fields optional; env takes priority)
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<String>,
    pub jwt_secret: Option<String>,
    pub token_ttl_minutes: Option<i64>,
    pub plant_id_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment and the TOML config file.
    ///
    /// The config file path is `$LEAFLING_CONFIG` if set, otherwise
    /// `~/.config/leafling/config.toml`. A missing file is not an error;
    /// missing required secrets are.
    pub fn load() -> Result<Self> {
        let toml_config = load_toml_config()?;

        let host = env_or("LEAFLING_HOST", toml_config.host.clone())
            .unwrap_or_else(|| "127.0.0.1".to_string());

        let port = match env_or("PORT", None) {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT value: {}", raw))?,
            None => toml_config.port.unwrap_or(DEFAULT_PORT),
        };

        let database_path = env_or("LEAFLING_DB", toml_config.database_path.clone())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let jwt_secret = match env_or("JWT_SECRET", toml_config.jwt_secret.clone()) {
            Some(secret) if is_valid_key(&secret) => secret,
            _ => bail!(
                "JWT secret not configured. Set JWT_SECRET or add jwt_secret \
                 to the config file."
            ),
        };

        let plant_id_api_key =
            require_key("PLANT_ID_API_KEY", toml_config.plant_id_api_key.clone())?;

        // The original accepts either variable name for the Gemini key
        let gemini_api_key = match env_or("GEMINI_API_KEY", None)
            .or_else(|| env_or("GOOGLE_API_KEY", None))
            .or(toml_config.gemini_api_key.clone())
        {
            Some(key) if is_valid_key(&key) => key,
            _ => bail!(
                "Gemini API key not configured. Set GEMINI_API_KEY (or \
                 GOOGLE_API_KEY), or add gemini_api_key to the config file."
            ),
        };

        let token_ttl_minutes = toml_config
            .token_ttl_minutes
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);

        Ok(Config {
            host,
            port,
            database_path,
            jwt_secret,
            token_ttl_minutes,
            plant_id_api_key,
            gemini_api_key,
        })
    }
}

/// Validate an API key or secret (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn require_key(env_var: &str, toml_value: Option<String>) -> Result<String> {
    match env_or(env_var, toml_value) {
        Some(key) if is_valid_key(&key) => Ok(key),
        _ => bail!(
            "{} not configured. Set the environment variable or add the \
             corresponding key to the config file.",
            env_var
        ),
    }
}

fn env_or(var: &str, fallback: Option<String>) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty()).or(fallback)
}

fn load_toml_config() -> Result<TomlConfig> {
    let path = match std::env::var("LEAFLING_CONFIG") {
        Ok(explicit) => PathBuf::from(explicit),
        Err(_) => match dirs::config_dir() {
            Some(dir) => dir.join("leafling").join("config.toml"),
            None => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: TomlConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("leafling").join("leafling.db"))
        .unwrap_or_else(|| PathBuf::from("leafling.db"))
}
