// Centralized configuration management for cardlink
// Load ALL env vars ONCE at startup

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Global application configuration loaded once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    // For tests, load .env file first
    #[cfg(test)]
    dotenv::dotenv().ok();

    AppConfig::from_env().expect("Failed to load configuration")
});

/// Access the global configuration
pub fn config() -> &'static AppConfig {
    &CONFIG
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Server
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,
    pub rust_log: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_connect_timeout: u64,

    // Redis
    pub redis_url: String,

    // Admin gate
    pub admin_password: String,

    // Short links
    /// Base URL short links are shared under, e.g. https://qr.example.com
    pub public_base_url: String,
    /// The slug the public page and the analytics worker track by default
    pub default_slug: String,
    /// Placeholder country code recorded when the edge provides none
    pub default_country: String,

    // Contact card
    pub contact: ContactProfile,
}

/// The person/business the contact card describes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactProfile {
    pub full_name: String,
    pub organization: String,
    pub title_en: String,
    pub title_tr: String,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub website_primary: String,
    pub website_secondary: String,
    pub location_en: String,
    pub location_tr: String,
    pub instagram_url: String,
    /// Local path of the profile photo embedded into the vCard
    pub photo_path: Option<String>,
    /// Remote URL used when the photo file cannot be read
    pub photo_fallback_url: String,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "test" => Environment::Test,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: get_env_or("BIND_ADDRESS", "0.0.0.0"),
            port: parse_env_or("PORT", 8080)?,
            environment: Environment::from(get_env_or("ENVIRONMENT", "development")),
            rust_log: get_env_or("RUST_LOG", "cardlink=debug,tower_http=info"),

            database_url: get_env("DATABASE_URL")?,
            database_max_connections: parse_env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            database_connect_timeout: parse_env_or("DATABASE_CONNECT_TIMEOUT", 30)?,

            redis_url: get_env_or("REDIS_URL", "redis://127.0.0.1:6379"),

            admin_password: get_env("ADMIN_PASSWORD")?,

            public_base_url: get_env_or("PUBLIC_BASE_URL", "http://localhost:8080"),
            default_slug: get_env_or("DEFAULT_SLUG", "card"),
            default_country: get_env_or("DEFAULT_COUNTRY", "QA"),

            contact: ContactProfile::from_env(),
        })
    }
}

impl ContactProfile {
    /// Contact fields are optional overrides; the defaults keep the card usable
    /// out of the box for local development.
    pub fn from_env() -> Self {
        Self {
            full_name: get_env_or("CONTACT_NAME", "Cardlink Demo"),
            organization: get_env_or("CONTACT_ORG", "Cardlink"),
            title_en: get_env_or("CONTACT_TITLE_EN", "digital business cards"),
            title_tr: get_env_or("CONTACT_TITLE_TR", "dijital kartvizitler"),
            phone_primary: get_env_or("CONTACT_PHONE_PRIMARY", "+974 5000 0000"),
            phone_secondary: get_env_or("CONTACT_PHONE_SECONDARY", "+90 530 000 00 00"),
            website_primary: get_env_or("CONTACT_URL_PRIMARY", "https://www.example.com"),
            website_secondary: get_env_or("CONTACT_URL_SECONDARY", "https://www.example.com.tr"),
            location_en: get_env_or("CONTACT_LOCATION_EN", "Doha, Qatar"),
            location_tr: get_env_or("CONTACT_LOCATION_TR", "Doha, Katar"),
            instagram_url: get_env_or("CONTACT_INSTAGRAM", "https://www.instagram.com/example/"),
            photo_path: env::var("CONTACT_PHOTO_PATH").ok(),
            photo_fallback_url: get_env_or(
                "CONTACT_PHOTO_URL",
                "http://localhost:8080/profile.png",
            ),
        }
    }
}

fn get_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
}

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), value)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_aliases() {
        assert_eq!(
            Environment::from("prod".to_string()),
            Environment::Production
        );
        assert_eq!(Environment::from("test".to_string()), Environment::Test);
        assert_eq!(
            Environment::from("anything".to_string()),
            Environment::Development
        );
    }

    #[test]
    fn parse_env_or_falls_back_to_default() {
        let value: u16 = parse_env_or("CARDLINK_UNSET_TEST_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
