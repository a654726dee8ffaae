//! Configuration loading and validation.
//!
//! Everything is read from environment variables with `from_env()` and checked
//! with `validate()`. The [`AuthorizeNetConfig`] value is passed by reference
//! into every gateway-facing operation; there is no global settings lookup.

use std::env;
use std::str::FromStr;

/// Top-level configuration for the reconciliation engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub authorizenet: AuthorizeNetConfig,
}

/// Gateway environment selection. Sandbox and production use different hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEnvironment {
    Production,
    Sandbox,
}

impl GatewayEnvironment {
    pub fn api_url(&self) -> &'static str {
        match self {
            GatewayEnvironment::Production => "https://api.authorize.net/xml/v1/request.api",
            GatewayEnvironment::Sandbox => "https://apitest.authorize.net/xml/v1/request.api",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayEnvironment::Production => "production",
            GatewayEnvironment::Sandbox => "sandbox",
        }
    }
}

impl FromStr for GatewayEnvironment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "production" => Ok(GatewayEnvironment::Production),
            "sandbox" => Ok(GatewayEnvironment::Sandbox),
            _ => Err(ConfigError::InvalidValue(format!(
                "AUTHORIZENET_ENVIRONMENT must be 'production' or 'sandbox', got '{}'",
                value
            ))),
        }
    }
}

/// Merchant credentials and per-method settings for Authorize.Net.
#[derive(Debug, Clone)]
pub struct AuthorizeNetConfig {
    pub environment: GatewayEnvironment,
    pub login_id: String,
    pub transaction_key: String,
    /// HMAC-SHA512 key for webhook signature verification.
    pub signature_key: String,
    /// Client key used by the browser-side tokenization script.
    pub public_client_key: String,
    /// Shown in gateway order descriptions, e.g. the shop or event name.
    pub event_label: String,
    pub enabled: bool,
    pub method_creditcard: bool,
    pub request_timeout_secs: u64,
}

impl AuthorizeNetConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(AuthorizeNetConfig {
            environment: env::var("AUTHORIZENET_ENVIRONMENT")
                .unwrap_or_else(|_| "production".to_string())
                .parse()?,
            login_id: env::var("AUTHORIZENET_LOGIN_ID")
                .map_err(|_| ConfigError::MissingVariable("AUTHORIZENET_LOGIN_ID".to_string()))?,
            transaction_key: env::var("AUTHORIZENET_TRANSACTION_KEY").map_err(|_| {
                ConfigError::MissingVariable("AUTHORIZENET_TRANSACTION_KEY".to_string())
            })?,
            signature_key: env::var("AUTHORIZENET_SIGNATURE_KEY").map_err(|_| {
                ConfigError::MissingVariable("AUTHORIZENET_SIGNATURE_KEY".to_string())
            })?,
            public_client_key: env::var("AUTHORIZENET_PUBLIC_CLIENT_KEY").unwrap_or_default(),
            event_label: env::var("AUTHORIZENET_EVENT_LABEL").unwrap_or_default(),
            enabled: env::var("AUTHORIZENET_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("AUTHORIZENET_ENABLED".to_string()))?,
            method_creditcard: env::var("AUTHORIZENET_METHOD_CREDITCARD")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("AUTHORIZENET_METHOD_CREDITCARD".to_string())
                })?,
            request_timeout_secs: env::var("AUTHORIZENET_REQUEST_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("AUTHORIZENET_REQUEST_TIMEOUT".to_string())
                })?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.login_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "AUTHORIZENET_LOGIN_ID cannot be empty".to_string(),
            ));
        }
        if self.transaction_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "AUTHORIZENET_TRANSACTION_KEY cannot be empty".to_string(),
            ));
        }
        if self.signature_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "AUTHORIZENET_SIGNATURE_KEY cannot be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "AUTHORIZENET_REQUEST_TIMEOUT cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database configuration for the reference index.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,   // seconds
    pub idle_timeout: Option<u64>, // seconds
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingVariable("DATABASE_URL".to_string()))?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MIN_CONNECTIONS".to_string()))?,
            connection_timeout: env::var("DB_CONNECTION_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_CONNECTION_TIMEOUT".to_string()))?,
            idle_timeout: env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|val| val.parse().ok()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::InvalidValue("DATABASE_URL".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                "DB_MIN_CONNECTIONS must be <= DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone)]
pub enum LogFormat {
    Json,
    Plain,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            database: DatabaseConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            authorizenet: AuthorizeNetConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.logging.validate()?;
        self.authorizenet.validate()?;
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}
