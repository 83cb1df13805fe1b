use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::{Locale, RatioScaling};

const DEFAULT_EXCHANGE_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub model: ModelConfig,
    pub catalog: CatalogConfig,
    pub currency: CurrencyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let model_path = env::var("APP_MODEL_PATH")
            .unwrap_or_else(|_| "models/credit_model.json".to_string());
        let ratio_scaling = match env::var("APP_RATIO_SCALING") {
            Ok(raw) => RatioScaling::parse(&raw).ok_or(ConfigError::InvalidRatioScaling(raw))?,
            Err(_) => RatioScaling::default(),
        };

        let locale = match env::var("APP_LOCALE") {
            Ok(raw) => Locale::parse(&raw).ok_or(ConfigError::InvalidLocale(raw))?,
            Err(_) => Locale::default(),
        };
        let catalog_path = env::var("APP_FEATURE_CATALOG").ok().map(PathBuf::from);

        let base_url = env::var("APP_EXCHANGE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_EXCHANGE_BASE_URL.to_string());
        let api_key = env::var("APP_EXCHANGE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let timeout_ms = env::var("APP_EXCHANGE_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;
        let fixed_rate = match env::var("APP_EXCHANGE_FIXED_RATE") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| ConfigError::InvalidFixedRate(raw.clone()))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            model: ModelConfig {
                path: PathBuf::from(model_path),
                ratio_scaling,
            },
            catalog: CatalogConfig {
                locale,
                path: catalog_path,
            },
            currency: CurrencyConfig {
                base_url,
                api_key,
                timeout: Duration::from_millis(timeout_ms),
                fixed_rate,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the trained model artifact and how its inputs are scaled.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub ratio_scaling: RatioScaling,
}

/// Which feature catalog backs the recommendation engine.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub locale: Locale,
    pub path: Option<PathBuf>,
}

/// Exchange rate lookup settings.
#[derive(Debug, Clone)]
pub struct CurrencyConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub fixed_rate: Option<f64>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLocale(String),
    InvalidRatioScaling(String),
    InvalidTimeout,
    InvalidFixedRate(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLocale(value) => {
                write!(f, "APP_LOCALE '{value}' is not supported (use uk or en)")
            }
            ConfigError::InvalidRatioScaling(value) => write!(
                f,
                "APP_RATIO_SCALING '{value}' must be truncated_percent, percent, or raw"
            ),
            ConfigError::InvalidTimeout => {
                write!(f, "APP_EXCHANGE_TIMEOUT_MS must be a whole number of milliseconds")
            }
            ConfigError::InvalidFixedRate(value) => {
                write!(f, "APP_EXCHANGE_FIXED_RATE '{value}' must be a number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
