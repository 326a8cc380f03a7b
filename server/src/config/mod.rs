use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::{create_cors_layer, DEFAULT_ALLOWED_ORIGINS};
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{present} is set but {missing} is not")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct GenkitConfig {
    pub flow_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct ImageKitConfig {
    pub private_key: String,
    pub upload_url: Option<String>,
}

/// Settings for the router's outer layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Comma-separated CORS origins; an empty list means any origin.
    pub allowed_origins: String,
    /// `RUST_ENV=production`; turns on HSTS.
    pub is_production: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            is_production: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub http: HttpConfig,
    /// Absent means the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub genkit: Option<GenkitConfig>,
    pub resend: Option<ResendConfig>,
    pub imagekit: Option<ImageKitConfig>,
    pub firebase_api_key: Option<String>,
    pub static_tokens: Option<String>,
    pub admin_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = match get("HOST") {
            Some(value) => value.trim().parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                key: "HOST",
                value,
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let database_max_connections = parse_or(
            get("DATABASE_MAX_CONNECTIONS"),
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
        )?;

        let http = HttpConfig {
            allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            is_production: get("RUST_ENV")
                .map(|v| v.trim().eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        };

        let genkit = get("GENKIT_SLUG_FLOW_URL").map(|flow_url| GenkitConfig {
            flow_url,
            api_key: get("GENKIT_API_KEY"),
        });

        let resend = match (get("RESEND_API_KEY"), get("RESEND_FROM")) {
            (Some(api_key), Some(from)) => Some(ResendConfig { api_key, from }),
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: "RESEND_API_KEY",
                    missing: "RESEND_FROM",
                })
            }
            (None, _) => None,
        };

        let imagekit = get("IMAGEKIT_PRIVATE_KEY").map(|private_key| ImageKitConfig {
            private_key,
            upload_url: get("IMAGEKIT_UPLOAD_URL"),
        });

        let admin_emails = get("ADMIN_EMAILS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            http,
            database_url: get("DATABASE_URL"),
            database_max_connections,
            genkit,
            resend,
            imagekit,
            firebase_api_key: get("FIREBASE_API_KEY"),
            static_tokens: get("AUTH_STATIC_TOKENS"),
            admin_emails,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
