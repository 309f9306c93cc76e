//! Configuration loading and resolution.
//!
//! Every setting resolves as: explicit flag, then environment variable,
//! then built-in default.

use std::net::SocketAddr;

use serde::Serialize;
use variant_edge::client::DEFAULT_TIMEOUT_MS;
use variant_edge::{
    Branding, HttpClient, MarkupTransformer, PageFetcher, RequestHandler, TransformError,
    VariantSource, ASSIGNMENT_TTL_SECS, DEFAULT_VARIANTS_URL,
};

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8787";

pub const ENV_ADDR: &str = "VARIANT_EDGE_ADDR";
pub const ENV_VARIANTS_URL: &str = "VARIANTS_API_URL";
pub const ENV_TIMEOUT_MS: &str = "VARIANT_EDGE_TIMEOUT_MS";
pub const ENV_COOKIE_TTL: &str = "VARIANT_COOKIE_TTL";

/// Errors raised while resolving configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid listen address '{0}'")]
    InvalidAddr(String),

    #[error("Invalid value '{value}' for {key}: expected a positive integer")]
    InvalidNumber { key: &'static str, value: String },
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub addr: Option<String>,
    pub variants_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub cookie_ttl: Option<u64>,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub variants_url: String,
    pub timeout_ms: u64,
    pub cookie_ttl: u64,
    pub branding: Branding,
}

impl ServerConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn resolve_with(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw_addr = overrides
            .addr
            .clone()
            .or_else(|| env(ENV_ADDR))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddr(raw_addr.clone()))?;

        let variants_url = overrides
            .variants_url
            .clone()
            .or_else(|| env(ENV_VARIANTS_URL))
            .unwrap_or_else(|| DEFAULT_VARIANTS_URL.to_string());

        let timeout_ms = resolve_number(
            overrides.timeout_ms,
            ENV_TIMEOUT_MS,
            &env,
            DEFAULT_TIMEOUT_MS,
        )?;
        let cookie_ttl = resolve_number(
            overrides.cookie_ttl,
            ENV_COOKIE_TTL,
            &env,
            ASSIGNMENT_TTL_SECS,
        )?;

        Ok(Self {
            addr,
            variants_url,
            timeout_ms,
            cookie_ttl,
            branding: Branding::default(),
        })
    }

    /// Wire the request handler described by this configuration.
    pub fn build_handler(&self) -> Result<RequestHandler, TransformError> {
        let client = HttpClient::new(self.timeout_ms);
        let transformer = MarkupTransformer::branded(&self.branding)?;
        let source = VariantSource::new(client.clone(), self.variants_url.clone());
        let pages = PageFetcher::new(client, transformer);
        Ok(RequestHandler::new(source, pages).with_ttl(self.cookie_ttl))
    }
}

fn resolve_number(
    explicit: Option<u64>,
    key: &'static str,
    env: &impl Fn(&str) -> Option<String>,
    default: u64,
) -> Result<u64, ConfigError> {
    if let Some(value) = explicit {
        if value == 0 {
            return Err(ConfigError::InvalidNumber {
                key,
                value: value.to_string(),
            });
        }
        return Ok(value);
    }
    match env(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidNumber { key, value: raw }),
        },
        None => Ok(default),
    }
}
