//! Core data types and error taxonomy for variant assignment.

use serde::{Deserialize, Serialize};

/// Name of the cookie that carries a sticky variant assignment.
pub const VARIANT_COOKIE: &str = "variantCookie";

/// Lifetime of a sticky assignment, in seconds.
pub const ASSIGNMENT_TTL_SECS: u64 = 3600;

/// Default variants endpoint.
pub const DEFAULT_VARIANTS_URL: &str = "https://cfw-takehome.developers.workers.dev/api/variants";

/// Body shape returned by the variants API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantsPayload {
    pub variants: Vec<String>,
}

/// Non-empty, ordered list of candidate page URLs.
///
/// Fetched fresh for every request that arrives without a sticky cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantList(Vec<String>);

impl VariantList {
    /// Build a list, rejecting an empty one.
    pub fn new(urls: Vec<String>) -> Result<Self, VariantError> {
        if urls.is_empty() {
            return Err(VariantError::Empty);
        }
        Ok(Self(urls))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// A URL bound to a client through the sticky cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantAssignment {
    pub url: String,
    /// True when the assignment was read back from the request cookie.
    pub sticky: bool,
}

/// Errors raised while fetching or decoding the variant list.
#[derive(thiserror::Error, Debug)]
pub enum VariantError {
    #[error("Network error reaching variants API: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Variants API answered with status {status}")]
    Api { status: u16 },

    #[error("Variants API returned an unreadable body: {0}")]
    Decode(String),

    #[error("Variants API returned no variants")]
    Empty,
}

/// Errors raised by the streaming markup rewriter.
#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Rewrite error: {0}")]
    Rewrite(String),
}

/// Errors raised while fetching and transforming a variant page.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Network error fetching variant page: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Variant page {url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
}

/// Failure of a single inbound request.
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error("{0}")]
    Variants(#[from] VariantError),

    #[error("{0}")]
    Page(#[from] FetchError),
}

impl HandlerError {
    /// HTTP status to answer the client with.
    ///
    /// Every failure comes from a remote dependency, so all of them map to
    /// 502 Bad Gateway.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::Variants(_) | HandlerError::Page(_) => 502,
        }
    }
}

/// Convenience result types.
pub type VariantResult<T> = Result<T, VariantError>;
pub type FetchResult<T> = Result<T, FetchError>;
pub type HandlerResult<T> = Result<T, HandlerError>;
