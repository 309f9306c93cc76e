//! Per-request orchestration: sticky replay or fresh assignment.

use std::sync::Arc;

use crate::cookie::{read_cookie, write_cookie};
use crate::fetch::PageFetcher;
use crate::random::{select_random, RandomSource, ThreadRandom};
use crate::types::{HandlerResult, VariantAssignment, ASSIGNMENT_TTL_SECS, VARIANT_COOKIE};
use crate::variants::VariantSource;

/// Successful outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantResponse {
    /// Rewritten variant page.
    pub html: String,
    /// `Set-Cookie` value, present only for a fresh assignment.
    pub set_cookie: Option<String>,
    pub assignment: VariantAssignment,
}

/// Assigns variants and serves them, one independent call per request.
#[derive(Clone)]
pub struct RequestHandler {
    variants: VariantSource,
    pages: PageFetcher,
    random: Arc<dyn RandomSource>,
    cookie_name: String,
    ttl_secs: u64,
}

impl RequestHandler {
    pub fn new(variants: VariantSource, pages: PageFetcher) -> Self {
        Self {
            variants,
            pages,
            random: Arc::new(ThreadRandom),
            cookie_name: VARIANT_COOKIE.to_string(),
            ttl_secs: ASSIGNMENT_TTL_SECS,
        }
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Serve one request given its raw `Cookie` header.
    pub async fn handle(&self, cookie_header: Option<&str>) -> HandlerResult<VariantResponse> {
        let sticky = read_cookie(cookie_header, &self.cookie_name).filter(|v| !v.is_empty());

        if let Some(url) = sticky {
            tracing::info!(%url, "replaying sticky variant");
            let html = self.pages.fetch(&url).await?;
            return Ok(VariantResponse {
                html,
                set_cookie: None,
                assignment: VariantAssignment { url, sticky: true },
            });
        }

        let list = self.variants.fetch_all().await?;
        let url = select_random(&list, self.random.as_ref()).to_string();
        tracing::info!(%url, candidates = list.len(), "assigned new variant");

        let html = self.pages.fetch(&url).await?;
        let set_cookie = write_cookie(&self.cookie_name, &url, self.ttl_secs);

        Ok(VariantResponse {
            html,
            set_cookie: Some(set_cookie),
            assignment: VariantAssignment { url, sticky: false },
        })
    }
}
