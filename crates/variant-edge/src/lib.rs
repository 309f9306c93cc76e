//! variant-edge — sticky A/B variant assignment with streaming HTML rewriting.

pub mod client;
pub mod cookie;
pub mod fetch;
pub mod handler;
pub mod random;
pub mod rewrite;
pub mod types;
pub mod variants;

pub use client::HttpClient;
pub use cookie::{read_cookie, write_cookie};
pub use fetch::PageFetcher;
pub use handler::{RequestHandler, VariantResponse};
pub use random::{select_random, RandomSource, SeededRandom, ThreadRandom};
pub use rewrite::{Branding, MarkupTransformer, RewriteAction, RuleSet, StreamingRewriter};
pub use types::*;
pub use variants::VariantSource;
