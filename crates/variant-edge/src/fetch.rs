//! Variant page retrieval piped through the markup transformer.

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::client::{ContentHint, HttpClient};
use crate::rewrite::MarkupTransformer;
use crate::types::{FetchError, FetchResult, TransformError};

/// Chunks buffered between the network reader and the rewriter thread.
const CHUNK_BACKLOG: usize = 16;

/// Fetches a variant page and rewrites it while it streams in.
#[derive(Clone, Debug)]
pub struct PageFetcher {
    client: HttpClient,
    transformer: MarkupTransformer,
}

impl PageFetcher {
    pub fn new(client: HttpClient, transformer: MarkupTransformer) -> Self {
        Self {
            client,
            transformer,
        }
    }

    pub fn transformer(&self) -> &MarkupTransformer {
        &self.transformer
    }

    /// Fetch `url`, rewrite it, and return the rewritten document.
    ///
    /// Only a 200 answer is accepted. Body chunks are handed to the rewriter
    /// as they arrive; only the rewritten output is held in memory.
    pub async fn fetch(&self, url: &str) -> FetchResult<String> {
        let resp = self.client.get(url, ContentHint::Html).await?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let (tx, rx) = mpsc::channel::<Bytes>(CHUNK_BACKLOG);
        let transformer = self.transformer.clone();
        let worker = tokio::task::spawn_blocking(move || transformer.transform_receiver(rx));

        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(tx);
                    // The rewriter sees a truncated document; its result is moot.
                    let _ = worker.await;
                    return Err(FetchError::Network(e));
                }
            };
            if tx.send(chunk).await.is_err() {
                // The rewriter stopped early; its error is reported below.
                break;
            }
        }
        drop(tx);

        let output = worker
            .await
            .map_err(|e| TransformError::Rewrite(format!("rewriter task failed: {e}")))??;

        // Pages in other charsets are still served; stray bytes become U+FFFD.
        let html = String::from_utf8_lossy(&output).into_owned();
        tracing::debug!(url, bytes = html.len(), "rewrote variant page");
        Ok(html)
    }
}
