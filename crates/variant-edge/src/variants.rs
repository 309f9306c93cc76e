//! Remote variant list retrieval.

use crate::client::{ContentHint, HttpClient};
use crate::types::{VariantError, VariantList, VariantResult, VariantsPayload};

/// Fetches the candidate URLs from the variants API.
#[derive(Clone, Debug)]
pub struct VariantSource {
    client: HttpClient,
    url: String,
}

impl VariantSource {
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current variant list. Only a 200 answer is accepted.
    pub async fn fetch_all(&self) -> VariantResult<VariantList> {
        let resp = self.client.get(&self.url, ContentHint::Json).await?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(VariantError::Api { status });
        }

        let body = resp.bytes().await?;
        let payload: VariantsPayload =
            serde_json::from_slice(&body).map_err(|e| VariantError::Decode(e.to_string()))?;

        tracing::debug!(count = payload.variants.len(), "fetched variant list");
        VariantList::new(payload.variants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer) -> VariantSource {
        VariantSource::new(HttpClient::default(), format!("{}/api/variants", server.uri()))
    }

    #[tokio::test]
    async fn test_fetch_all_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/variants"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "variants": ["http://a/x", "http://b/y"] })),
            )
            .mount(&server)
            .await;

        let list = source_for(&server).await.fetch_all().await.unwrap();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["http://a/x", "http://b/y"]);
    }

    #[tokio::test]
    async fn test_fetch_all_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source_for(&server).await.fetch_all().await.unwrap_err();
        assert!(matches!(err, VariantError::Api { status: 503 }));
    }

    #[tokio::test]
    async fn test_fetch_all_no_content_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = source_for(&server).await.fetch_all().await.unwrap_err();
        assert!(matches!(err, VariantError::Api { status: 204 }));
    }

    #[tokio::test]
    async fn test_fetch_all_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"variants\": 3}"))
            .mount(&server)
            .await;

        let err = source_for(&server).await.fetch_all().await.unwrap_err();
        assert!(matches!(err, VariantError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_all_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "variants": [] })))
            .mount(&server)
            .await;

        let err = source_for(&server).await.fetch_all().await.unwrap_err();
        assert!(matches!(err, VariantError::Empty));
    }

    #[tokio::test]
    async fn test_fetch_all_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let source = VariantSource::new(
            HttpClient::new(2_000),
            format!("http://127.0.0.1:{port}/api/variants"),
        );
        let err = source.fetch_all().await.unwrap_err();
        assert!(matches!(err, VariantError::Network(_)));
    }
}
