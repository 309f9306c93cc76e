//! Outbound HTTP client wrapping reqwest.
//!
//! One shared connection pool for the variants API and the variant pages.
//! No retries: a failed upstream call fails the inbound request.

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};

/// Default outbound timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const USER_AGENT: &str = concat!("variant-edge/", env!("CARGO_PKG_VERSION"));

/// Content negotiation hint sent with an outbound GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentHint {
    Json,
    Html,
}

impl ContentHint {
    fn mime(self) -> &'static str {
        match self {
            ContentHint::Json => "application/json",
            ContentHint::Html => "text/html",
        }
    }
}

/// HTTP client shared by the variant source and the page fetcher.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client with the given timeout and a limited redirect policy.
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Send a GET carrying the content hint in both `Content-Type` and `Accept`.
    pub async fn get(&self, url: &str, hint: ContentHint) -> reqwest::Result<reqwest::Response> {
        tracing::debug!(url, hint = hint.mime(), "outbound GET");
        let mime = HeaderValue::from_static(hint.mime());
        self.client
            .get(url)
            .header(CONTENT_TYPE, mime.clone())
            .header(ACCEPT, mime)
            .send()
            .await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let resp = HttpClient::new(500)
            .get(&server.uri(), ContentHint::Json)
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_get_sends_content_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("content-type", "text/html"))
            .and(header("accept", "text/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let resp = HttpClient::default()
            .get(&format!("{}/page", server.uri()), ContentHint::Html)
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }
}
