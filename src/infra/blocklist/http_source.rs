use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::blocklist::{ListError, ListSource};

/// Fetches domain lists over HTTP. The endpoint returns a JSON object
/// with a `domains` string array.
pub struct HttpListSource {
    client: Client,
}

impl HttpListSource {
    pub fn new() -> Result<Self, ListError> {
        let client = Client::builder()
            .user_agent("ReferenceModBot/1.0")
            .build()
            .map_err(|e| ListError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ListSource for HttpListSource {
    async fn fetch_domains(&self, url: &str) -> Result<Vec<String>, ListError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ListError::Fetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ListError::Fetch(format!(
                "List source returned {}",
                resp.status()
            )));
        }

        let payload: ListPayload = resp
            .json()
            .await
            .map_err(|e| ListError::Parse(e.to_string()))?;
        Ok(payload.domains)
    }
}

#[derive(Debug, Deserialize)]
struct ListPayload {
    domains: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_domains_parses_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/block.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "domains": ["spam.example", "scam.example"] }"#)
            .create_async()
            .await;

        let source = HttpListSource::new().unwrap();
        let domains = source
            .fetch_domains(&format!("{}/block.json", server.url()))
            .await
            .unwrap();
        assert_eq!(domains, vec!["spam.example", "scam.example"]);
    }

    #[tokio::test]
    async fn test_missing_domains_field_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/block.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "hosts": [] }"#)
            .create_async()
            .await;

        let source = HttpListSource::new().unwrap();
        let err = source
            .fetch_domains(&format!("{}/block.json", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ListError::Parse(_)));
    }

    #[tokio::test]
    async fn test_http_failure_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/block.json")
            .with_status(503)
            .create_async()
            .await;

        let source = HttpListSource::new().unwrap();
        let err = source
            .fetch_domains(&format!("{}/block.json", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ListError::Fetch(_)));
    }
}
