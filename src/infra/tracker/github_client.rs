use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::core::references::{ItemState, Reference, TrackerClient, TrackerError, TrackerItem};

/// Minimal GitHub REST API client. It deliberately exposes only the one
/// call the core layer needs.
pub struct GithubApiClient {
    client: Client,
    base_url: String,
}

impl GithubApiClient {
    pub fn new(token: Option<String>) -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("ReferenceModBot/1.0"),
        );
        if let Some(token) = token {
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| TrackerError::Api(e.to_string()))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TrackerError::Api(e.to_string()))?;

        Ok(Self {
            client,
            base_url: "https://api.github.com".to_string(),
        })
    }
}

#[async_trait]
impl TrackerClient for GithubApiClient {
    async fn fetch_item(&self, reference: &Reference) -> Result<TrackerItem, TrackerError> {
        // The issues endpoint serves pull requests as well.
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            self.base_url, reference.owner, reference.repo, reference.number
        );
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TrackerError::Api(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(TrackerError::Api(format!(
                "GitHub returned {} for {}",
                resp.status(),
                reference
            )));
        }

        let api: ApiIssue = resp
            .json()
            .await
            .map_err(|e| TrackerError::Api(e.to_string()))?;

        Ok(TrackerItem {
            url: api.html_url.unwrap_or_else(|| {
                format!(
                    "https://github.com/{}/{}/issues/{}",
                    reference.owner, reference.repo, reference.number
                )
            }),
            title: api.title,
            author: api.user.and_then(|u| u.login),
            state: match api.state.as_deref() {
                Some("closed") => ItemState::Closed,
                _ => ItemState::Open,
            },
            body: api.body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    title: Option<String>,
    html_url: Option<String>,
    user: Option<ApiUser>,
    state: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: Option<String>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> GithubApiClient {
        let mut client = GithubApiClient::new(None).unwrap();
        client.base_url = server.url();
        client
    }

    fn reference(number: u64) -> Reference {
        Reference {
            owner: "chunky-dev".to_string(),
            repo: "chunky".to_string(),
            number,
        }
    }

    #[tokio::test]
    async fn test_fetch_item_maps_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/chunky-dev/chunky/issues/12")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "html_url": "https://github.com/chunky-dev/chunky/pull/12",
                    "title": "Fix water rendering",
                    "user": { "login": "alice" },
                    "state": "closed",
                    "body": "Details."
                }"#,
            )
            .create_async()
            .await;

        let item = client_for(&server)
            .fetch_item(&reference(12))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(item.url, "https://github.com/chunky-dev/chunky/pull/12");
        assert_eq!(item.title.as_deref(), Some("Fix water rendering"));
        assert_eq!(item.author.as_deref(), Some("alice"));
        assert_eq!(item.state, ItemState::Closed);
        assert_eq!(item.body.as_deref(), Some("Details."));
    }

    #[tokio::test]
    async fn test_null_fields_degrade_to_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/chunky-dev/chunky/issues/7")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "state": "open" }"#)
            .create_async()
            .await;

        let item = client_for(&server).fetch_item(&reference(7)).await.unwrap();
        assert!(item.title.is_none());
        assert!(item.author.is_none());
        assert!(item.body.is_none());
        assert_eq!(item.state, ItemState::Open);
        // Falls back to a constructed URL so the card always links somewhere.
        assert_eq!(item.url, "https://github.com/chunky-dev/chunky/issues/7");
    }

    #[tokio::test]
    async fn test_not_found_is_its_own_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/chunky-dev/chunky/issues/999")
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_item(&reference(999))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/chunky-dev/chunky/issues/1")
            .with_status(500)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_item(&reference(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Api(_)));
    }
}
