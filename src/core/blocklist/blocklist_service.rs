// URL list keeper - a periodically refreshed domain membership set.
//
// Two instances exist at runtime (block list and suspicious list). Each
// owns its set exclusively; refresh replaces the set wholesale so readers
// always observe a complete snapshot, old or new, never partial.

use crate::core::urls;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ListError {
    #[error("Failed to fetch list: {0}")]
    Fetch(String),

    #[error("Malformed list payload: {0}")]
    Parse(String),
}

// ============================================================================
// SOURCE TRAIT (PORT)
// ============================================================================

/// Trait for fetching the current domain list from a remote source.
#[async_trait]
pub trait ListSource: Send + Sync {
    async fn fetch_domains(&self, url: &str) -> Result<Vec<String>, ListError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Keeps a domain membership set up to date from a remote source.
///
/// Before the first successful refresh the set is empty, meaning "no
/// restrictions yet". A failed refresh leaves the previous set intact.
pub struct UrlListKeeper<S: ListSource> {
    source: S,
    source_url: String,
    domains: RwLock<HashSet<String>>,
}

impl<S: ListSource> UrlListKeeper<S> {
    pub fn new(source: S, source_url: impl Into<String>) -> Self {
        Self {
            source,
            source_url: source_url.into(),
            domains: RwLock::new(HashSet::new()),
        }
    }

    /// Fetch the source and replace the set wholesale.
    ///
    /// Returns the new member count. On failure the previous set stays in
    /// place and queries keep using it.
    pub async fn refresh(&self) -> Result<usize, ListError> {
        let fetched = self.source.fetch_domains(&self.source_url).await?;
        let fresh: HashSet<String> = fetched
            .iter()
            .map(|domain| domain.trim().to_string())
            .collect();
        let count = fresh.len();
        *self.domains.write().await = fresh;
        Ok(count)
    }

    /// Check a URL's host against the current set (exact or subdomain).
    pub async fn matches(&self, url: &Url) -> bool {
        let domains = self.domains.read().await;
        urls::host_in_set(url, &domains)
    }

    /// Number of domains in the current set.
    pub async fn len(&self) -> usize {
        self.domains.read().await.len()
    }
}

/// Spawn the perpetual refresh loop for one keeper.
///
/// Runs an immediate refresh, then repeats every `interval` for the
/// process lifetime. Failures are logged and never reach message handling.
pub fn spawn_refresh_loop<S: ListSource + 'static>(
    keeper: Arc<UrlListKeeper<S>>,
    name: &'static str,
    interval: Duration,
) {
    tokio::spawn(async move {
        loop {
            match keeper.refresh().await {
                Ok(count) => {
                    tracing::debug!("Refreshed {} list: {} domains", name, count);
                }
                Err(err) => {
                    tracing::warn!("Failed to refresh {} list: {}", name, err);
                }
            }
            tokio::time::sleep(interval).await;
        }
    });
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Source that replays a scripted sequence of outcomes.
    struct ScriptedSource {
        outcomes: Mutex<Vec<Result<Vec<String>, ListError>>>,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<Vec<String>, ListError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
            }
        }
    }

    #[async_trait]
    impl ListSource for ScriptedSource {
        async fn fetch_domains(&self, _url: &str) -> Result<Vec<String>, ListError> {
            self.outcomes.lock().unwrap().remove(0)
        }
    }

    fn domains(members: &[&str]) -> Vec<String> {
        members.iter().map(|m| m.to_string()).collect()
    }

    #[tokio::test]
    async fn test_refresh_replaces_set() {
        let source = ScriptedSource::new(vec![
            Ok(domains(&["old.example"])),
            Ok(domains(&["new.example"])),
        ]);
        let keeper = UrlListKeeper::new(source, "https://lists.example/block");

        keeper.refresh().await.unwrap();
        let old = Url::parse("https://old.example/").unwrap();
        assert!(keeper.matches(&old).await);

        keeper.refresh().await.unwrap();
        assert!(!keeper.matches(&old).await);
        let new = Url::parse("https://new.example/").unwrap();
        assert!(keeper.matches(&new).await);
    }

    #[tokio::test]
    async fn test_failed_refresh_preserves_previous_set() {
        let source = ScriptedSource::new(vec![
            Ok(domains(&["kept.example"])),
            Err(ListError::Fetch("connection refused".to_string())),
        ]);
        let keeper = UrlListKeeper::new(source, "https://lists.example/block");

        keeper.refresh().await.unwrap();
        assert!(keeper.refresh().await.is_err());

        let url = Url::parse("https://kept.example/page").unwrap();
        assert!(keeper.matches(&url).await);
        assert_eq!(keeper.len().await, 1);
    }

    #[tokio::test]
    async fn test_entries_are_trimmed() {
        let source = ScriptedSource::new(vec![Ok(domains(&["  spaced.example \n"]))]);
        let keeper = UrlListKeeper::new(source, "https://lists.example/block");
        keeper.refresh().await.unwrap();

        let url = Url::parse("https://spaced.example/").unwrap();
        assert!(keeper.matches(&url).await);
    }

    #[tokio::test]
    async fn test_empty_keeper_matches_nothing() {
        let source = ScriptedSource::new(vec![]);
        let keeper = UrlListKeeper::new(source, "https://lists.example/block");

        let url = Url::parse("https://anything.example/").unwrap();
        assert!(!keeper.matches(&url).await);
    }

    #[tokio::test]
    async fn test_subdomain_matches_through_keeper() {
        let source = ScriptedSource::new(vec![Ok(domains(&["example.com"]))]);
        let keeper = UrlListKeeper::new(source, "https://lists.example/block");
        keeper.refresh().await.unwrap();

        let sub = Url::parse("https://cdn.example.com/x").unwrap();
        assert!(keeper.matches(&sub).await);
        let not = Url::parse("https://notexample.com/x").unwrap();
        assert!(!keeper.matches(&not).await);
    }
}
