// Bot configuration, loaded once at startup from a JSON file.
//
// A missing file, invalid JSON, or malformed repository is fatal; the
// process reports it and does not start. Optional sections degrade to
// "feature off" instead.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub github: GithubConfig,
    #[serde(default)]
    pub spam: Option<SpamListConfig>,
    #[serde(default)]
    pub logging_channels: Vec<u64>,
    // Keys are channel ids as strings (JSON object keys); values are the
    // warning text posted when a non-image is removed.
    #[serde(default)]
    pub image_only: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    /// `owner/name` form.
    pub repository: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpamListConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Source URL for the block list.
    pub block: String,
    /// Source URL for the suspicious list.
    pub suspicious: String,
    /// Refresh interval for both lists, in seconds.
    pub update_secs: u64,
}

impl BotConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: BotConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in config file {}", path.display()))?;
        config.default_repository()?;
        Ok(config)
    }

    /// Split `github.repository` into (owner, name).
    pub fn default_repository(&self) -> anyhow::Result<(String, String)> {
        match self.github.repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Ok((owner.to_string(), name.to_string()))
            }
            _ => bail!(
                "github.repository must be in \"owner/name\" form, got {:?}",
                self.github.repository
            ),
        }
    }

    /// Parse the image-only map into channel ids.
    ///
    /// A non-numeric key is reported and skipped; the rest of the map
    /// still loads. An empty result gets a startup warning because the
    /// bot will not filter any channels.
    pub fn image_only_channels(&self) -> HashMap<u64, String> {
        let mut channels = HashMap::new();
        for (key, warning) in &self.image_only {
            match key.parse::<u64>() {
                Ok(channel_id) => {
                    channels.insert(channel_id, warning.clone());
                }
                Err(_) => {
                    tracing::error!("Invalid image_only channel {:?}.", key);
                }
            }
        }
        if channels.is_empty() {
            tracing::warn!(
                "No image-only channels configured. Bot will not filter any channels."
            );
        }
        channels
    }
}

// ============================================================================
// TESTS
// ============================================================================
