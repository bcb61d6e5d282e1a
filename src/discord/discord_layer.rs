// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "logging/mod.rs"]
pub mod logging;

#[path = "moderation/mod.rs"]
pub mod moderation;

pub mod references {
    #[path = "card_render.rs"]
    pub mod card_render;
}

use crate::core::policy::PolicyEngine;
use crate::infra::blocklist::HttpListSource;
use crate::infra::tracker::GithubApiClient;
use std::sync::Arc;

/// The fixed emoji that withdraws a bot-authored card.
pub const REMOVE_EMOJI: &str = "\u{274C}";

/// Concrete engine type once the ports are wired to real collaborators.
pub type Engine = PolicyEngine<GithubApiClient, HttpListSource>;

/// Shared state for all commands and event handlers.
pub struct Data {
    pub engine: Arc<Engine>,
    /// Channels that receive audit embeds.
    pub log_channels: Vec<u64>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
