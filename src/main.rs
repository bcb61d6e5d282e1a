// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (HTTP APIs)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::blocklist::{spawn_refresh_loop, UrlListKeeper};
use crate::core::policy::{ChannelPolicies, PolicyEngine};
use crate::core::references::ReferenceService;
use crate::discord::moderation::{message_handler, reaction_handler};
use crate::discord::{Data, Error};
use crate::infra::blocklist::HttpListSource;
use crate::infra::tracker::GithubApiClient;
use poise::serenity_prelude as serenity;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Event handler for non-command Discord events.
/// Message policy and react-remove both come through here.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            message_handler::handle_message(ctx, new_message, data).await?;
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            reaction_handler::handle_reaction_add(ctx, add_reaction, data).await?;
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    let config_path =
        std::env::var("BOT_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = match BotConfig::load(Path::new(&config_path)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config {}: {:#}", config_path, err);
            std::process::exit(1);
        }
    };

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let (owner, repo) = config
        .default_repository()
        .expect("repository validated during config load");

    let github_token = std::env::var("GITHUB_TOKEN").ok();
    let tracker = GithubApiClient::new(github_token).expect("Failed to create GitHub API client");
    let references = ReferenceService::new(tracker, owner, repo);

    // Both keepers exist even without a spam section; they just stay
    // empty and never refresh, and empty sets match nothing.
    let (block_url, suspicious_url) = config
        .spam
        .as_ref()
        .map(|spam| (spam.block.clone(), spam.suspicious.clone()))
        .unwrap_or_default();
    let block_list = Arc::new(UrlListKeeper::new(
        HttpListSource::new().expect("Failed to create list source client"),
        block_url,
    ));
    let suspicious_list = Arc::new(UrlListKeeper::new(
        HttpListSource::new().expect("Failed to create list source client"),
        suspicious_url,
    ));

    if let Some(spam) = &config.spam {
        let interval = Duration::from_secs(spam.update_secs);
        spawn_refresh_loop(Arc::clone(&block_list), "block", interval);
        spawn_refresh_loop(Arc::clone(&suspicious_list), "suspicious", interval);
    }

    let policies = ChannelPolicies {
        image_only: config.image_only_channels(),
        log_channels: config.logging_channels.clone(),
    };
    tracing::info!("Logging to {} channels.", policies.log_channels.len());

    let spam_enabled = config.spam.as_ref().map(|spam| spam.enabled).unwrap_or(false);
    let engine = Arc::new(PolicyEngine::new(
        references,
        block_list,
        suspicious_list,
        policies,
        spam_enabled,
    ));

    // Create the data structure that will be shared across all commands
    let data = Data {
        engine,
        log_channels: config.logging_channels.clone(),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::commands::gh::gh()],
            // Event handler for messages and reactions
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered; bot is ready.");
                Ok(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
