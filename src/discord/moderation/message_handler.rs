// Message-create handling - converts the gateway message to the core's
// value type, runs the policy engine, and applies the returned actions.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Apply the resulting actions through the transport
//
// This layer is THIN - no policy decisions, just translation.

use crate::core::policy::{IncomingMessage, MessageAttachment, MessageEmbed, PolicyAction};
use crate::discord::logging::audit_log;
use crate::discord::references::card_render;
use crate::discord::{Data, Error, REMOVE_EMOJI};
use chrono::Utc;
use poise::serenity_prelude::{self as serenity, CreateAllowedMentions, CreateMessage};

/// Reduce a gateway message to the fields the core reads.
fn adapt_message(msg: &serenity::Message) -> IncomingMessage {
    IncomingMessage {
        id: msg.id.get(),
        author_id: msg.author.id.get(),
        channel_id: msg.channel_id.get(),
        content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| MessageAttachment {
                filename: a.filename.clone(),
            })
            .collect(),
        embeds: msg
            .embeds
            .iter()
            .map(|e| MessageEmbed {
                image_url: e.image.as_ref().map(|i| i.url.clone()),
                thumbnail_url: e.thumbnail.as_ref().map(|t| t.url.clone()),
                video_url: e.video.as_ref().map(|v| v.url.clone()),
                video_proxy_url: e.video.as_ref().and_then(|v| v.proxy_url.clone()),
            })
            .collect(),
        created_at: chrono::DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or_else(Utc::now),
    }
}

pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    let bot_user = ctx.cache.current_user().id.get();
    let incoming = adapt_message(msg);
    let actions = data.engine.handle_message(&incoming, bot_user).await;
    apply_actions(ctx, msg, data, actions).await;
    Ok(())
}

/// Apply the engine's actions in order. Every transport call is
/// best-effort; failures are logged and the remaining actions still run.
async fn apply_actions(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
    actions: Vec<PolicyAction>,
) {
    for action in actions {
        match action {
            PolicyAction::Reply {
                text,
                mention_author,
            } => {
                let reply = CreateMessage::new()
                    .content(text)
                    .reference_message(msg)
                    .allowed_mentions(CreateAllowedMentions::new().replied_user(mention_author));
                if let Err(err) = msg.channel_id.send_message(&ctx.http, reply).await {
                    tracing::warn!("Failed to send reply: {}", err);
                }
            }

            PolicyAction::DeleteMessage => {
                if let Err(err) = msg.delete(&ctx.http).await {
                    tracing::warn!("Failed to delete message {}: {}", msg.id, err);
                }
            }

            PolicyAction::Audit(entry) => {
                audit_log::deliver(ctx, &data.log_channels, &entry).await;
            }

            PolicyAction::PostCard(card) => {
                let reply = CreateMessage::new()
                    .embed(card_render::render_card(&card))
                    .reference_message(msg)
                    .allowed_mentions(CreateAllowedMentions::new().replied_user(false));
                match msg.channel_id.send_message(&ctx.http, reply).await {
                    Ok(posted) => {
                        let react = posted
                            .react(
                                &ctx.http,
                                serenity::ReactionType::Unicode(REMOVE_EMOJI.to_string()),
                            )
                            .await;
                        if let Err(err) = react {
                            tracing::warn!("Failed to add remove reaction: {}", err);
                        }
                    }
                    Err(err) => tracing::warn!("Failed to post card: {}", err),
                }
            }

            PolicyAction::PostExpiringWarning { text, delete_after } => {
                let warning = CreateMessage::new()
                    .content(text)
                    .reference_message(msg)
                    .allowed_mentions(CreateAllowedMentions::new().replied_user(true));
                match msg.channel_id.send_message(&ctx.http, warning).await {
                    Ok(posted) => {
                        // The warning cleans itself up off the event path.
                        let http = ctx.http.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delete_after).await;
                            if let Err(err) = posted.delete(&http).await {
                                tracing::debug!("Failed to delete warning: {}", err);
                            }
                        });
                    }
                    Err(err) => tracing::warn!("Failed to send warning: {}", err),
                }
            }
        }
    }
}
