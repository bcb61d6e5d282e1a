use crate::core::policy::AuditEntry;
use crate::discord::logging::formatter;
use poise::serenity_prelude::{self as serenity, CreateMessage};

/// Deliver one audit entry to every configured logging channel.
///
/// Best-effort: a delivery failure is logged locally and never aborts the
/// moderation action that triggered it (the message is already gone by
/// the time this runs).
pub async fn deliver(ctx: &serenity::Context, channels: &[u64], entry: &AuditEntry) {
    let embed = formatter::format_audit_entry(entry);
    for channel in channels {
        let send = serenity::ChannelId::new(*channel)
            .send_message(&ctx.http, CreateMessage::new().embed(embed.clone()))
            .await;
        if let Err(err) = send {
            tracing::error!("Failed to deliver audit entry to channel {}: {}", channel, err);
        }
    }
}
