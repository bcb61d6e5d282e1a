use crate::core::policy::AuditEntry;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, CreateEmbed};

fn embed_timestamp(created_at: &DateTime<Utc>) -> serenity::Timestamp {
    serenity::Timestamp::from_unix_timestamp(created_at.timestamp())
        .unwrap_or_else(|_| serenity::Timestamp::now())
}

pub fn format_audit_entry(entry: &AuditEntry) -> CreateEmbed {
    match entry {
        AuditEntry::SpamBlocked {
            channel_id,
            author_id,
            message_id,
            content,
            created_at,
        } => spam_embed(
            "Deleted message for spam",
            *channel_id,
            *author_id,
            *message_id,
            content,
            created_at,
        ),

        AuditEntry::SpamSuspected {
            channel_id,
            author_id,
            message_id,
            content,
            created_at,
        } => spam_embed(
            "Suspicious message",
            *channel_id,
            *author_id,
            *message_id,
            content,
            created_at,
        ),

        AuditEntry::NonImageRemoved {
            author_id,
            message_id,
            content,
            attachments,
            created_at,
            ..
        } => CreateEmbed::default()
            .title("Deleted message in image-only channel")
            .description(content.clone())
            .color(serenity::Color::from_rgb(255, 255, 255)) // White
            // Trailing zero-width space keeps the field valid when there
            // were no attachments.
            .field(
                "Attachments",
                format!("{}\u{200B}", attachments.join("\n")),
                false,
            )
            .field("Message ID", message_id.to_string(), true)
            .field("From", format!("<@{}>", author_id), true)
            .timestamp(embed_timestamp(created_at)),
    }
}

fn spam_embed(
    title: &str,
    channel_id: u64,
    author_id: u64,
    message_id: u64,
    content: &str,
    created_at: &DateTime<Utc>,
) -> CreateEmbed {
    CreateEmbed::default()
        .title(title)
        .description(content.to_string())
        .color(serenity::Color::from_rgb(255, 0, 0)) // Red
        .field("Channel", format!("<#{}>", channel_id), true)
        .field("From", format!("<@{}>", author_id), true)
        .field("Message ID", message_id.to_string(), false)
        .timestamp(embed_timestamp(created_at))
}
