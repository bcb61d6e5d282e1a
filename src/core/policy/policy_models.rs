// Value types the policy engine reads and produces.
//
// The Discord adapter converts gateway objects into these at the boundary,
// so the core never depends on the transport library's object model.

use crate::core::references::ResponseCard;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// One incoming message, reduced to the fields the core reads.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: u64,
    pub author_id: u64,
    pub channel_id: u64,
    pub content: String,
    pub attachments: Vec<MessageAttachment>,
    pub embeds: Vec<MessageEmbed>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageAttachment {
    pub filename: String,
}

#[derive(Debug, Clone, Default)]
pub struct MessageEmbed {
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub video_proxy_url: Option<String>,
}

impl MessageEmbed {
    /// True when any media URL is present and non-empty.
    pub fn has_media(&self) -> bool {
        [
            &self.image_url,
            &self.thumbnail_url,
            &self.video_url,
            &self.video_proxy_url,
        ]
        .into_iter()
        .any(|url| url.as_deref().is_some_and(|u| !u.is_empty()))
    }
}

/// Per-channel configuration, loaded once at startup and immutable for
/// the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct ChannelPolicies {
    /// Channel id -> warning text posted when a non-image is removed.
    pub image_only: HashMap<u64, String>,
    /// Channels that receive audit embeds and accept `!bot` commands.
    pub log_channels: Vec<u64>,
}

/// One audit record, delivered best-effort to every logging channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEntry {
    SpamBlocked {
        channel_id: u64,
        author_id: u64,
        message_id: u64,
        content: String,
        created_at: DateTime<Utc>,
    },
    SpamSuspected {
        channel_id: u64,
        author_id: u64,
        message_id: u64,
        content: String,
        created_at: DateTime<Utc>,
    },
    NonImageRemoved {
        channel_id: u64,
        author_id: u64,
        message_id: u64,
        content: String,
        attachments: Vec<String>,
        created_at: DateTime<Utc>,
    },
}

/// Ordered instructions for the Discord adapter to apply verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyAction {
    /// Plain text reply to the triggering message.
    Reply { text: String, mention_author: bool },
    /// Delete the triggering message.
    DeleteMessage,
    /// Deliver an audit embed to every logging channel, best-effort.
    Audit(AuditEntry),
    /// Reply with a card (no mention) and attach the remove reaction.
    PostCard(ResponseCard),
    /// Reply with a warning that mentions the author and deletes itself.
    PostExpiringWarning { text: String, delete_after: Duration },
}

/// Adapter-built view of a fetched message for the withdrawal decision.
#[derive(Debug, Clone)]
pub struct WithdrawalTarget {
    pub author_id: u64,
    pub embed_footers: Vec<Option<String>>,
}

/// Result of the explicit `/gh` lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Invoked inside a protected channel; text is a private notice.
    Refused(String),
    /// The reference did not resolve; text is a domain-phrased message.
    NotFound(String),
    Card(ResponseCard),
}
