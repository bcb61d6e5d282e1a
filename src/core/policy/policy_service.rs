// Moderation policy engine - the orchestrating state machine.
//
// Per message, rules apply in a fixed precedence: self-filter, command
// channel, spam policy, image-only policy, reference policy. The first
// matching rule handles the message; the engine returns ordered actions
// and never touches the transport itself.

use super::policy_models::{
    AuditEntry, ChannelPolicies, IncomingMessage, LookupOutcome, PolicyAction, WithdrawalTarget,
};
use crate::core::blocklist::{ListSource, UrlListKeeper};
use crate::core::media;
use crate::core::references::{ReferenceService, TrackerClient};
use crate::core::urls;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use url::Url;

static COMMAND_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!bot (?P<command>.*)").expect("command regex must compile"));

const HELP_TEXT: &str = "Bot commands:\n\
    \x20 !bot spam on - enable spam detection\n\
    \x20 !bot spam off - disable spam detection";

const WARNING_LIFETIME: Duration = Duration::from_secs(10);

enum SpamVerdict {
    Blocked,
    Suspected,
}

/// The moderation policy engine.
///
/// Owns the reference service, handles to both list keepers, the immutable
/// channel policies, and the spam-detection toggle.
pub struct PolicyEngine<T: TrackerClient, S: ListSource> {
    references: ReferenceService<T>,
    block_list: Arc<UrlListKeeper<S>>,
    suspicious_list: Arc<UrlListKeeper<S>>,
    policies: ChannelPolicies,
    spam_detection: AtomicBool,
}

impl<T: TrackerClient, S: ListSource> PolicyEngine<T, S> {
    pub fn new(
        references: ReferenceService<T>,
        block_list: Arc<UrlListKeeper<S>>,
        suspicious_list: Arc<UrlListKeeper<S>>,
        policies: ChannelPolicies,
        spam_detection: bool,
    ) -> Self {
        Self {
            references,
            block_list,
            suspicious_list,
            policies,
            spam_detection: AtomicBool::new(spam_detection),
        }
    }

    pub fn spam_detection_enabled(&self) -> bool {
        self.spam_detection.load(Ordering::Relaxed)
    }

    pub fn set_spam_detection(&self, enabled: bool) {
        self.spam_detection.store(enabled, Ordering::Relaxed);
    }

    pub fn policies(&self) -> &ChannelPolicies {
        &self.policies
    }

    /// Apply the moderation rules to one incoming message.
    ///
    /// Returns the ordered actions the adapter must apply. An empty vec
    /// means the message is left alone.
    pub async fn handle_message(
        &self,
        message: &IncomingMessage,
        bot_user: u64,
    ) -> Vec<PolicyAction> {
        // Never react to our own messages.
        if message.author_id == bot_user {
            return Vec::new();
        }

        // Bot commands only work in logging channels.
        if self.policies.log_channels.contains(&message.channel_id) {
            if let Some(captures) = COMMAND_REGEX.captures(&message.content) {
                return self.handle_command(&captures["command"], message.author_id);
            }
        }

        let mut actions = Vec::new();

        if self.spam_detection_enabled() {
            match self.classify_spam(message).await {
                Some(SpamVerdict::Blocked) => {
                    tracing::info!(
                        "Removing message {} by {} for spam: {}",
                        message.id,
                        message.author_id,
                        message.content
                    );
                    actions.push(PolicyAction::Audit(AuditEntry::SpamBlocked {
                        channel_id: message.channel_id,
                        author_id: message.author_id,
                        message_id: message.id,
                        content: message.content.clone(),
                        created_at: message.created_at,
                    }));
                    actions.push(PolicyAction::DeleteMessage);
                    return actions;
                }
                Some(SpamVerdict::Suspected) => {
                    tracing::info!(
                        "Suspicious message {} by {}: {}",
                        message.id,
                        message.author_id,
                        message.content
                    );
                    actions.push(PolicyAction::Audit(AuditEntry::SpamSuspected {
                        channel_id: message.channel_id,
                        author_id: message.author_id,
                        message_id: message.id,
                        content: message.content.clone(),
                        created_at: message.created_at,
                    }));
                }
                None => {}
            }
        }

        // Image-only channels never fall through to reference handling,
        // whether or not the message survives.
        if let Some(warning) = self.policies.image_only.get(&message.channel_id) {
            if !media::is_image(message) {
                tracing::info!(
                    "Removing message {} in {} for not having an image: {}",
                    message.id,
                    message.channel_id,
                    message.content
                );
                actions.push(PolicyAction::Audit(AuditEntry::NonImageRemoved {
                    channel_id: message.channel_id,
                    author_id: message.author_id,
                    message_id: message.id,
                    content: message.content.clone(),
                    attachments: message
                        .attachments
                        .iter()
                        .map(|a| a.filename.clone())
                        .collect(),
                    created_at: message.created_at,
                }));
                actions.push(PolicyAction::PostExpiringWarning {
                    text: warning.clone(),
                    delete_after: WARNING_LIFETIME,
                });
                actions.push(PolicyAction::DeleteMessage);
            }
            return actions;
        }

        if let Some(card) = self
            .references
            .card_for_message(&message.content, message.author_id)
            .await
        {
            tracing::info!("Message {} produced a reference card.", message.id);
            actions.push(PolicyAction::PostCard(card));
        }

        actions
    }

    fn handle_command(&self, command: &str, operator: u64) -> Vec<PolicyAction> {
        match command {
            "help" => {
                tracing::info!("Help run by {}", operator);
                vec![PolicyAction::Reply {
                    text: HELP_TEXT.to_string(),
                    mention_author: false,
                }]
            }
            "spam on" => {
                self.set_spam_detection(true);
                tracing::info!("Spam detection enabled by {}", operator);
                vec![PolicyAction::Reply {
                    text: "Spam detection enabled.".to_string(),
                    mention_author: false,
                }]
            }
            "spam off" => {
                self.set_spam_detection(false);
                tracing::info!("Spam detection disabled by {}", operator);
                vec![PolicyAction::Reply {
                    text: "Spam detection disabled.".to_string(),
                    mention_author: false,
                }]
            }
            // Unrecognized commands in the command channel are ignored.
            _ => Vec::new(),
        }
    }

    /// Classify the message's text URLs against both lists.
    ///
    /// The block list wins over the suspicious list; one verdict per
    /// message regardless of how many URLs match. Embed-only messages
    /// carry no text URLs and are never spam-checked.
    async fn classify_spam(&self, message: &IncomingMessage) -> Option<SpamVerdict> {
        let extracted: Vec<Url> = urls::extract_urls(&message.content).collect();
        for url in &extracted {
            if self.block_list.matches(url).await {
                return Some(SpamVerdict::Blocked);
            }
        }
        for url in &extracted {
            if self.suspicious_list.matches(url).await {
                return Some(SpamVerdict::Suspected);
            }
        }
        None
    }

    /// Explicit `/gh <number>` lookup.
    ///
    /// Refused inside image-only channels; a failed resolution yields a
    /// domain-phrased notice rather than an error.
    pub async fn handle_lookup_command(
        &self,
        channel_id: u64,
        number: u64,
        requester: u64,
    ) -> LookupOutcome {
        if self.policies.image_only.contains_key(&channel_id) {
            tracing::info!("Attempted slash command in protected channel {}.", channel_id);
            return LookupOutcome::Refused("Cannot send text messages in this channel.".to_string());
        }

        let reference = self.references.explicit(number);
        match self
            .references
            .card_for_reference(&reference, requester)
            .await
        {
            Some(card) => {
                tracing::info!("Slash command with valid number #{}.", number);
                LookupOutcome::Card(card)
            }
            None => {
                tracing::info!("Slash command with invalid number #{}.", number);
                LookupOutcome::NotFound(format!("Invalid pull / issue number: #{}", number))
            }
        }
    }
}

/// Decide whether a reaction may withdraw a bot-authored card.
///
/// True only when the reactor is not the bot, the target's author is the
/// bot, the target carries exactly one embed, and the trailing footer line
/// parses as an id equal to the reactor's. Everything else is a silent
/// no-op, including an unparseable footer.
pub fn evaluate_withdrawal(target: &WithdrawalTarget, reactor: u64, bot_user: u64) -> bool {
    if reactor == bot_user {
        return false;
    }
    if target.author_id != bot_user {
        return false;
    }
    if target.embed_footers.len() != 1 {
        return false;
    }
    let Some(footer) = target.embed_footers[0].as_deref() else {
        return false;
    };
    let Some(line) = footer.lines().last() else {
        return false;
    };
    match line.trim().parse::<u64>() {
        Ok(owner) => owner == reactor,
        Err(_) => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blocklist::ListError;
    use crate::core::policy::MessageAttachment;
    use crate::core::references::{ItemState, Reference, TrackerError, TrackerItem};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    const BOT_USER: u64 = 900;
    const AUTHOR: u64 = 42;
    const LOG_CHANNEL: u64 = 10;
    const IMAGE_CHANNEL: u64 = 20;
    const PLAIN_CHANNEL: u64 = 30;

    struct MapTracker {
        items: HashMap<u64, TrackerItem>,
    }

    #[async_trait]
    impl TrackerClient for MapTracker {
        async fn fetch_item(&self, reference: &Reference) -> Result<TrackerItem, TrackerError> {
            self.items
                .get(&reference.number)
                .cloned()
                .ok_or(TrackerError::NotFound)
        }
    }

    struct FixedSource {
        domains: Vec<String>,
    }

    #[async_trait]
    impl ListSource for FixedSource {
        async fn fetch_domains(&self, _url: &str) -> Result<Vec<String>, ListError> {
            Ok(self.domains.clone())
        }
    }

    async fn keeper(domains: &[&str]) -> Arc<UrlListKeeper<FixedSource>> {
        let source = FixedSource {
            domains: domains.iter().map(|d| d.to_string()).collect(),
        };
        let keeper = Arc::new(UrlListKeeper::new(source, "https://lists.example/"));
        if !domains.is_empty() {
            keeper.refresh().await.unwrap();
        }
        keeper
    }

    async fn engine(spam_enabled: bool) -> PolicyEngine<MapTracker, FixedSource> {
        let items = vec![(
            1,
            TrackerItem {
                url: "https://github.com/owner/repo/issues/1".to_string(),
                title: Some("Issue 1".to_string()),
                author: Some("alice".to_string()),
                state: ItemState::Open,
                body: Some("A body.".to_string()),
            },
        )];
        let tracker = MapTracker {
            items: items.into_iter().collect(),
        };
        let references = ReferenceService::new(tracker, "owner", "repo");

        let mut image_only = HashMap::new();
        image_only.insert(IMAGE_CHANNEL, "Images only, please.".to_string());

        PolicyEngine::new(
            references,
            keeper(&["blocked.example"]).await,
            keeper(&["sus.example"]).await,
            ChannelPolicies {
                image_only,
                log_channels: vec![LOG_CHANNEL],
            },
            spam_enabled,
        )
    }

    fn message(channel_id: u64, content: &str) -> IncomingMessage {
        IncomingMessage {
            id: 1000,
            author_id: AUTHOR,
            channel_id,
            content: content.to_string(),
            attachments: Vec::new(),
            embeds: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn audit_count(actions: &[PolicyAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, PolicyAction::Audit(_)))
            .count()
    }

    #[tokio::test]
    async fn test_own_messages_are_ignored() {
        let engine = engine(true).await;
        let mut msg = message(PLAIN_CHANNEL, "http://blocked.example #1");
        msg.author_id = BOT_USER;
        assert!(engine.handle_message(&msg, BOT_USER).await.is_empty());
    }

    #[tokio::test]
    async fn test_help_command_replies_without_mention() {
        let engine = engine(false).await;
        let actions = engine
            .handle_message(&message(LOG_CHANNEL, "!bot help"), BOT_USER)
            .await;
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            PolicyAction::Reply {
                text,
                mention_author,
            } => {
                assert!(text.contains("!bot spam on"));
                assert!(!mention_author);
            }
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spam_toggle_commands_mutate_state() {
        let engine = engine(false).await;
        assert!(!engine.spam_detection_enabled());

        let actions = engine
            .handle_message(&message(LOG_CHANNEL, "!bot spam on"), BOT_USER)
            .await;
        assert_eq!(
            actions,
            vec![PolicyAction::Reply {
                text: "Spam detection enabled.".to_string(),
                mention_author: false,
            }]
        );
        assert!(engine.spam_detection_enabled());

        engine
            .handle_message(&message(LOG_CHANNEL, "!bot spam off"), BOT_USER)
            .await;
        assert!(!engine.spam_detection_enabled());
    }

    #[tokio::test]
    async fn test_unrecognized_command_is_ignored() {
        let engine = engine(false).await;
        let actions = engine
            .handle_message(&message(LOG_CHANNEL, "!bot dance"), BOT_USER)
            .await;
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_commands_outside_logging_channels_are_plain_text() {
        let engine = engine(false).await;
        let actions = engine
            .handle_message(&message(PLAIN_CHANNEL, "!bot spam on"), BOT_USER)
            .await;
        assert!(actions.is_empty());
        assert!(!engine.spam_detection_enabled());
    }

    #[tokio::test]
    async fn test_blocked_url_deletes_with_one_audit_entry() {
        let engine = engine(true).await;
        let actions = engine
            .handle_message(
                &message(PLAIN_CHANNEL, "buy http://blocked.example/deal now"),
                BOT_USER,
            )
            .await;

        assert_eq!(audit_count(&actions), 1);
        assert!(matches!(
            actions[0],
            PolicyAction::Audit(AuditEntry::SpamBlocked { .. })
        ));
        assert_eq!(actions[1], PolicyAction::DeleteMessage);
        assert_eq!(actions.len(), 2);
    }

    #[tokio::test]
    async fn test_suspicious_url_audits_without_deleting() {
        let engine = engine(true).await;
        let actions = engine
            .handle_message(&message(PLAIN_CHANNEL, "see http://sus.example/x"), BOT_USER)
            .await;

        assert_eq!(audit_count(&actions), 1);
        assert!(matches!(
            actions[0],
            PolicyAction::Audit(AuditEntry::SpamSuspected { .. })
        ));
        assert!(!actions.contains(&PolicyAction::DeleteMessage));
    }

    #[tokio::test]
    async fn test_suspicious_message_still_resolves_references() {
        let engine = engine(true).await;
        let actions = engine
            .handle_message(&message(PLAIN_CHANNEL, "http://sus.example/x fixes #1"), BOT_USER)
            .await;

        assert_eq!(actions.len(), 2);
        assert!(matches!(
            actions[0],
            PolicyAction::Audit(AuditEntry::SpamSuspected { .. })
        ));
        assert!(matches!(actions[1], PolicyAction::PostCard(_)));
    }

    #[tokio::test]
    async fn test_block_list_wins_over_suspicious_list() {
        let engine = engine(true).await;
        let actions = engine
            .handle_message(
                &message(
                    PLAIN_CHANNEL,
                    "http://sus.example/x http://blocked.example/y",
                ),
                BOT_USER,
            )
            .await;

        assert_eq!(audit_count(&actions), 1);
        assert!(matches!(
            actions[0],
            PolicyAction::Audit(AuditEntry::SpamBlocked { .. })
        ));
    }

    #[tokio::test]
    async fn test_spam_disabled_skips_lists_entirely() {
        let engine = engine(false).await;
        let actions = engine
            .handle_message(&message(PLAIN_CHANNEL, "http://blocked.example/x"), BOT_USER)
            .await;
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_non_image_in_image_only_channel_is_removed() {
        let engine = engine(false).await;
        let actions = engine
            .handle_message(&message(IMAGE_CHANNEL, "just words"), BOT_USER)
            .await;

        assert_eq!(actions.len(), 3);
        assert!(matches!(
            actions[0],
            PolicyAction::Audit(AuditEntry::NonImageRemoved { .. })
        ));
        assert_eq!(
            actions[1],
            PolicyAction::PostExpiringWarning {
                text: "Images only, please.".to_string(),
                delete_after: Duration::from_secs(10),
            }
        );
        assert_eq!(actions[2], PolicyAction::DeleteMessage);
    }

    #[tokio::test]
    async fn test_image_in_image_only_channel_is_left_alone() {
        let engine = engine(false).await;
        let mut msg = message(IMAGE_CHANNEL, "");
        msg.attachments.push(MessageAttachment {
            filename: "render.png".to_string(),
        });
        let actions = engine.handle_message(&msg, BOT_USER).await;
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_image_only_channel_never_produces_cards() {
        let engine = engine(false).await;
        let mut msg = message(IMAGE_CHANNEL, "render of #1 https://x.example/shot.png");
        msg.attachments.push(MessageAttachment {
            filename: "shot.png".to_string(),
        });
        let actions = engine.handle_message(&msg, BOT_USER).await;
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_reference_in_plain_channel_posts_card() {
        let engine = engine(false).await;
        let actions = engine
            .handle_message(&message(PLAIN_CHANNEL, "fixes #1"), BOT_USER)
            .await;

        assert_eq!(actions.len(), 1);
        match &actions[0] {
            PolicyAction::PostCard(card) => {
                assert_eq!(card.footer, format!("React with \u{274C} to remove.\n{}", AUTHOR));
            }
            other => panic!("expected card, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_message_without_references_does_nothing() {
        let engine = engine(false).await;
        let actions = engine
            .handle_message(&message(PLAIN_CHANNEL, "nothing to see"), BOT_USER)
            .await;
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_command_refused_in_image_only_channel() {
        let engine = engine(false).await;
        let outcome = engine
            .handle_lookup_command(IMAGE_CHANNEL, 1, AUTHOR)
            .await;
        assert_eq!(
            outcome,
            LookupOutcome::Refused("Cannot send text messages in this channel.".to_string())
        );
    }

    #[tokio::test]
    async fn test_lookup_command_reports_invalid_number() {
        let engine = engine(false).await;
        let outcome = engine
            .handle_lookup_command(PLAIN_CHANNEL, 999, AUTHOR)
            .await;
        assert_eq!(
            outcome,
            LookupOutcome::NotFound("Invalid pull / issue number: #999".to_string())
        );
    }

    #[tokio::test]
    async fn test_lookup_command_builds_card() {
        let engine = engine(false).await;
        match engine.handle_lookup_command(PLAIN_CHANNEL, 1, AUTHOR).await {
            LookupOutcome::Card(card) => {
                assert_eq!(card.description.as_deref(), Some("Issue 1"));
            }
            other => panic!("expected card, got {:?}", other),
        }
    }

    fn target(author_id: u64, footers: Vec<Option<&str>>) -> WithdrawalTarget {
        WithdrawalTarget {
            author_id,
            embed_footers: footers
                .into_iter()
                .map(|f| f.map(|s| s.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_withdrawal_by_recorded_owner() {
        let target = target(BOT_USER, vec![Some("React with \u{274C} to remove.\n42")]);
        assert!(evaluate_withdrawal(&target, 42, BOT_USER));
    }

    #[test]
    fn test_withdrawal_by_other_user_is_denied() {
        let target = target(BOT_USER, vec![Some("React with \u{274C} to remove.\n42")]);
        assert!(!evaluate_withdrawal(&target, 43, BOT_USER));
    }

    #[test]
    fn test_withdrawal_on_non_bot_message_is_noop() {
        let target = target(AUTHOR, vec![Some("React with \u{274C} to remove.\n42")]);
        assert!(!evaluate_withdrawal(&target, 42, BOT_USER));
    }

    #[test]
    fn test_withdrawal_by_bot_itself_is_noop() {
        let target = target(BOT_USER, vec![Some("React with \u{274C} to remove.\n900")]);
        assert!(!evaluate_withdrawal(&target, BOT_USER, BOT_USER));
    }

    #[test]
    fn test_withdrawal_requires_exactly_one_embed() {
        let none = target(BOT_USER, vec![]);
        assert!(!evaluate_withdrawal(&none, 42, BOT_USER));

        let two = target(
            BOT_USER,
            vec![Some("a\n42"), Some("b\n42")],
        );
        assert!(!evaluate_withdrawal(&two, 42, BOT_USER));
    }

    #[test]
    fn test_withdrawal_with_unparseable_footer_is_noop() {
        let target = target(BOT_USER, vec![Some("React with \u{274C} to remove.\nnot a number")]);
        assert!(!evaluate_withdrawal(&target, 42, BOT_USER));
    }

    #[test]
    fn test_withdrawal_without_footer_is_noop() {
        let target = target(BOT_USER, vec![None]);
        assert!(!evaluate_withdrawal(&target, 42, BOT_USER));
    }
}
