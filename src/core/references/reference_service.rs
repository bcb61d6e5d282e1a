// Reference extraction and resolution - core business logic for turning
// `#123` tokens into response cards.
//
// NO Discord dependencies here. The tracker is a port; resolution failures
// degrade to "no card for that reference" and never abort sibling lookups.

use super::reference_models::{CardField, Reference, ResponseCard, TrackerItem};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static REFERENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("reference regex must compile"));

const DIGEST_TITLE: &str = "Issues / pull requests";
const FOOTER_PROMPT: &str = "React with \u{274C} to remove.";
const BODY_EXCERPT_CHARS: usize = 200;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Item not found")]
    NotFound,

    #[error("Tracker API error: {0}")]
    Api(String),
}

// ============================================================================
// TRACKER TRAIT (PORT)
// ============================================================================

/// Trait for resolving a reference against the project tracker.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    async fn fetch_item(&self, reference: &Reference) -> Result<TrackerItem, TrackerError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Resolves references and assembles response cards.
pub struct ReferenceService<T: TrackerClient> {
    tracker: T,
    owner: String,
    repo: String,
}

impl<T: TrackerClient> ReferenceService<T> {
    pub fn new(tracker: T, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            tracker,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Extract every `#<digits>` token from the text, in order.
    ///
    /// Duplicates are preserved; each occurrence resolves independently.
    /// Numbers too large for u64 are skipped.
    pub fn extract(&self, text: &str) -> Vec<Reference> {
        REFERENCE_REGEX
            .captures_iter(text)
            .filter_map(|captures| captures[1].parse::<u64>().ok())
            .map(|number| self.explicit(number))
            .collect()
    }

    /// Build a reference to `number` in the configured default repository.
    pub fn explicit(&self, number: u64) -> Reference {
        Reference {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            number,
        }
    }

    /// Resolve one reference, degrading any failure to `None`.
    async fn resolve(&self, reference: &Reference) -> Option<TrackerItem> {
        match self.tracker.fetch_item(reference).await {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!("Failed to fetch {}: {}", reference, err);
                None
            }
        }
    }

    /// Build the card for a free-text message, if it references anything.
    ///
    /// One reference yields a full card (or nothing, if resolution fails).
    /// Several references yield a digest card; references that fail to
    /// resolve contribute no block, and a digest with every lookup failed
    /// still posts with no blocks.
    pub async fn card_for_message(&self, text: &str, requester: u64) -> Option<ResponseCard> {
        let references = self.extract(text);
        match references.len() {
            0 => None,
            1 => self.card_for_reference(&references[0], requester).await,
            _ => Some(self.digest_card(&references, requester).await),
        }
    }

    /// Build the full card for one explicit reference.
    pub async fn card_for_reference(
        &self,
        reference: &Reference,
        requester: u64,
    ) -> Option<ResponseCard> {
        let item = self.resolve(reference).await?;
        Some(ResponseCard {
            title: item.url.clone(),
            url: Some(item.url.clone()),
            description: Some(display_text(item.title.as_deref())),
            fields: vec![
                CardField::new("By", display_text(item.author.as_deref()), true),
                CardField::new("Status", item.state.to_string(), true),
                CardField::new(
                    "Description",
                    clip_chars(&display_text(item.body.as_deref()), BODY_EXCERPT_CHARS),
                    false,
                ),
            ],
            footer: owner_footer(requester),
        })
    }

    async fn digest_card(&self, references: &[Reference], requester: u64) -> ResponseCard {
        let mut fields = Vec::new();
        for reference in references {
            let Some(item) = self.resolve(reference).await else {
                continue;
            };
            fields.push(CardField::new("Link", item.url.clone(), false));
            fields.push(CardField::new(
                "Title",
                display_text(item.title.as_deref()),
                true,
            ));
            fields.push(CardField::new(
                "By",
                display_text(item.author.as_deref()),
                true,
            ));
            fields.push(CardField::new("Status", item.state.to_string(), true));
        }
        ResponseCard {
            title: DIGEST_TITLE.to_string(),
            url: None,
            description: None,
            fields,
            footer: owner_footer(requester),
        }
    }
}

/// Footer carrying the owner tag for later withdrawal authorization.
fn owner_footer(requester: u64) -> String {
    format!("{}\n{}", FOOTER_PROMPT, requester)
}

/// Render an optional value for a card field.
///
/// Absent or empty values render the literal `None`. An all-whitespace
/// value gets a zero-width space appended so the rendering layer accepts
/// the otherwise blank field.
fn display_text(value: Option<&str>) -> String {
    match value {
        None => "None".to_string(),
        Some(v) if v.is_empty() => "None".to_string(),
        Some(v) if v.trim().is_empty() => format!("{}\u{200B}", v),
        Some(v) => v.to_string(),
    }
}

/// Clip a string to at most `max` characters.
///
/// Longer strings become their first `max - 3` characters, trailing
/// whitespace dropped, plus an ellipsis. Counts characters, never bytes.
fn clip_chars(value: &str, max: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max {
        return value.to_string();
    }
    let head: String = chars[..max - 3].iter().collect();
    format!("{}...", head.trim_end())
}

// ============================================================================
// TESTS
// ============================================================================
