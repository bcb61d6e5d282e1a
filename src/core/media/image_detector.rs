// Image detection for image-only channels.
//
// A message "contains an image" when an attachment filename, an in-text
// URL path, or an embed carries recognizable media. Pure domain logic.

use crate::core::policy::IncomingMessage;
use crate::core::urls;

// Recognized media suffixes; extend as needed.
const IMAGE_SUFFIXES: [&str; 11] = [
    "jpg", "jpeg", "png", "tif", "tiff", "webp", "gif", "gifv", "mp4", "webm", "mov",
];

/// Match a filename or URL path against the allowed media suffixes.
///
/// The suffix must be a real extension: `render.png` matches, but a name
/// that merely ends in the letters `png` does not.
fn matches_suffix(name: &str) -> bool {
    let name = name.to_lowercase();
    IMAGE_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(&format!(".{}", suffix)))
}

/// Check if a message contains an image through an attachment, link, or embed.
///
/// Checks short-circuit in that order. Malformed URLs in the text are
/// skipped and never count as image evidence.
pub fn is_image(message: &IncomingMessage) -> bool {
    if message
        .attachments
        .iter()
        .any(|attachment| matches_suffix(&attachment.filename))
    {
        return true;
    }

    if urls::extract_urls(&message.content).any(|url| matches_suffix(url.path())) {
        return true;
    }

    message.embeds.iter().any(|embed| embed.has_media())
}

// ============================================================================
// TESTS
// ============================================================================
