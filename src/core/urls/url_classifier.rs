// URL extraction and host membership checks.
//
// NO Discord dependencies here - just pure domain logic shared by the
// spam policy and the image detector.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

// Greedy "http until whitespace" candidates; parsing decides what is real.
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S*").expect("URL regex must compile"));

/// Extract every parseable URL from free text, in order of appearance.
///
/// Candidates that fail to parse (unescaped brackets, bare scheme, etc.)
/// are silently skipped. The iterator borrows `text` and can be restarted
/// by calling again.
pub fn extract_urls(text: &str) -> impl Iterator<Item = Url> + '_ {
    URL_REGEX
        .find_iter(text)
        .filter_map(|candidate| Url::parse(candidate.as_str()).ok())
}

/// Check a URL's host against a domain membership set.
///
/// Matches when the trimmed host is itself a member, or when it ends with
/// `"." + member` (subdomain match). The dot boundary is required:
/// `notexample.com` does not match a set containing `example.com`. A URL
/// without a host never matches.
pub fn host_in_set(url: &Url, set: &HashSet<String>) -> bool {
    let host = match url.host_str() {
        Some(host) => host.trim(),
        None => return false,
    };
    if host.is_empty() {
        return false;
    }
    if set.contains(host) {
        return true;
    }
    set.iter()
        .any(|member| host.ends_with(&format!(".{}", member)))
}

// ============================================================================
// TESTS
// ============================================================================
