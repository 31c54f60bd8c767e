//! Payload classification.
//!
//! Maps the raw pasteboard representations onto a `CapturedPayload` and
//! sub-classifies text with ordered, anchored pattern checks. Classification
//! is pure: the same bytes always produce the same kind.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::interface::EntryKind;
use crate::models::CapturedPayload;
use crate::pasteboard::RawSnapshot;

/// URI scheme prefix, RFC 3986 shaped: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) "://".
static LINK_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").unwrap());

/// Anchored address pattern: localpart@domain.tld over the whole string.
/// Anchoring keeps prefixed strings like `mailto:a@b.co` from matching.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap());

/// Sub-classify a text payload. The link check runs first, then the email
/// check; anything else is plain text. Detection trims surrounding
/// whitespace but the stored content keeps it.
pub fn detect_kind(text: &str) -> EntryKind {
    let trimmed = text.trim();
    if LINK_PREFIX_RE.is_match(trimmed) {
        return EntryKind::Link;
    }
    if EMAIL_RE.is_match(trimmed) {
        return EntryKind::Email;
    }
    EntryKind::Text
}

/// Classify one snapshot into a payload. Representation priority: plain
/// text string, then TIFF bytes, then PNG bytes, then file URLs; the first
/// populated (non-empty) representation wins. Returns `None` when the
/// pasteboard holds nothing this pipeline captures.
pub fn classify(snapshot: &RawSnapshot) -> Option<CapturedPayload> {
    if let Some(text) = snapshot.string.as_deref().filter(|s| !s.is_empty()) {
        return Some(CapturedPayload::new_text(
            text.to_string(),
            snapshot.html.clone(),
            None,
            None,
        ));
    }
    if let Some(tiff) = snapshot.tiff.as_deref().filter(|d| !d.is_empty()) {
        return Some(CapturedPayload::new_image(tiff.to_vec(), None, None));
    }
    if let Some(png) = snapshot.png.as_deref().filter(|d| !d.is_empty()) {
        return Some(CapturedPayload::new_image(png.to_vec(), None, None));
    }
    if !snapshot.file_urls.is_empty() {
        let paths = file_urls_to_paths(&snapshot.file_urls);
        if paths.is_empty() {
            return None;
        }
        return Some(CapturedPayload::new_files(paths, None, None));
    }
    None
}

/// Convert `file://` URLs to filesystem paths, dropping anything that does
/// not parse as a file URL.
fn file_urls_to_paths(urls: &[String]) -> Vec<String> {
    urls.iter()
        .filter_map(|u| url::Url::parse(u).ok())
        .filter_map(|u| u.to_file_path().ok())
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}
