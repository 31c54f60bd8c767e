//! Payload construction.
//!
//! `CapturedPayload` is the unit the classifier hands to the capture
//! pipeline; `Entry::from_payload` materializes an accepted payload as a
//! persisted record.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::content_detection;
use crate::interface::{Entry, EntryKind};

/// A classified clipboard payload, not yet resolved against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPayload {
    pub kind: EntryKind,
    pub content: String,
    pub html_content: Option<String>,
    pub image_data: Option<Vec<u8>>,
    pub image_dimensions: Option<(u32, u32)>,
    /// SHA-256 of `image_data`, computed once at construction.
    pub content_hash: Option<String>,
    pub file_path: Option<String>,
    pub source_app: Option<String>,
    pub source_app_id: Option<String>,
}

impl CapturedPayload {
    /// Build a text-family payload, sub-classified into link, email, or
    /// plain text.
    pub fn new_text(
        text: String,
        html_content: Option<String>,
        source_app: Option<String>,
        source_app_id: Option<String>,
    ) -> Self {
        let kind = content_detection::detect_kind(&text);
        Self {
            kind,
            content: text,
            html_content,
            image_data: None,
            image_dimensions: None,
            content_hash: None,
            file_path: None,
            source_app,
            source_app_id,
        }
    }

    /// Build an image payload. Dimensions are probed from the encoded
    /// header without decoding pixels; the placeholder content carries
    /// them when the header is readable.
    pub fn new_image(
        data: Vec<u8>,
        source_app: Option<String>,
        source_app_id: Option<String>,
    ) -> Self {
        let dimensions = probe_dimensions(&data);
        let content = match dimensions {
            Some((w, h)) => format!("Image {}x{}", w, h),
            None => "Image".to_string(),
        };
        let content_hash = Some(hash_image_bytes(&data));
        Self {
            kind: EntryKind::Image,
            content,
            html_content: None,
            image_data: Some(data),
            image_dimensions: dimensions,
            content_hash,
            file_path: None,
            source_app,
            source_app_id,
        }
    }

    /// Build a file payload from filesystem paths. Content is the
    /// newline-joined path list, so a multi-file copy deduplicates as one
    /// unit; `file_path` keeps the first path for quick access.
    pub fn new_files(
        paths: Vec<String>,
        source_app: Option<String>,
        source_app_id: Option<String>,
    ) -> Self {
        let file_path = paths.first().cloned();
        Self {
            kind: EntryKind::File,
            content: paths.join("\n"),
            html_content: None,
            image_data: None,
            image_dimensions: None,
            content_hash: None,
            file_path,
            source_app,
            source_app_id,
        }
    }

    /// Length of the raw image payload, zero for non-image payloads.
    pub fn image_len(&self) -> usize {
        self.image_data.as_ref().map_or(0, |d| d.len())
    }
}

impl Entry {
    /// Materialize a payload as a fresh entry with `copy_count` 1 and both
    /// timestamps set to `now`. The id stays unassigned until the store
    /// inserts it.
    pub fn from_payload(payload: CapturedPayload, now: DateTime<Utc>) -> Self {
        let image_display_size = payload
            .image_dimensions
            .map(|(w, h)| u64::from(w) * u64::from(h) * 4);
        Entry {
            id: None,
            kind: payload.kind,
            content: payload.content,
            html_content: payload.html_content,
            source_app: payload.source_app,
            source_app_id: payload.source_app_id,
            is_favorite: false,
            copy_count: 1,
            first_copy_time: now,
            last_copy_time: now,
            image_data: payload.image_data,
            image_dimensions: payload.image_dimensions,
            image_display_size,
            file_path: payload.file_path,
            content_hash: payload.content_hash,
        }
    }
}

/// SHA-256 of raw image bytes, lowercase hex.
pub fn hash_image_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Read width and height from the encoded image header. Returns `None`
/// for formats the probe cannot read; the payload is still captured.
fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(std::io::Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
