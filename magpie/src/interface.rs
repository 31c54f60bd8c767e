//! Magpie Interface Definition
//!
//! This file defines the types shared with the embedding host: the persisted
//! entry record, the query enums, the service trait, and the public error
//! type. It acts as the source of truth for shared types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// The kind of content an entry holds, fixed at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Text,
    Image,
    Link,
    File,
    Email,
}

impl EntryKind {
    /// Stable string stored in the durable tier's `kind` column.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            EntryKind::Text => "text",
            EntryKind::Image => "image",
            EntryKind::Link => "link",
            EntryKind::File => "file",
            EntryKind::Email => "email",
        }
    }

    /// Inverse of `as_db_str`. Unknown strings fall back to `Text` so a
    /// row written by a newer build still loads.
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "image" => EntryKind::Image,
            "link" => EntryKind::Link,
            "file" => EntryKind::File,
            "email" => EntryKind::Email,
            _ => EntryKind::Text,
        }
    }
}

/// Filter categories exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Everything, regardless of kind.
    History,
    Favorites,
    Text,
    Images,
    Links,
    Files,
    Emails,
}

/// Sort orders for list queries. Each has a natural direction: most
/// recently copied first, earliest first copy first, highest copy count
/// first, largest payload first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
    LastCopyTime,
    FirstCopyTime,
    CopyCount,
    ByteSize,
}

/// What happened to one payload pushed through the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A new entry was created with this id.
    Inserted(i64),
    /// An equivalent entry already existed; its counters were bumped.
    Touched(i64),
    /// The capture filter dropped the payload.
    Rejected,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// A captured clipboard entry.
///
/// `id` is `None` until the store assigns one on first insert. Content,
/// kind, and provenance are immutable after creation; `is_favorite`,
/// `copy_count`, and `last_copy_time` mutate in place on recapture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Option<i64>,
    pub kind: EntryKind,
    /// Text payload, URL, address, newline-joined path list, or the
    /// `Image WxH` placeholder for image entries.
    pub content: String,
    /// Rich-text sibling of `content`, when the pasteboard carried one.
    pub html_content: Option<String>,
    pub source_app: Option<String>,
    pub source_app_id: Option<String>,
    pub is_favorite: bool,
    /// How many times this entry has been captured. Never below 1.
    pub copy_count: u32,
    pub first_copy_time: DateTime<Utc>,
    pub last_copy_time: DateTime<Utc>,
    /// Raw encoded image bytes for image entries.
    pub image_data: Option<Vec<u8>>,
    /// Pixel dimensions probed from the image header, when readable.
    pub image_dimensions: Option<(u32, u32)>,
    /// Advisory uncompressed-size estimate (width * height * 4). Display
    /// only; ceilings and `byte_size` use real payload lengths.
    pub image_display_size: Option<u64>,
    /// First filesystem path for file entries.
    pub file_path: Option<String>,
    /// SHA-256 of `image_data`, lowercase hex. The dedup key for images.
    pub content_hash: Option<String>,
}

impl Entry {
    /// Total payload size in bytes: text content plus raw image bytes.
    pub fn byte_size(&self) -> u64 {
        self.content.len() as u64 + self.image_data.as_ref().map_or(0, |d| d.len() as u64)
    }
}

/// Error type for history store operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Operation cancelled")]
    Cancelled,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// The query and command surface the store offers to the host.
#[async_trait::async_trait]
pub trait HistoryStoreApi: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Full-text search over entry content and source app names, newest
    /// first. An empty or whitespace-only query returns an empty result.
    async fn search(&self, query: String) -> Result<Vec<Entry>, HistoryError>;

    /// First page of a category, most recently copied first.
    fn by_category(&self, category: Category) -> Result<Vec<Entry>, HistoryError>;

    /// First page of a category under an explicit sort order.
    fn sorted(
        &self,
        category: Category,
        option: SortOption,
        reversed: bool,
    ) -> Result<Vec<Entry>, HistoryError>;

    /// A later page of the same ordering, starting at `offset`.
    fn load_more(
        &self,
        category: Category,
        option: SortOption,
        reversed: bool,
        offset: u32,
    ) -> Result<Vec<Entry>, HistoryError>;

    /// Distinct source application names across the whole history, sorted.
    fn distinct_source_apps(&self) -> Vec<String>;

    /// Number of entries currently held.
    fn count(&self) -> u64;

    /// Size of the durable tier in bytes.
    fn database_size(&self) -> i64;

    // ─────────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────────

    /// Place a string on the pasteboard. The capture loop will observe it
    /// like any other change.
    fn copy(&self, content: String) -> Result<(), HistoryError>;

    /// Place encoded image bytes on the pasteboard.
    fn copy_image(&self, bytes: Vec<u8>) -> Result<(), HistoryError>;

    /// Flip an entry's favorite flag. Returns the new state.
    fn toggle_favorite(&self, entry_id: i64) -> Result<bool, HistoryError>;

    /// Delete an entry. Deleting an unknown id is a no-op.
    fn delete(&self, entry_id: i64) -> Result<(), HistoryError>;

    /// Delete every entry, favorites included.
    fn clear(&self) -> Result<(), HistoryError>;
}

impl From<crate::database::DatabaseError> for HistoryError {
    fn from(e: crate::database::DatabaseError) -> Self {
        HistoryError::Database(e.to_string())
    }
}

impl From<crate::config::ConfigError> for HistoryError {
    fn from(e: crate::config::ConfigError) -> Self {
        HistoryError::InvalidInput(e.to_string())
    }
}
