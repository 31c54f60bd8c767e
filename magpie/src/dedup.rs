//! Recapture detection.
//!
//! Every payload resolves to either a brand-new entry or a touch of an
//! existing one. Equivalence is kind-scoped: text-family kinds compare by
//! exact content, images by the SHA-256 of their raw bytes, so the same
//! pixels re-encoded differently stay distinct entries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::interface::{Entry, EntryKind};
use crate::models::CapturedPayload;

/// Equivalence key. One persisted entry exists per distinct key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum DedupKey {
    /// Exact content equality, scoped by kind so a path copied as text
    /// and the same path copied as a file stay separate entries.
    Content(EntryKind, String),
    /// SHA-256 of raw image bytes, lowercase hex.
    ImageHash(String),
}

impl DedupKey {
    pub fn for_payload(payload: &CapturedPayload) -> Self {
        Self::keyed(payload.kind, payload.content_hash.as_deref(), &payload.content)
    }

    pub fn for_entry(entry: &Entry) -> Self {
        Self::keyed(entry.kind, entry.content_hash.as_deref(), &entry.content)
    }

    /// Images key by hash. A hash-less image row (only possible for rows
    /// written outside this crate) falls back to the kind-scoped content
    /// key rather than pooling every such row under one empty hash.
    fn keyed(kind: EntryKind, content_hash: Option<&str>, content: &str) -> Self {
        match (kind, content_hash) {
            (EntryKind::Image, Some(hash)) => DedupKey::ImageHash(hash.to_string()),
            (kind, _) => DedupKey::Content(kind, content.to_string()),
        }
    }
}

/// Fast-tier index from dedup key to entry id. Maintained alongside the
/// entry map by whoever holds the write lock.
#[derive(Debug, Default)]
pub(crate) struct DedupIndex {
    by_key: HashMap<DedupKey, i64>,
}

impl DedupIndex {
    pub fn get(&self, key: &DedupKey) -> Option<i64> {
        self.by_key.get(key).copied()
    }

    pub fn insert(&mut self, key: DedupKey, id: i64) {
        self.by_key.insert(key, id);
    }

    pub fn remove(&mut self, key: &DedupKey) {
        self.by_key.remove(key);
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
    }
}

/// Insert-vs-touch decision for one accepted payload.
#[derive(Debug)]
pub(crate) enum Decision {
    /// No equivalent entry exists; persist this one.
    Insert(Entry),
    /// An equivalent entry exists; bump its counters.
    Touch(i64),
}

/// Resolve a payload against the index. Consumes the payload so an insert
/// moves the (possibly large) image bytes instead of cloning them.
pub(crate) fn resolve(index: &DedupIndex, payload: CapturedPayload, now: DateTime<Utc>) -> Decision {
    let key = DedupKey::for_payload(&payload);
    match index.get(&key) {
        Some(id) => Decision::Touch(id),
        None => Decision::Insert(Entry::from_payload(payload, now)),
    }
}
