//! Magpie - clipboard history capture and storage core.
//!
//! A background pipeline polls the host pasteboard, classifies and
//! deduplicates what lands there, and persists it into a dual-tier store:
//! a fast in-memory tier that answers every read, mirrored asynchronously
//! into SQLite with a trigger-synchronized FTS5 index. Retention sweeps
//! enforce an age threshold and a count cap without ever evicting
//! favorites.
//!
//! The host supplies a [`pasteboard::Pasteboard`] implementation and a
//! [`Config`], opens a [`HistoryStore`], and starts the capture loop with
//! [`monitor::start`]. Everything else runs in the background.

pub mod config;
pub mod content_detection;
pub mod database;
mod dedup;
mod filter;
pub mod interface;
pub mod models;
pub mod monitor;
pub mod pasteboard;
mod query;
mod retention;
mod store;
mod writer;

pub use config::{Config, ConfigError};
pub use interface::{
    CaptureOutcome, Category, Entry, EntryKind, HistoryError, HistoryStoreApi, SortOption,
};
pub use monitor::CaptureHandle;
pub use pasteboard::{AppIdentity, ChangeDetector, MemoryPasteboard, Pasteboard, RawSnapshot};
pub use store::HistoryStore;
