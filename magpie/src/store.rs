//! The history store.
//!
//! Two tiers: a fast in-memory tier (authoritative for every read and
//! updated synchronously on the capture path) and the SQLite durable tier,
//! mirrored asynchronously through a bounded queue and one background
//! writer. At open the durable tier hydrates the fast tier; after that,
//! readers never wait on disk.
//!
//! Async search runs the SQL on a blocking thread with cancellation
//! support; when called outside any Tokio runtime it borrows a shared
//! fallback runtime.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::database::Database;
use crate::dedup::{self, DedupIndex, DedupKey, Decision};
use crate::filter::CaptureFilter;
use crate::interface::{
    CaptureOutcome, Category, Entry, HistoryError, HistoryStoreApi, SortOption,
};
use crate::models::CapturedPayload;
use crate::pasteboard::Pasteboard;
use crate::query;
use crate::retention;
use crate::writer::{DurableWriter, SnapshotSource, WriteJob};

/// Fallback runtime for async calls arriving outside any Tokio context.
/// Shared across stores and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// Cancels the token when dropped. Dropping an un-awaited search future
/// trips this and interrupts the in-flight query.
struct DropGuard {
    token: CancellationToken,
}

impl DropGuard {
    fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Authoritative in-memory state: the entry map, the dedup index over it,
/// and the id allocator. All three mutate under one write lock.
#[derive(Default)]
struct FastTier {
    entries: HashMap<i64, Entry>,
    index: DedupIndex,
    next_id: i64,
}

impl FastTier {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// The background writer resolves persist jobs against the live fast tier,
/// so a job dequeued after a later mutation mirrors the later state.
impl SnapshotSource for RwLock<FastTier> {
    fn entry_snapshot(&self, id: i64) -> Option<Entry> {
        self.read().entries.get(&id).cloned()
    }
}

pub struct HistoryStore {
    config: Config,
    filter: CaptureFilter,
    fast: Arc<RwLock<FastTier>>,
    db: Arc<Database>,
    writer: DurableWriter,
    pasteboard: Arc<dyn Pasteboard>,
}

impl HistoryStore {
    /// Open the durable tier, run migrations, hydrate the fast tier, and
    /// start the background writer. A migration failure is fatal; an
    /// unreadable row is not.
    pub fn open<P: AsRef<Path>>(
        db_path: P,
        pasteboard: Arc<dyn Pasteboard>,
        config: Config,
    ) -> Result<Self, HistoryError> {
        config.validate()?;
        let db = Arc::new(Database::open(db_path)?);
        Self::with_database(db, pasteboard, config)
    }

    #[cfg(test)]
    pub(crate) fn new_in_memory(
        pasteboard: Arc<dyn Pasteboard>,
        config: Config,
    ) -> Result<Self, HistoryError> {
        config.validate()?;
        let db = Arc::new(Database::open_in_memory()?);
        Self::with_database(db, pasteboard, config)
    }

    fn with_database(
        db: Arc<Database>,
        pasteboard: Arc<dyn Pasteboard>,
        config: Config,
    ) -> Result<Self, HistoryError> {
        let mut fast = FastTier {
            next_id: db.max_entry_id()?,
            ..Default::default()
        };
        for entry in db.load_all()? {
            if let Some(id) = entry.id {
                fast.index.insert(DedupKey::for_entry(&entry), id);
                fast.entries.insert(id, entry);
            }
        }
        info!(entries = fast.entries.len(), "history store opened");

        let filter = CaptureFilter::new(&config);
        let fast = Arc::new(RwLock::new(fast));
        let source: Arc<dyn SnapshotSource> = fast.clone();
        let writer = DurableWriter::spawn(Arc::clone(&db), source);
        Ok(Self {
            config,
            filter,
            fast,
            db,
            writer,
            pasteboard,
        })
    }

    /// Shared pasteboard collaborator; the capture loop polls through it.
    pub fn pasteboard(&self) -> Arc<dyn Pasteboard> {
        Arc::clone(&self.pasteboard)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Push one classified payload through filter, dedup, and the fast
    /// tier, then queue the durable mirror. Never blocks on disk.
    pub fn capture(&self, payload: CapturedPayload) -> CaptureOutcome {
        if !self.filter.accept(&payload) {
            return CaptureOutcome::Rejected;
        }
        let now = Utc::now();
        let mut fast = self.fast.write();
        match dedup::resolve(&fast.index, payload, now) {
            Decision::Touch(id) => {
                let touched = match fast.entries.get_mut(&id) {
                    Some(entry) => {
                        entry.copy_count = entry.copy_count.saturating_add(1);
                        // Clamp so a stepped-back clock never moves the
                        // entry backwards in recency order.
                        entry.last_copy_time = now.max(entry.last_copy_time);
                        true
                    }
                    None => false,
                };
                drop(fast);
                if touched {
                    debug!(id, "recaptured existing entry");
                    self.writer.submit_capture(WriteJob::Persist(id));
                    CaptureOutcome::Touched(id)
                } else {
                    warn!(id, "dedup index pointed at a missing entry");
                    CaptureOutcome::Rejected
                }
            }
            Decision::Insert(mut entry) => {
                let id = fast.allocate_id();
                entry.id = Some(id);
                let kind = entry.kind;
                fast.index.insert(DedupKey::for_entry(&entry), id);
                fast.entries.insert(id, entry);
                drop(fast);
                debug!(id, ?kind, "captured new entry");
                self.writer.submit_capture(WriteJob::Persist(id));
                CaptureOutcome::Inserted(id)
            }
        }
    }

    /// Apply the retention policy as of `now`. Favorites always survive.
    /// Returns the number of evicted entries.
    pub fn sweep(&self, now: DateTime<Utc>) -> u64 {
        let max_age = self.config.max_age();
        let max_entries = self.config.max_entries;

        let mut fast = self.fast.write();
        let evict = retention::plan_sweep(fast.entries.values(), now, max_age, max_entries);
        for id in &evict {
            if let Some(entry) = fast.entries.remove(id) {
                let key = DedupKey::for_entry(&entry);
                fast.index.remove(&key);
            }
        }
        drop(fast);

        let evicted = evict.len() as u64;
        if evicted > 0 {
            info!(evicted, "retention sweep evicted entries");
            // try_send keeps the sweep, which runs on the capture thread,
            // from stalling behind a full queue. A dropped delete leaves a
            // durable row the next sweep will plan again after restart.
            for id in evict {
                self.writer.submit_capture(WriteJob::Delete(id));
            }
        }
        evicted
    }

    /// Block until queued durable writes are applied.
    pub fn flush(&self) {
        self.writer.flush();
    }

    /// Drain the durable queue and stop the background writer. The store
    /// remains usable for reads afterwards.
    pub fn close(&self) {
        self.writer.close();
    }

    fn runtime_handle(&self) -> tokio::runtime::Handle {
        tokio::runtime::Handle::try_current()
            .unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
    }
}

#[async_trait::async_trait]
impl HistoryStoreApi for HistoryStore {
    async fn search(&self, query: String) -> Result<Vec<Entry>, HistoryError> {
        let trimmed = query.trim().to_string();
        // Empty means empty, not "everything".
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let token = CancellationToken::new();
        let _guard = DropGuard::new(token.clone());

        let runtime = self.runtime_handle();
        let runtime_for_query = runtime.clone();
        let db = Arc::clone(&self.db);
        let limit = self.config.page_size;
        let token_for_query = token.clone();

        let handle = runtime.spawn_blocking(move || {
            if token_for_query.is_cancelled() {
                return Err(HistoryError::Cancelled);
            }
            db.search_interruptible(&trimmed, limit, &token_for_query, &runtime_for_query)
                .map_err(HistoryError::from)
        });

        match handle.await {
            Ok(Ok(entries)) => Ok(entries),
            Ok(Err(HistoryError::Cancelled)) => Err(HistoryError::Cancelled),
            Ok(Err(e)) => {
                warn!(error = %e, "search failed, returning empty result");
                Ok(Vec::new())
            }
            Err(_join_error) => Err(HistoryError::Cancelled),
        }
    }

    fn by_category(&self, category: Category) -> Result<Vec<Entry>, HistoryError> {
        self.sorted(category, SortOption::LastCopyTime, false)
    }

    fn sorted(
        &self,
        category: Category,
        option: SortOption,
        reversed: bool,
    ) -> Result<Vec<Entry>, HistoryError> {
        self.load_more(category, option, reversed, 0)
    }

    fn load_more(
        &self,
        category: Category,
        option: SortOption,
        reversed: bool,
        offset: u32,
    ) -> Result<Vec<Entry>, HistoryError> {
        let fast = self.fast.read();
        let mut entries: Vec<Entry> = fast
            .entries
            .values()
            .filter(|e| query::matches_category(e, category))
            .cloned()
            .collect();
        drop(fast);

        query::sort_entries(&mut entries, option, reversed);
        Ok(query::page(entries, offset as usize, self.config.page_size))
    }

    fn distinct_source_apps(&self) -> Vec<String> {
        let fast = self.fast.read();
        let apps: BTreeSet<String> = fast
            .entries
            .values()
            .filter_map(|e| e.source_app.clone())
            .collect();
        apps.into_iter().collect()
    }

    fn count(&self) -> u64 {
        self.fast.read().entries.len() as u64
    }

    fn database_size(&self) -> i64 {
        self.db.database_size().unwrap_or(0)
    }

    fn copy(&self, content: String) -> Result<(), HistoryError> {
        if content.is_empty() {
            return Err(HistoryError::InvalidInput("empty content".to_string()));
        }
        self.pasteboard.write_string(&content);
        Ok(())
    }

    fn copy_image(&self, bytes: Vec<u8>) -> Result<(), HistoryError> {
        if bytes.is_empty() {
            return Err(HistoryError::InvalidInput("empty image data".to_string()));
        }
        self.pasteboard.write_image(&bytes);
        Ok(())
    }

    fn toggle_favorite(&self, entry_id: i64) -> Result<bool, HistoryError> {
        let mut fast = self.fast.write();
        let entry = fast.entries.get_mut(&entry_id).ok_or_else(|| {
            HistoryError::InvalidInput(format!("no entry with id {}", entry_id))
        })?;
        entry.is_favorite = !entry.is_favorite;
        let state = entry.is_favorite;
        drop(fast);

        self.writer.submit(WriteJob::Persist(entry_id));
        Ok(state)
    }

    fn delete(&self, entry_id: i64) -> Result<(), HistoryError> {
        let mut fast = self.fast.write();
        if let Some(entry) = fast.entries.remove(&entry_id) {
            let key = DedupKey::for_entry(&entry);
            fast.index.remove(&key);
            drop(fast);
            self.writer.submit(WriteJob::Delete(entry_id));
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        let mut fast = self.fast.write();
        fast.entries.clear();
        fast.index.clear();
        drop(fast);

        self.writer.submit(WriteJob::Clear);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pasteboard::MemoryPasteboard;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn test_store() -> HistoryStore {
        HistoryStore::new_in_memory(Arc::new(MemoryPasteboard::new()), Config::default()).unwrap()
    }

    fn test_store_with(config: Config) -> HistoryStore {
        HistoryStore::new_in_memory(Arc::new(MemoryPasteboard::new()), config).unwrap()
    }

    fn text(content: &str) -> CapturedPayload {
        CapturedPayload::new_text(content.to_string(), None, None, None)
    }

    fn text_from(content: &str, app: &str) -> CapturedPayload {
        CapturedPayload::new_text(content.to_string(), None, Some(app.to_string()), None)
    }

    #[test]
    fn test_store_creation() {
        let store = test_store();
        assert_eq!(store.count(), 0);
        assert!(store.database_size() > 0);
    }

    #[test]
    fn test_invalid_config_fails_open() {
        let config = Config {
            poll_interval_ms: 0,
            ..Default::default()
        };
        let result = HistoryStore::new_in_memory(Arc::new(MemoryPasteboard::new()), config);
        assert!(matches!(result, Err(HistoryError::InvalidInput(_))));
    }

    #[test]
    fn test_capture_inserts_then_touches() {
        let store = test_store();

        let first = store.capture(text("repeated payload"));
        let id = match first {
            CaptureOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        for n in 2..=5u32 {
            match store.capture(text("repeated payload")) {
                CaptureOutcome::Touched(touched) => assert_eq!(touched, id),
                other => panic!("expected touch, got {:?}", other),
            }
            let entry = &store.by_category(Category::History).unwrap()[0];
            assert_eq!(entry.copy_count, n);
        }

        assert_eq!(store.count(), 1);
        let entry = &store.by_category(Category::History).unwrap()[0];
        assert!(entry.last_copy_time >= entry.first_copy_time);
    }

    #[test]
    fn test_touch_keeps_first_copy_time() {
        let store = test_store();
        store.capture(text("pinned origin"));
        let before = store.by_category(Category::History).unwrap()[0].first_copy_time;

        store.capture(text("pinned origin"));
        let after = store.by_category(Category::History).unwrap()[0].first_copy_time;
        assert_eq!(before, after);
    }

    #[test]
    fn test_filter_rejects_before_dedup() {
        let store = test_store();
        assert_eq!(store.capture(text("")), CaptureOutcome::Rejected);
        assert_eq!(
            store.capture(text_from("hunter2", "1Password")),
            CaptureOutcome::Rejected
        );
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_image_capture_dedups_by_bytes() {
        let store = test_store();

        let first = store.capture(CapturedPayload::new_image(vec![1, 2, 3, 4], None, None));
        assert!(matches!(first, CaptureOutcome::Inserted(_)));

        let again = store.capture(CapturedPayload::new_image(vec![1, 2, 3, 4], None, None));
        assert!(matches!(again, CaptureOutcome::Touched(_)));

        let different = store.capture(CapturedPayload::new_image(vec![1, 2, 3, 5], None, None));
        assert!(matches!(different, CaptureOutcome::Inserted(_)));

        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_same_content_different_kinds_stay_distinct() {
        let store = test_store();
        store.capture(text("/tmp/report.pdf"));
        store.capture(CapturedPayload::new_files(
            vec!["/tmp/report.pdf".to_string()],
            None,
            None,
        ));
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_by_category_filters_kinds() {
        let store = test_store();
        store.capture(text("plain words"));
        store.capture(text("https://example.com/page"));
        store.capture(text("someone@example.com"));
        store.capture(CapturedPayload::new_image(vec![9, 9], None, None));

        assert_eq!(store.by_category(Category::History).unwrap().len(), 4);
        assert_eq!(store.by_category(Category::Text).unwrap().len(), 1);
        assert_eq!(store.by_category(Category::Links).unwrap().len(), 1);
        assert_eq!(store.by_category(Category::Emails).unwrap().len(), 1);
        assert_eq!(store.by_category(Category::Images).unwrap().len(), 1);
        assert_eq!(store.by_category(Category::Favorites).unwrap().len(), 0);
    }

    #[test]
    fn test_toggle_favorite_roundtrip() {
        let store = test_store();
        let id = match store.capture(text("keep me")) {
            CaptureOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        assert!(store.toggle_favorite(id).unwrap());
        assert_eq!(store.by_category(Category::Favorites).unwrap().len(), 1);
        assert!(!store.toggle_favorite(id).unwrap());
        assert_eq!(store.by_category(Category::Favorites).unwrap().len(), 0);
    }

    #[test]
    fn test_toggle_favorite_unknown_id_errors() {
        let store = test_store();
        assert!(matches!(
            store.toggle_favorite(404),
            Err(HistoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_delete_is_idempotent_and_frees_the_dedup_slot() {
        let store = test_store();
        let id = match store.capture(text("transient")) {
            CaptureOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        store.delete(id).unwrap();
        store.delete(id).unwrap();
        assert_eq!(store.count(), 0);

        // Same content captures as a brand-new entry now.
        match store.capture(text("transient")) {
            CaptureOutcome::Inserted(new_id) => assert_ne!(new_id, id),
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_clear_removes_favorites_too() {
        let store = test_store();
        let id = match store.capture(text("favored")) {
            CaptureOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };
        store.toggle_favorite(id).unwrap();
        store.capture(text("ordinary"));

        store.clear().unwrap();
        assert_eq!(store.count(), 0);
        assert!(store.by_category(Category::Favorites).unwrap().is_empty());
    }

    #[test]
    fn test_copy_places_content_on_the_pasteboard() {
        let pasteboard = Arc::new(MemoryPasteboard::new());
        let store =
            HistoryStore::new_in_memory(pasteboard.clone(), Config::default()).unwrap();

        let before = pasteboard.change_count();
        store.copy("paste me back".to_string()).unwrap();
        assert_eq!(pasteboard.change_count(), before + 1);
        assert_eq!(
            pasteboard.snapshot().string.as_deref(),
            Some("paste me back")
        );

        assert!(matches!(
            store.copy(String::new()),
            Err(HistoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_copy_image_places_bytes_on_the_pasteboard() {
        let pasteboard = Arc::new(MemoryPasteboard::new());
        let store =
            HistoryStore::new_in_memory(pasteboard.clone(), Config::default()).unwrap();

        store.copy_image(vec![5, 6, 7]).unwrap();
        assert_eq!(pasteboard.snapshot().png, Some(vec![5, 6, 7]));
        assert!(store.copy_image(Vec::new()).is_err());
    }

    #[test]
    fn test_distinct_source_apps_sorted() {
        let store = test_store();
        store.capture(text_from("a", "Xcode"));
        store.capture(text_from("b", "Safari"));
        store.capture(text_from("c", "Safari"));
        store.capture(text("d"));

        assert_eq!(
            store.distinct_source_apps(),
            vec!["Safari".to_string(), "Xcode".to_string()]
        );
    }

    #[test]
    fn test_load_more_pages_without_overlap() {
        let config = Config {
            page_size: 3,
            ..Default::default()
        };
        let store = test_store_with(config);
        for i in 0..8 {
            store.capture(text(&format!("row {}", i)));
        }

        let page1 = store
            .sorted(Category::History, SortOption::FirstCopyTime, false)
            .unwrap();
        let page2 = store
            .load_more(Category::History, SortOption::FirstCopyTime, false, 3)
            .unwrap();
        let page3 = store
            .load_more(Category::History, SortOption::FirstCopyTime, false, 6)
            .unwrap();

        assert_eq!(page1.len(), 3);
        assert_eq!(page2.len(), 3);
        assert_eq!(page3.len(), 2);

        let mut all: Vec<i64> = page1
            .iter()
            .chain(&page2)
            .chain(&page3)
            .filter_map(|e| e.id)
            .collect();
        let before = all.clone();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 8);
        // FirstCopyTime natural order is insertion order here.
        assert_eq!(before, all);
    }

    #[test]
    fn test_sweep_evicts_aged_non_favorites() {
        let store = test_store();
        let keep = match store.capture(text("favorite, kept forever")) {
            CaptureOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };
        store.toggle_favorite(keep).unwrap();
        store.capture(text("doomed"));

        // Both entries are "old" when the sweep runs far in the future.
        let evicted = store.sweep(Utc::now() + chrono::Duration::days(31));
        assert_eq!(evicted, 1);
        assert_eq!(store.count(), 1);
        assert_eq!(
            store.by_category(Category::History).unwrap()[0].id,
            Some(keep)
        );
    }

    #[test]
    fn test_sweep_applies_count_cap() {
        let config = Config {
            max_entries: 4,
            max_age_days: 0,
            ..Default::default()
        };
        let store = test_store_with(config);
        for i in 0..10 {
            store.capture(text(&format!("bulk {}", i)));
        }

        let evicted = store.sweep(Utc::now());
        assert_eq!(evicted, 6);
        assert_eq!(store.count(), 4);

        // The newest four survive.
        let survivors: Vec<String> = store
            .sorted(Category::History, SortOption::FirstCopyTime, false)
            .unwrap()
            .into_iter()
            .map(|e| e.content)
            .collect();
        assert_eq!(survivors, vec!["bulk 6", "bulk 7", "bulk 8", "bulk 9"]);
    }

    #[test]
    fn test_sweep_frees_dedup_slots() {
        let config = Config {
            max_entries: 1,
            max_age_days: 0,
            ..Default::default()
        };
        let store = test_store_with(config);
        store.capture(text("first"));
        store.capture(text("second"));
        store.sweep(Utc::now());
        assert_eq!(store.count(), 1);

        // The evicted content can be captured fresh again.
        assert!(matches!(
            store.capture(text("first")),
            CaptureOutcome::Inserted(_)
        ));
    }

    #[test]
    fn test_search_empty_query_returns_empty() {
        let store = test_store();
        store.capture(text("searchable content"));
        store.flush();

        let rt = runtime();
        assert!(rt.block_on(store.search(String::new())).unwrap().is_empty());
        assert!(rt
            .block_on(store.search("   ".to_string()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_search_finds_flushed_entries() {
        let store = test_store();
        store.capture(text_from("the riverside house", "Notes"));
        store.capture(text("unrelated"));
        store.flush();

        let rt = runtime();
        let hits = rt.block_on(store.search("riverside".to_string())).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "the riverside house");

        // Source app names match too.
        let hits = rt.block_on(store.search("Notes".to_string())).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_search_works_without_external_runtime() {
        let store = test_store();
        store.capture(text("fallback runtime target"));
        store.flush();

        // No Tokio context here; the store borrows its fallback runtime.
        let hits =
            futures::executor::block_on(store.search("fallback".to_string())).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_dropped_search_future_leaves_store_usable() {
        let store = test_store();
        store.capture(text("still searchable"));
        store.flush();

        {
            // Create and drop the future without polling it.
            let _ = store.search("still".to_string());
        }

        let rt = runtime();
        let hits = rt.block_on(store.search("still".to_string())).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_dropped_in_flight_search_cancels_and_store_survives() {
        use std::future::Future;
        use std::task::{Context, Poll};

        let store = test_store();
        store.capture(text("long lived row"));
        store.flush();

        // Poll once so the blocking query is actually launched, then drop
        // the future mid-flight. The guard cancels the token, which either
        // short-circuits the queued query or interrupts the running one.
        let mut fut = store.search("lived".to_string());
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        if let Poll::Ready(result) = fut.as_mut().poll(&mut cx) {
            assert!(result.is_ok());
        }
        drop(fut);

        let rt = runtime();
        let hits = rt.block_on(store.search("lived".to_string())).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "long lived row");
    }

    #[test]
    fn test_close_then_reads_still_serve() {
        let store = test_store();
        store.capture(text("read after close"));
        store.close();
        assert_eq!(store.count(), 1);
        assert_eq!(store.by_category(Category::History).unwrap().len(), 1);
    }
}
