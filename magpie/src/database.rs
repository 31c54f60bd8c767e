//! SQLite durable tier.
//!
//! One `entries` table mirrors the fast tier row for row; an external-content
//! FTS5 table over `content` and `sourceApp` is kept in sync by triggers, so
//! the index commits in the same transaction as the row it covers.
//! Uses r2d2 connection pooling to allow concurrent reads without mutex
//! blocking.

use chrono::{DateTime, TimeZone, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::interface::{Entry, EntryKind};

/// Version stamped into `schema_meta` after the last applied migration.
const SCHEMA_VERSION: i64 = 2;

/// How many recent rows the substring pass scans.
const SUBSTRING_SCAN_ROWS: i64 = 2000;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Migration failed: {message}")]
    Migration { message: String },
    #[error("Entry has no id assigned")]
    MissingId,
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Parse timestamp string from database to DateTime<Utc>
fn parse_db_timestamp(timestamp_str: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S"))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or_else(|_| Utc::now())
}

fn format_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// Wrap a user query for FTS5: double quotes neutralize the query
/// mini-language, the trailing `*` makes the last token a prefix match.
fn sanitize_fts_query(query: &str) -> String {
    let escaped = query.replace('"', "\"\"");
    format!("\"{}\"*", escaped)
}

/// Escape LIKE wildcards in a user query.
fn escape_like_pattern(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Thread-safe database wrapper using connection pooling
///
/// WAL mode enables readers to proceed without blocking the single
/// background writer.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open or create a database at the given path and bring its schema up
    /// to the current version.
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                PRAGMA foreign_keys=ON;
                PRAGMA mmap_size=67108864;
                PRAGMA cache_size=-32000;
            ",
            )?;
            Ok(())
        });

        let pool = Pool::builder().max_size(8).build(manager)?;

        let db = Self { pool };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                PRAGMA foreign_keys=ON;
            ",
            )?;
            Ok(())
        });

        // In-memory needs single connection to maintain state
        let pool = Pool::builder().max_size(1).build(manager)?;

        let db = Self { pool };
        db.migrate()?;
        Ok(db)
    }

    /// Get a connection from the pool
    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Migrations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Walk the schema from its recorded version to `SCHEMA_VERSION`, one
    /// transaction per step. Steps only add; no step rewrites or drops rows.
    fn migrate(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        let mut version = Self::schema_version(&conn)?;
        if version > SCHEMA_VERSION {
            return Err(DatabaseError::Migration {
                message: format!(
                    "database schema version {} is newer than supported version {}",
                    version, SCHEMA_VERSION
                ),
            });
        }

        while version < SCHEMA_VERSION {
            let next = version + 1;
            let tx = conn.unchecked_transaction()?;
            match next {
                1 => Self::migrate_to_v1(&tx)?,
                2 => Self::migrate_to_v2(&tx)?,
                _ => {
                    return Err(DatabaseError::Migration {
                        message: format!("no migration step for version {}", next),
                    })
                }
            }
            tx.execute(
                "INSERT INTO schema_meta (key, value) VALUES ('schema_version', ?1)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![next.to_string()],
            )?;
            tx.commit()?;
            version = next;
        }
        Ok(())
    }

    fn schema_version(conn: &rusqlite::Connection) -> DatabaseResult<i64> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    /// Base schema: the entries table, its query indexes, and the FTS5
    /// mirror with its synchronization triggers.
    fn migrate_to_v1(conn: &rusqlite::Connection) -> DatabaseResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY,
                kind TEXT NOT NULL,
                content TEXT NOT NULL,
                htmlContent TEXT,
                sourceApp TEXT,
                sourceAppId TEXT,
                isFavorite INTEGER NOT NULL DEFAULT 0,
                copyCount INTEGER NOT NULL DEFAULT 1,
                firstCopyTime TEXT NOT NULL,
                lastCopyTime TEXT NOT NULL,
                imageData BLOB,
                imageWidth INTEGER,
                imageHeight INTEGER,
                filePath TEXT,
                contentHash TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_entries_last_copy ON entries(lastCopyTime);
            CREATE INDEX IF NOT EXISTS idx_entries_kind ON entries(kind);
            CREATE INDEX IF NOT EXISTS idx_entries_favorite ON entries(isFavorite);
            CREATE INDEX IF NOT EXISTS idx_entries_source_app ON entries(sourceApp);

            CREATE VIRTUAL TABLE IF NOT EXISTS entries_fts USING fts5(
                content,
                sourceApp,
                content='entries',
                content_rowid='id'
            );

            CREATE TRIGGER IF NOT EXISTS entries_ai AFTER INSERT ON entries BEGIN
                INSERT INTO entries_fts(rowid, content, sourceApp)
                VALUES (NEW.id, NEW.content, NEW.sourceApp);
            END;

            CREATE TRIGGER IF NOT EXISTS entries_ad AFTER DELETE ON entries BEGIN
                INSERT INTO entries_fts(entries_fts, rowid, content, sourceApp)
                VALUES ('delete', OLD.id, OLD.content, OLD.sourceApp);
            END;

            CREATE TRIGGER IF NOT EXISTS entries_au AFTER UPDATE OF content, sourceApp ON entries BEGIN
                INSERT INTO entries_fts(entries_fts, rowid, content, sourceApp)
                VALUES ('delete', OLD.id, OLD.content, OLD.sourceApp);
                INSERT INTO entries_fts(rowid, content, sourceApp)
                VALUES (NEW.id, NEW.content, NEW.sourceApp);
            END;
            "#,
        )?;
        Ok(())
    }

    /// Adds the advisory display-size column for image entries.
    fn migrate_to_v2(conn: &rusqlite::Connection) -> DatabaseResult<()> {
        // Column probe keeps this step re-runnable on a partially stamped
        // database.
        let has_column = conn
            .prepare("SELECT imageDisplaySize FROM entries LIMIT 0")
            .is_ok();
        if !has_column {
            conn.execute_batch("ALTER TABLE entries ADD COLUMN imageDisplaySize INTEGER")?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Mirror one fast-tier entry. The insert arm writes the full row; the
    /// conflict arm only touches the columns that mutate after creation, so
    /// a counter bump never churns the FTS index.
    pub fn upsert_entry(&self, entry: &Entry) -> DatabaseResult<()> {
        let id = entry.id.ok_or(DatabaseError::MissingId)?;
        let conn = self.get_conn()?;
        let (width, height) = match entry.image_dimensions {
            Some((w, h)) => (Some(i64::from(w)), Some(i64::from(h))),
            None => (None, None),
        };
        conn.execute(
            r#"INSERT INTO entries (
                   id, kind, content, htmlContent, sourceApp, sourceAppId,
                   isFavorite, copyCount, firstCopyTime, lastCopyTime,
                   imageData, imageWidth, imageHeight, imageDisplaySize,
                   filePath, contentHash
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
               ON CONFLICT(id) DO UPDATE SET
                   isFavorite = excluded.isFavorite,
                   copyCount = excluded.copyCount,
                   lastCopyTime = excluded.lastCopyTime"#,
            params![
                id,
                entry.kind.as_db_str(),
                entry.content,
                entry.html_content,
                entry.source_app,
                entry.source_app_id,
                entry.is_favorite as i64,
                i64::from(entry.copy_count),
                format_db_timestamp(entry.first_copy_time),
                format_db_timestamp(entry.last_copy_time),
                entry.image_data,
                width,
                height,
                entry.image_display_size.map(|v| v as i64),
                entry.file_path,
                entry.content_hash,
            ],
        )?;
        Ok(())
    }

    pub fn delete_entry(&self, id: i64) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM entries WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn clear_all(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM entries", [])?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// Fetch every entry, newest first. Used to hydrate the fast tier at
    /// store open.
    pub fn load_all(&self) -> DatabaseResult<Vec<Entry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, content, htmlContent, sourceApp, sourceAppId,
                    isFavorite, copyCount, firstCopyTime, lastCopyTime,
                    imageData, imageWidth, imageHeight, imageDisplaySize,
                    filePath, contentHash
             FROM entries ORDER BY lastCopyTime DESC",
        )?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Fetch a single entry by id.
    pub fn get_entry(&self, id: i64) -> DatabaseResult<Option<Entry>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT id, kind, content, htmlContent, sourceApp, sourceAppId,
                    isFavorite, copyCount, firstCopyTime, lastCopyTime,
                    imageData, imageWidth, imageHeight, imageDisplaySize,
                    filePath, contentHash
             FROM entries WHERE id = ?1",
            [id],
            Self::row_to_entry,
        );
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Highest id ever assigned, 0 on an empty database. Seeds the fast
    /// tier's id allocator.
    pub fn max_entry_id(&self) -> DatabaseResult<i64> {
        let conn = self.get_conn()?;
        let max: Option<i64> = conn.query_row("SELECT MAX(id) FROM entries", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0))
    }

    pub fn count_entries(&self) -> DatabaseResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Get the database size in bytes
    pub fn database_size(&self) -> DatabaseResult<i64> {
        let conn = self.get_conn()?;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok(page_count * page_size)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────────────

    /// Full-text search over content and source app, newest first.
    ///
    /// Two passes merged with id dedup: a sanitized FTS5 MATCH (token and
    /// prefix hits), then a substring LIKE over the most recent rows so
    /// mid-token fragments still match. An FTS failure degrades to the
    /// substring pass alone.
    pub fn search(&self, query: &str, limit: usize) -> DatabaseResult<Vec<Entry>> {
        let conn = self.get_conn()?;
        Self::search_on_conn(&conn, query, limit)
    }

    /// Search with SQLite C-level interrupt support: a watcher task trips
    /// the connection's interrupt handle when the token cancels, aborting
    /// the in-flight statement. An interrupted search returns empty.
    pub fn search_interruptible(
        &self,
        query: &str,
        limit: usize,
        token: &tokio_util::sync::CancellationToken,
        runtime: &tokio::runtime::Handle,
    ) -> DatabaseResult<Vec<Entry>> {
        use tokio_util::task::AbortOnDropHandle;

        let conn = self.get_conn()?;
        let interrupt_handle = conn.get_interrupt_handle();

        let token_clone = token.clone();
        let watcher = runtime.spawn(async move {
            token_clone.cancelled().await;
            interrupt_handle.interrupt();
        });
        let _abort_guard = AbortOnDropHandle::new(watcher);

        match Self::search_on_conn(&conn, query, limit) {
            Err(DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == rusqlite::ffi::ErrorCode::OperationInterrupted =>
            {
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn search_on_conn(
        conn: &rusqlite::Connection,
        query: &str,
        limit: usize,
    ) -> DatabaseResult<Vec<Entry>> {
        let mut seen_ids = HashSet::new();
        let mut results: Vec<Entry> = Vec::with_capacity(limit);

        // Part 1: FTS5 match.
        let fts_query = sanitize_fts_query(query);
        let fts_pass = conn
            .prepare(
                "SELECT e.id, e.kind, e.content, e.htmlContent, e.sourceApp, e.sourceAppId,
                        e.isFavorite, e.copyCount, e.firstCopyTime, e.lastCopyTime,
                        e.imageData, e.imageWidth, e.imageHeight, e.imageDisplaySize,
                        e.filePath, e.contentHash
                 FROM entries e
                 INNER JOIN entries_fts fts ON e.id = fts.rowid
                 WHERE entries_fts MATCH ?1
                 ORDER BY e.lastCopyTime DESC
                 LIMIT ?2",
            )
            .and_then(|mut stmt| {
                stmt.query_map(params![fts_query, limit as i64], Self::row_to_entry)?
                    .collect::<Result<Vec<_>, _>>()
            });
        match fts_pass {
            Ok(rows) => {
                for entry in rows {
                    if let Some(id) = entry.id {
                        if seen_ids.insert(id) {
                            results.push(entry);
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "full-text pass failed, substring pass only");
            }
        }

        // Part 2: substring LIKE over the most recent rows.
        let like_pattern = format!("%{}%", escape_like_pattern(query));
        let mut stmt = conn.prepare(&format!(
            r#"SELECT e.id, e.kind, e.content, e.htmlContent, e.sourceApp, e.sourceAppId,
                      e.isFavorite, e.copyCount, e.firstCopyTime, e.lastCopyTime,
                      e.imageData, e.imageWidth, e.imageHeight, e.imageDisplaySize,
                      e.filePath, e.contentHash
               FROM (SELECT * FROM entries ORDER BY lastCopyTime DESC LIMIT {}) e
               WHERE (e.content LIKE ?1 ESCAPE '\' COLLATE NOCASE
                      OR e.sourceApp LIKE ?1 ESCAPE '\' COLLATE NOCASE)
               ORDER BY e.lastCopyTime DESC
               LIMIT ?2"#,
            SUBSTRING_SCAN_ROWS
        ))?;
        let like_rows = stmt
            .query_map(params![like_pattern, limit as i64], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        for entry in like_rows {
            if let Some(id) = entry.id {
                if seen_ids.insert(id) {
                    results.push(entry);
                }
            }
        }

        // Single recency ranking across both passes.
        results.sort_by(|a, b| {
            b.last_copy_time
                .cmp(&a.last_copy_time)
                .then_with(|| b.id.cmp(&a.id))
        });
        results.truncate(limit);
        Ok(results)
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let id: i64 = row.get(0)?;
        let kind: String = row.get(1)?;
        let is_favorite: i64 = row.get(6)?;
        let copy_count: i64 = row.get(7)?;
        let first_copy_time: String = row.get(8)?;
        let last_copy_time: String = row.get(9)?;
        let image_width: Option<i64> = row.get(11)?;
        let image_height: Option<i64> = row.get(12)?;
        let image_display_size: Option<i64> = row.get(13)?;

        let image_dimensions = match (image_width, image_height) {
            (Some(w), Some(h)) => Some((w as u32, h as u32)),
            _ => None,
        };

        Ok(Entry {
            id: Some(id),
            kind: EntryKind::from_db_str(&kind),
            content: row.get(2)?,
            html_content: row.get(3)?,
            source_app: row.get(4)?,
            source_app_id: row.get(5)?,
            is_favorite: is_favorite != 0,
            copy_count: copy_count.clamp(1, i64::from(u32::MAX)) as u32,
            first_copy_time: parse_db_timestamp(&first_copy_time),
            last_copy_time: parse_db_timestamp(&last_copy_time),
            image_data: row.get(10)?,
            image_dimensions,
            image_display_size: image_display_size.map(|v| v as u64),
            file_path: row.get(14)?,
            content_hash: row.get(15)?,
        })
    }
}
