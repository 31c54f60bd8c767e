//! Host clipboard boundary.
//!
//! The OS pasteboard is an external collaborator reached through the
//! `Pasteboard` trait: a change counter, a multi-representation snapshot
//! read, a write surface, and frontmost-app lookup. `ChangeDetector` layers
//! edge-triggering on top of the polled counter. `MemoryPasteboard` is a
//! self-contained implementation for tests, benches, and headless hosts.

use parking_lot::Mutex;

/// Identity of the application that owned the clipboard at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppIdentity {
    /// Human-readable name, e.g. "Safari".
    pub name: Option<String>,
    /// Stable identifier, e.g. "com.apple.Safari".
    pub identifier: Option<String>,
}

/// One observation of the pasteboard's current contents, every
/// representation at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot {
    pub string: Option<String>,
    pub html: Option<String>,
    pub tiff: Option<Vec<u8>>,
    pub png: Option<Vec<u8>>,
    pub file_urls: Vec<String>,
}

/// Read/write surface of the system clipboard.
pub trait Pasteboard: Send + Sync {
    /// Generation counter. The host bumps it on every clipboard change;
    /// it never moves backwards within a session.
    fn change_count(&self) -> i64;

    /// Read the current contents in all representations.
    fn snapshot(&self) -> RawSnapshot;

    /// Replace the clipboard contents with a string.
    fn write_string(&self, text: &str);

    /// Replace the clipboard contents with encoded image bytes.
    fn write_image(&self, data: &[u8]);

    /// Identity of the frontmost application, if the host can resolve it.
    fn frontmost_app(&self) -> Option<AppIdentity>;
}

/// Edge-triggers on the pasteboard's generation counter.
///
/// The first poll always fires, so contents already on the clipboard at
/// startup are captured. Each poll reads the counter, compares, and then
/// records the read value, so a change landing mid-poll fires on the next
/// tick instead of being lost.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_change_count: Option<i64>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self {
            last_change_count: None,
        }
    }

    /// Returns a snapshot only when the generation moved since the
    /// previous poll.
    pub fn poll(&mut self, pasteboard: &dyn Pasteboard) -> Option<RawSnapshot> {
        let current = pasteboard.change_count();
        if self.last_change_count == Some(current) {
            return None;
        }
        self.last_change_count = Some(current);
        Some(pasteboard.snapshot())
    }

    /// Forget the recorded generation; the next poll fires unconditionally.
    pub fn reset(&mut self) {
        self.last_change_count = None;
    }
}

#[derive(Default)]
struct MemoryPasteboardState {
    change_count: i64,
    contents: RawSnapshot,
    frontmost: Option<AppIdentity>,
}

/// In-process pasteboard. Writes bump the change counter exactly like the
/// real one, so the full capture loop runs against it unchanged.
#[derive(Default)]
pub struct MemoryPasteboard {
    state: Mutex<MemoryPasteboardState>,
}

impl MemoryPasteboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frontmost application reported for subsequent captures.
    pub fn set_frontmost_app(&self, name: &str, identifier: &str) {
        self.state.lock().frontmost = Some(AppIdentity {
            name: Some(name.to_string()),
            identifier: Some(identifier.to_string()),
        });
    }

    /// Place arbitrary representations on the pasteboard, bumping the
    /// counter once.
    pub fn put(&self, contents: RawSnapshot) {
        let mut state = self.state.lock();
        state.contents = contents;
        state.change_count += 1;
    }

    pub fn put_string(&self, text: &str) {
        self.put(RawSnapshot {
            string: Some(text.to_string()),
            ..Default::default()
        });
    }

    pub fn put_image(&self, data: &[u8]) {
        self.put(RawSnapshot {
            png: Some(data.to_vec()),
            ..Default::default()
        });
    }

    pub fn put_files(&self, urls: &[&str]) {
        self.put(RawSnapshot {
            file_urls: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        });
    }
}

impl Pasteboard for MemoryPasteboard {
    fn change_count(&self) -> i64 {
        self.state.lock().change_count
    }

    fn snapshot(&self) -> RawSnapshot {
        self.state.lock().contents.clone()
    }

    fn write_string(&self, text: &str) {
        self.put_string(text);
    }

    fn write_image(&self, data: &[u8]) {
        self.put(RawSnapshot {
            png: Some(data.to_vec()),
            ..Default::default()
        });
    }

    fn frontmost_app(&self) -> Option<AppIdentity> {
        self.state.lock().frontmost.clone()
    }
}
