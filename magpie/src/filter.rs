//! Capture filtering.
//!
//! Privacy and noise suppression applied before dedup. Rejections are
//! silent toward the host: the payload simply never becomes an entry, and
//! the reason lands in the log.

use std::collections::HashSet;

use tracing::debug;

use crate::config::Config;
use crate::interface::EntryKind;
use crate::models::CapturedPayload;

/// Why a payload was dropped. Logged, never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RejectReason {
    EmptyContent,
    ContentTooLarge,
    ImageTooLarge,
    ExcludedApp,
}

pub(crate) struct CaptureFilter {
    max_content_bytes: usize,
    max_image_bytes: usize,
    excluded_apps: HashSet<String>,
}

impl CaptureFilter {
    pub fn new(config: &Config) -> Self {
        Self {
            max_content_bytes: config.max_content_bytes,
            max_image_bytes: config.max_image_bytes,
            excluded_apps: config.excluded_apps.iter().cloned().collect(),
        }
    }

    /// Accept or silently drop a payload.
    pub fn accept(&self, payload: &CapturedPayload) -> bool {
        match self.check(payload) {
            None => true,
            Some(reason) => {
                debug!(
                    ?reason,
                    kind = ?payload.kind,
                    source_app = payload.source_app.as_deref(),
                    "payload dropped by capture filter"
                );
                false
            }
        }
    }

    fn check(&self, payload: &CapturedPayload) -> Option<RejectReason> {
        // The exclusion list matches either the app name or its identifier.
        if let Some(app) = &payload.source_app {
            if self.excluded_apps.contains(app) {
                return Some(RejectReason::ExcludedApp);
            }
        }
        if let Some(id) = &payload.source_app_id {
            if self.excluded_apps.contains(id) {
                return Some(RejectReason::ExcludedApp);
            }
        }
        if payload.kind == EntryKind::Image {
            let len = payload.image_len();
            if len == 0 {
                return Some(RejectReason::EmptyContent);
            }
            if len > self.max_image_bytes {
                return Some(RejectReason::ImageTooLarge);
            }
        } else if payload.content.is_empty() {
            return Some(RejectReason::EmptyContent);
        }
        if payload.content.len() > self.max_content_bytes {
            return Some(RejectReason::ContentTooLarge);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(config: Config) -> CaptureFilter {
        CaptureFilter::new(&config)
    }

    fn text(content: &str) -> CapturedPayload {
        CapturedPayload::new_text(content.to_string(), None, None, None)
    }

    #[test]
    fn test_accepts_ordinary_text() {
        let filter = filter_with(Config::default());
        assert!(filter.accept(&text("hello")));
    }

    #[test]
    fn test_rejects_empty_content() {
        let filter = filter_with(Config::default());
        assert!(!filter.accept(&text("")));
    }

    #[test]
    fn test_rejects_content_over_ceiling() {
        let config = Config {
            max_content_bytes: 16,
            ..Default::default()
        };
        let filter = filter_with(config);
        assert!(filter.accept(&text("exactly 16 chars")));
        assert!(!filter.accept(&text("definitely longer than sixteen")));
    }

    #[test]
    fn test_rejects_image_over_ceiling() {
        let config = Config {
            max_image_bytes: 8,
            ..Default::default()
        };
        let filter = filter_with(config);
        let small = CapturedPayload::new_image(vec![0u8; 8], None, None);
        let large = CapturedPayload::new_image(vec![0u8; 9], None, None);
        assert!(filter.accept(&small));
        assert!(!filter.accept(&large));
    }

    #[test]
    fn test_rejects_empty_image() {
        let filter = filter_with(Config::default());
        let payload = CapturedPayload::new_image(Vec::new(), None, None);
        assert!(!filter.accept(&payload));
    }

    #[test]
    fn test_rejects_excluded_app_by_name() {
        let filter = filter_with(Config::default());
        let payload = CapturedPayload::new_text(
            "hunter2".to_string(),
            None,
            Some("1Password".to_string()),
            None,
        );
        assert!(!filter.accept(&payload));
    }

    #[test]
    fn test_rejects_excluded_app_by_identifier() {
        let config = Config {
            excluded_apps: vec!["com.example.vault".to_string()],
            ..Default::default()
        };
        let filter = filter_with(config);
        let payload = CapturedPayload::new_text(
            "secret".to_string(),
            None,
            Some("Vault".to_string()),
            Some("com.example.vault".to_string()),
        );
        assert!(!filter.accept(&payload));
    }

    #[test]
    fn test_unlisted_app_passes() {
        let filter = filter_with(Config::default());
        let payload = CapturedPayload::new_text(
            "fine".to_string(),
            None,
            Some("Safari".to_string()),
            Some("com.apple.Safari".to_string()),
        );
        assert!(filter.accept(&payload));
    }
}
