//! Retention sweep planning.
//!
//! Two policies applied in order: an age threshold, then a count cap.
//! Favorites are exempt from both. Planning is pure over the current entry
//! set; the store applies the resulting evictions.

use chrono::{DateTime, Duration, Utc};

use crate::interface::Entry;

/// Ids to evict under the given policy, oldest first.
///
/// The age pass drops every non-favorite whose `last_copy_time` is older
/// than `now - max_age`. The count pass then evicts the oldest remaining
/// non-favorites until the total (favorites included) fits `max_entries`.
/// A `None` age or a zero cap disables that policy.
pub(crate) fn plan_sweep<'a, I>(
    entries: I,
    now: DateTime<Utc>,
    max_age: Option<Duration>,
    max_entries: usize,
) -> Vec<i64>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut total = 0usize;
    let mut candidates: Vec<(DateTime<Utc>, i64)> = Vec::new();
    for entry in entries {
        total += 1;
        if entry.is_favorite {
            continue;
        }
        if let Some(id) = entry.id {
            candidates.push((entry.last_copy_time, id));
        }
    }
    // Oldest first, id as tie-break so equal timestamps evict the earliest
    // insert first.
    candidates.sort();

    let mut evict = Vec::new();
    let mut idx = 0;

    if let Some(age) = max_age {
        let cutoff = now - age;
        while idx < candidates.len() && candidates[idx].0 < cutoff {
            evict.push(candidates[idx].1);
            idx += 1;
        }
    }

    if max_entries > 0 {
        let mut remaining = total - evict.len();
        while remaining > max_entries && idx < candidates.len() {
            evict.push(candidates[idx].1);
            idx += 1;
            remaining -= 1;
        }
    }

    evict
}
