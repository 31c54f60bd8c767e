//! Category predicates, ordering, and pagination over fast-tier entries.

use std::cmp::Ordering;

use crate::interface::{Category, Entry, EntryKind, SortOption};

pub(crate) fn matches_category(entry: &Entry, category: Category) -> bool {
    match category {
        Category::History => true,
        Category::Favorites => entry.is_favorite,
        Category::Text => entry.kind == EntryKind::Text,
        Category::Images => entry.kind == EntryKind::Image,
        Category::Links => entry.kind == EntryKind::Link,
        Category::Files => entry.kind == EntryKind::File,
        Category::Emails => entry.kind == EntryKind::Email,
    }
}

/// Natural-direction comparator for one sort option, with id as the final
/// tie-break so the ordering is total and reversal is exact. The tie-break
/// follows the option's direction: ascending orders break ties by lowest
/// id (insertion order), descending ones by highest.
fn natural_cmp(a: &Entry, b: &Entry, option: SortOption) -> Ordering {
    let primary = match option {
        SortOption::LastCopyTime => b.last_copy_time.cmp(&a.last_copy_time),
        SortOption::FirstCopyTime => a.first_copy_time.cmp(&b.first_copy_time),
        SortOption::CopyCount => b.copy_count.cmp(&a.copy_count),
        SortOption::ByteSize => b.byte_size().cmp(&a.byte_size()),
    };
    primary.then_with(|| match option {
        SortOption::FirstCopyTime => a.id.cmp(&b.id),
        _ => b.id.cmp(&a.id),
    })
}

/// Sort in place. `reversed` produces the exact reverse of the natural
/// order, ties included.
pub(crate) fn sort_entries(entries: &mut [Entry], option: SortOption, reversed: bool) {
    entries.sort_by(|a, b| natural_cmp(a, b, option));
    if reversed {
        entries.reverse();
    }
}

/// One page of at most `page_size` entries starting at `offset`.
pub(crate) fn page(entries: Vec<Entry>, offset: usize, page_size: usize) -> Vec<Entry> {
    entries.into_iter().skip(offset).take(page_size).collect()
}
