//! Derived view engine: pure functions from the entity store to what the
//! shelf and detail screens display.
//!
//! Nothing here fails and nothing here caches. Every function recomputes
//! from the current store; memoization is the caller's concern.

use serde::Serialize;

use crate::models::{Book, BookStatus, Folder, InsightMemo, MemoType};
use crate::store::EntityStore;

/// UI filter state for the shelf view.
#[derive(Debug, Clone)]
pub struct ShelfFilter {
    pub active_status: BookStatus,
    /// `Some(folder_id)` while a folder is open.
    pub open_folder: Option<String>,
    pub search: String,
    pub selected_tag: Option<String>,
}

impl ShelfFilter {
    pub fn new(active_status: BookStatus) -> Self {
        Self {
            active_status,
            open_folder: None,
            search: String::new(),
            selected_tag: None,
        }
    }
}

/// Global per-status book counts. Always computed over the whole
/// collection, never over the filtered subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub to_read: usize,
    pub reading: usize,
    pub read: usize,
}

impl StatusCounts {
    pub fn get(&self, status: BookStatus) -> usize {
        match status {
            BookStatus::ToRead => self.to_read,
            BookStatus::Reading => self.reading,
            BookStatus::Read => self.read,
        }
    }
}

pub fn status_counts(store: &EntityStore) -> StatusCounts {
    let count = |status| {
        store
            .books()
            .iter()
            .filter(|b| b.status == status)
            .count()
    };
    StatusCounts {
        to_read: count(BookStatus::ToRead),
        reading: count(BookStatus::Reading),
        read: count(BookStatus::Read),
    }
}

/// Folders shown on the shelf: only at the root level (folders never
/// nest), only those in the active status bucket.
pub fn visible_folders<'a>(store: &'a EntityStore, filter: &ShelfFilter) -> Vec<&'a Folder> {
    if filter.open_folder.is_some() {
        return Vec::new();
    }
    store
        .folders()
        .iter()
        .filter(|f| f.status == filter.active_status)
        .collect()
}

/// Books shown on the shelf. Narrowing order is fixed: status, then
/// folder scope, then search, then tag — search and tag apply within the
/// status+folder scope, not globally.
pub fn visible_books<'a>(store: &'a EntityStore, filter: &ShelfFilter) -> Vec<&'a Book> {
    let mut result: Vec<&Book> = store
        .books()
        .iter()
        .filter(|b| b.status == filter.active_status)
        .filter(|b| match &filter.open_folder {
            Some(folder_id) => b.folder_id.as_deref() == Some(folder_id.as_str()),
            None => b.folder_id.is_none(),
        })
        .collect();

    if !filter.search.is_empty() {
        let query = filter.search.to_lowercase();
        result.retain(|b| {
            b.title.to_lowercase().contains(&query)
                || b.author
                    .as_deref()
                    .is_some_and(|a| a.to_lowercase().contains(&query))
        });
    }

    if let Some(tag_id) = &filter.selected_tag {
        let tagged: std::collections::HashSet<&str> = store
            .book_tags()
            .iter()
            .filter(|row| &row.tag_id == tag_id)
            .map(|row| row.book_id.as_str())
            .collect();
        result.retain(|b| tagged.contains(b.id.as_str()));
    }

    result
}

/// Live membership count for a folder card. Never read from a stored
/// counter.
pub fn folder_book_count(store: &EntityStore, folder_id: &str) -> usize {
    store
        .books()
        .iter()
        .filter(|b| b.folder_id.as_deref() == Some(folder_id))
        .count()
}

/// Secondary filter on the memo list in the book detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoTypeFilter {
    #[default]
    All,
    Only(MemoType),
}

impl MemoTypeFilter {
    fn accepts(self, memo: &InsightMemo) -> bool {
        match self {
            MemoTypeFilter::All => true,
            MemoTypeFilter::Only(memo_type) => memo.memo_type == memo_type,
        }
    }
}

/// Memos for one book: pinned first (stable partition), newest first
/// inside each partition, then the type filter without reordering.
pub fn book_memos<'a>(
    store: &'a EntityStore,
    book_id: &str,
    filter: MemoTypeFilter,
) -> Vec<&'a InsightMemo> {
    let mut memos: Vec<&InsightMemo> = store
        .memos()
        .iter()
        .filter(|m| m.book_id == book_id)
        .collect();
    memos.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    memos.retain(|m| filter.accepts(m));
    memos
}
