//! In-memory backend used by tests and the demo binary.
//!
//! Behaves like the managed service as far as the core can tell: it
//! assigns uuid-v7 ids and timestamps, applies partial updates, and only
//! answers the equality filters the real backend supports. Deletes are
//! idempotent.
//!
//! Fault injection: [`MemoryRemote::fail_next`] makes the next *n* calls
//! fail with a remote error, and [`MemoryRemote::call_count`] exposes how
//! many calls were attempted, so tests can assert both rollback behavior
//! and "no remote call happened at all".

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Book, BookPatch, BookTag, Folder, FolderPatch, InsightMemo, MemoPatch, NewBook, NewBookTag,
    NewFolder, NewMemo, NewTag, Tag,
};

use super::{BookRemote, BookTagFilter, BookTagRemote, FolderRemote, MemoRemote, TagRemote};

#[derive(Default)]
struct Tables {
    books: Vec<Book>,
    folders: Vec<Folder>,
    tags: Vec<Tag>,
    book_tags: Vec<BookTag>,
    memos: Vec<InsightMemo>,
}

#[derive(Default)]
pub struct MemoryRemote {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
    failures_left: AtomicU32,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls fail with `AppError::Remote`.
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Total number of calls attempted, including injected failures.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(AppError::Remote("injected failure".into()));
        }
        Ok(())
    }

    fn new_id() -> String {
        Uuid::now_v7().to_string()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned lock means a panic in another test thread; propagating
        // the panic is fine here.
        self.tables.lock().unwrap()
    }
}

#[async_trait]
impl BookRemote for MemoryRemote {
    async fn get_book(&self, id: &str) -> Result<Option<Book>> {
        self.begin()?;
        Ok(self.lock().books.iter().find(|b| b.id == id).cloned())
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        self.begin()?;
        Ok(self.lock().books.clone())
    }

    async fn create_book(&self, new: NewBook) -> Result<Book> {
        self.begin()?;
        let now = Utc::now();
        let book = Book {
            id: Self::new_id(),
            title: new.title,
            author: new.author,
            status: new.status,
            memo_count: 0,
            last_memo_at: None,
            folder_id: None,
            created_at: now,
            updated_at: now,
        };
        self.lock().books.push(book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: &str, patch: BookPatch) -> Result<Book> {
        self.begin()?;
        let mut tables = self.lock();
        let book = tables
            .books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(AppError::NotFound("book"))?;
        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = Some(author);
        }
        if let Some(status) = patch.status {
            book.status = status;
        }
        if let Some(folder_id) = patch.folder_id {
            book.folder_id = folder_id;
        }
        if let Some(memo_count) = patch.memo_count {
            book.memo_count = memo_count;
        }
        if let Some(last_memo_at) = patch.last_memo_at {
            book.last_memo_at = last_memo_at;
        }
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn delete_book(&self, id: &str) -> Result<()> {
        self.begin()?;
        self.lock().books.retain(|b| b.id != id);
        Ok(())
    }
}

#[async_trait]
impl FolderRemote for MemoryRemote {
    async fn get_folder(&self, id: &str) -> Result<Option<Folder>> {
        self.begin()?;
        Ok(self.lock().folders.iter().find(|f| f.id == id).cloned())
    }

    async fn list_folders(&self) -> Result<Vec<Folder>> {
        self.begin()?;
        Ok(self.lock().folders.clone())
    }

    async fn create_folder(&self, new: NewFolder) -> Result<Folder> {
        self.begin()?;
        let now = Utc::now();
        let folder = Folder {
            id: Self::new_id(),
            name: new.name,
            status: new.status,
            color: new.color,
            created_at: now,
            updated_at: now,
        };
        self.lock().folders.push(folder.clone());
        Ok(folder)
    }

    async fn update_folder(&self, id: &str, patch: FolderPatch) -> Result<Folder> {
        self.begin()?;
        let mut tables = self.lock();
        let folder = tables
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(AppError::NotFound("folder"))?;
        if let Some(name) = patch.name {
            folder.name = name;
        }
        if let Some(status) = patch.status {
            folder.status = status;
        }
        if let Some(color) = patch.color {
            folder.color = Some(color);
        }
        folder.updated_at = Utc::now();
        Ok(folder.clone())
    }

    async fn delete_folder(&self, id: &str) -> Result<()> {
        self.begin()?;
        self.lock().folders.retain(|f| f.id != id);
        Ok(())
    }
}

#[async_trait]
impl TagRemote for MemoryRemote {
    async fn get_tag(&self, id: &str) -> Result<Option<Tag>> {
        self.begin()?;
        Ok(self.lock().tags.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.begin()?;
        Ok(self.lock().tags.clone())
    }

    async fn create_tag(&self, new: NewTag) -> Result<Tag> {
        self.begin()?;
        let now = Utc::now();
        let tag = Tag {
            id: Self::new_id(),
            name: new.name,
            color: new.color,
            created_at: now,
            updated_at: now,
        };
        self.lock().tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, id: &str) -> Result<()> {
        self.begin()?;
        self.lock().tags.retain(|t| t.id != id);
        Ok(())
    }
}

#[async_trait]
impl BookTagRemote for MemoryRemote {
    async fn list_book_tags(&self, filter: BookTagFilter) -> Result<Vec<BookTag>> {
        self.begin()?;
        Ok(self
            .lock()
            .book_tags
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }

    async fn create_book_tag(&self, new: NewBookTag) -> Result<BookTag> {
        self.begin()?;
        let now = Utc::now();
        let row = BookTag {
            id: Self::new_id(),
            book_id: new.book_id,
            tag_id: new.tag_id,
            created_at: now,
            updated_at: now,
        };
        self.lock().book_tags.push(row.clone());
        Ok(row)
    }

    async fn delete_book_tag(&self, id: &str) -> Result<()> {
        self.begin()?;
        self.lock().book_tags.retain(|row| row.id != id);
        Ok(())
    }
}

#[async_trait]
impl MemoRemote for MemoryRemote {
    async fn get_memo(&self, id: &str) -> Result<Option<InsightMemo>> {
        self.begin()?;
        Ok(self.lock().memos.iter().find(|m| m.id == id).cloned())
    }

    async fn list_memos(&self, book_id: Option<&str>) -> Result<Vec<InsightMemo>> {
        self.begin()?;
        Ok(self
            .lock()
            .memos
            .iter()
            .filter(|m| book_id.is_none_or(|id| m.book_id == id))
            .cloned()
            .collect())
    }

    async fn create_memo(&self, new: NewMemo) -> Result<InsightMemo> {
        self.begin()?;
        let now = Utc::now();
        let memo = InsightMemo {
            id: Self::new_id(),
            book_id: new.book_id,
            memo_type: new.memo_type,
            content: new.content,
            source_page: new.source_page,
            pinned: new.pinned,
            created_at: now,
            updated_at: now,
        };
        self.lock().memos.push(memo.clone());
        Ok(memo)
    }

    async fn update_memo(&self, id: &str, patch: MemoPatch) -> Result<InsightMemo> {
        self.begin()?;
        let mut tables = self.lock();
        let memo = tables
            .memos
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(AppError::NotFound("memo"))?;
        if let Some(memo_type) = patch.memo_type {
            memo.memo_type = memo_type;
        }
        if let Some(content) = patch.content {
            memo.content = content;
        }
        if let Some(source_page) = patch.source_page {
            memo.source_page = Some(source_page);
        }
        if let Some(pinned) = patch.pinned {
            memo.pinned = pinned;
        }
        memo.updated_at = Utc::now();
        Ok(memo.clone())
    }

    async fn delete_memo(&self, id: &str) -> Result<()> {
        self.begin()?;
        self.lock().memos.retain(|m| m.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookStatus, MemoType};

    #[tokio::test]
    async fn assigns_ids_and_counts_calls() {
        let remote = MemoryRemote::new();
        let book = remote
            .create_book(NewBook {
                title: "Dune".into(),
                author: None,
                status: BookStatus::ToRead,
            })
            .await
            .unwrap();
        assert!(!book.id.is_empty());
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_consume_then_clear() {
        let remote = MemoryRemote::new();
        remote.fail_next(1);
        assert!(remote.list_books().await.is_err());
        assert!(remote.list_books().await.is_ok());
    }

    #[tokio::test]
    async fn memo_list_filters_by_book() {
        let remote = MemoryRemote::new();
        for book_id in ["b1", "b2", "b1"] {
            remote
                .create_memo(NewMemo {
                    book_id: book_id.into(),
                    memo_type: MemoType::Quote,
                    content: "x".into(),
                    source_page: None,
                    pinned: false,
                })
                .await
                .unwrap();
        }
        let memos = remote.list_memos(Some("b1")).await.unwrap();
        assert_eq!(memos.len(), 2);
    }
}
