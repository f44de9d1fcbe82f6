//! Abstraction over the managed data backend.
//!
//! One trait per entity, each offering get / list / create / update /
//! delete. The backend owns identity and timestamps: `create` takes a
//! `New*` value and returns the full record. `list` only supports simple
//! equality filters; joins, search and sorting are all client-side.
//!
//! The [`Remote`] supertrait bundles the five entity traits so services
//! can take a single generic bound.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Book, BookPatch, BookTag, Folder, FolderPatch, InsightMemo, MemoPatch, NewBook, NewBookTag,
    NewFolder, NewMemo, NewTag, Tag,
};

pub use memory::MemoryRemote;

/// Equality predicates for listing book/tag join rows.
#[derive(Debug, Clone, Default)]
pub struct BookTagFilter {
    pub book_id: Option<String>,
    pub tag_id: Option<String>,
}

impl BookTagFilter {
    pub fn by_book(book_id: impl Into<String>) -> Self {
        Self {
            book_id: Some(book_id.into()),
            tag_id: None,
        }
    }

    pub fn by_tag(tag_id: impl Into<String>) -> Self {
        Self {
            book_id: None,
            tag_id: Some(tag_id.into()),
        }
    }

    pub fn matches(&self, row: &BookTag) -> bool {
        self.book_id.as_deref().is_none_or(|id| row.book_id == id)
            && self.tag_id.as_deref().is_none_or(|id| row.tag_id == id)
    }
}

#[async_trait]
pub trait BookRemote: Send + Sync {
    async fn get_book(&self, id: &str) -> Result<Option<Book>>;
    async fn list_books(&self) -> Result<Vec<Book>>;
    async fn create_book(&self, new: NewBook) -> Result<Book>;
    async fn update_book(&self, id: &str, patch: BookPatch) -> Result<Book>;
    async fn delete_book(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait FolderRemote: Send + Sync {
    async fn get_folder(&self, id: &str) -> Result<Option<Folder>>;
    async fn list_folders(&self) -> Result<Vec<Folder>>;
    async fn create_folder(&self, new: NewFolder) -> Result<Folder>;
    async fn update_folder(&self, id: &str, patch: FolderPatch) -> Result<Folder>;
    async fn delete_folder(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait TagRemote: Send + Sync {
    async fn get_tag(&self, id: &str) -> Result<Option<Tag>>;
    async fn list_tags(&self) -> Result<Vec<Tag>>;
    async fn create_tag(&self, new: NewTag) -> Result<Tag>;
    async fn delete_tag(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait BookTagRemote: Send + Sync {
    async fn list_book_tags(&self, filter: BookTagFilter) -> Result<Vec<BookTag>>;
    async fn create_book_tag(&self, new: NewBookTag) -> Result<BookTag>;
    async fn delete_book_tag(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait MemoRemote: Send + Sync {
    async fn get_memo(&self, id: &str) -> Result<Option<InsightMemo>>;
    /// `book_id` is the only filter the backend supports for memos.
    async fn list_memos(&self, book_id: Option<&str>) -> Result<Vec<InsightMemo>>;
    async fn create_memo(&self, new: NewMemo) -> Result<InsightMemo>;
    async fn update_memo(&self, id: &str, patch: MemoPatch) -> Result<InsightMemo>;
    async fn delete_memo(&self, id: &str) -> Result<()>;
}

/// The full backend surface the mutation coordinator depends on.
pub trait Remote:
    BookRemote + FolderRemote + TagRemote + BookTagRemote + MemoRemote
{
}

impl<T> Remote for T where T: BookRemote + FolderRemote + TagRemote + BookTagRemote + MemoRemote {}
