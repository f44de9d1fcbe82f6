//! Client-side cache of the five entity collections.
//!
//! The store is a plain container: no interior mutability, no locking.
//! Services borrow it mutably per call, which means two overlapping
//! in-flight mutations against the same record are not serialized.
//! Callers that need per-record ordering must provide it themselves.

use futures::try_join;

use crate::error::Result;
use crate::models::{Book, BookTag, Folder, InsightMemo, Tag};
use crate::remote::{BookTagFilter, Remote};

#[derive(Debug, Default)]
pub struct EntityStore {
    books: Vec<Book>,
    folders: Vec<Folder>,
    tags: Vec<Tag>,
    book_tags: Vec<BookTag>,
    memos: Vec<InsightMemo>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate every collection with bulk list fetches, issued
    /// concurrently. A failure of any fetch fails the whole load.
    pub async fn load<R: Remote>(remote: &R) -> Result<Self> {
        let (books, folders, tags, book_tags, memos) = try_join!(
            remote.list_books(),
            remote.list_folders(),
            remote.list_tags(),
            remote.list_book_tags(BookTagFilter::default()),
            remote.list_memos(None),
        )?;
        Ok(Self {
            books,
            folders,
            tags,
            book_tags,
            memos,
        })
    }

    // ── books ──────────────────────────────────────────────────────────

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn book_mut(&mut self, id: &str) -> Option<&mut Book> {
        self.books.iter_mut().find(|b| b.id == id)
    }

    pub fn insert_book(&mut self, book: Book) {
        self.books.push(book);
    }

    pub fn remove_book(&mut self, id: &str) -> Option<Book> {
        let index = self.books.iter().position(|b| b.id == id)?;
        Some(self.books.remove(index))
    }

    // ── folders ────────────────────────────────────────────────────────

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn folder_mut(&mut self, id: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.id == id)
    }

    pub fn insert_folder(&mut self, folder: Folder) {
        self.folders.push(folder);
    }

    pub fn remove_folder(&mut self, id: &str) -> Option<Folder> {
        let index = self.folders.iter().position(|f| f.id == id)?;
        Some(self.folders.remove(index))
    }

    // ── tags ───────────────────────────────────────────────────────────

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tag(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub fn insert_tag(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    pub fn remove_tag(&mut self, id: &str) -> Option<Tag> {
        let index = self.tags.iter().position(|t| t.id == id)?;
        Some(self.tags.remove(index))
    }

    // ── book/tag links ─────────────────────────────────────────────────

    pub fn book_tags(&self) -> &[BookTag] {
        &self.book_tags
    }

    pub fn book_tags_for_book<'a>(
        &'a self,
        book_id: &'a str,
    ) -> impl Iterator<Item = &'a BookTag> + 'a {
        self.book_tags.iter().filter(move |row| row.book_id == book_id)
    }

    pub fn insert_book_tag(&mut self, row: BookTag) {
        self.book_tags.push(row);
    }

    pub fn remove_book_tag(&mut self, id: &str) -> Option<BookTag> {
        let index = self.book_tags.iter().position(|row| row.id == id)?;
        Some(self.book_tags.remove(index))
    }

    pub fn remove_book_tags_for_book(&mut self, book_id: &str) -> Vec<BookTag> {
        let (removed, kept) = std::mem::take(&mut self.book_tags)
            .into_iter()
            .partition(|row| row.book_id == book_id);
        self.book_tags = kept;
        removed
    }

    pub fn remove_book_tags_for_tag(&mut self, tag_id: &str) -> Vec<BookTag> {
        let (removed, kept) = std::mem::take(&mut self.book_tags)
            .into_iter()
            .partition(|row| row.tag_id == tag_id);
        self.book_tags = kept;
        removed
    }

    // ── memos ──────────────────────────────────────────────────────────

    pub fn memos(&self) -> &[InsightMemo] {
        &self.memos
    }

    pub fn memo(&self, id: &str) -> Option<&InsightMemo> {
        self.memos.iter().find(|m| m.id == id)
    }

    pub fn memo_mut(&mut self, id: &str) -> Option<&mut InsightMemo> {
        self.memos.iter_mut().find(|m| m.id == id)
    }

    /// New memos go to the front, matching the newest-first detail view.
    pub fn insert_memo_front(&mut self, memo: InsightMemo) {
        self.memos.insert(0, memo);
    }

    pub fn remove_memo(&mut self, id: &str) -> Option<InsightMemo> {
        let index = self.memos.iter().position(|m| m.id == id)?;
        Some(self.memos.remove(index))
    }

    pub fn remove_memos_for_book(&mut self, book_id: &str) -> Vec<InsightMemo> {
        let (removed, kept) = std::mem::take(&mut self.memos)
            .into_iter()
            .partition(|m| m.book_id == book_id);
        self.memos = kept;
        removed
    }
}
