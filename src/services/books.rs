use std::sync::Arc;

use futures::future::{join_all, BoxFuture};

use crate::error::{AppError, Result};
use crate::models::{Book, BookPatch, BookStatus, NewBook, NewBookTag};
use crate::remote::{BookTagFilter, Remote};
use crate::store::EntityStore;

use super::required;

/// Sentinel drop id for the folderless root of the active status bucket.
pub const ROOT_DROP_ID: &str = "root";

/// Where a dragged book card was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Root,
    Folder(String),
}

/// Map a raw drop id to a target. Unknown ids (neither the root sentinel
/// nor a known folder) are rejected with `None` and the drop is ignored.
pub fn resolve_drop_target(store: &EntityStore, raw: &str) -> Option<DropTarget> {
    if raw == ROOT_DROP_ID {
        return Some(DropTarget::Root);
    }
    store.folder(raw).map(|f| DropTarget::Folder(f.id.clone()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The book was already there; no remote call, no store mutation.
    NoOp,
}

/// Remote side of a book cascade: delete every memo and join row of the
/// book (concurrently, all-or-error), then the book record itself.
/// Partial failure leaves remote state unreconciled; the caller reports
/// one generic failure.
pub(crate) async fn cascade_delete_book_remote<R: Remote>(remote: &R, book_id: &str) -> Result<()> {
    let (memos, links) = futures::try_join!(
        remote.list_memos(Some(book_id)),
        remote.list_book_tags(BookTagFilter::by_book(book_id)),
    )?;

    let mut deletes: Vec<BoxFuture<'_, Result<()>>> = Vec::new();
    for memo in &memos {
        deletes.push(remote.delete_memo(&memo.id));
    }
    for link in &links {
        deletes.push(remote.delete_book_tag(&link.id));
    }
    for result in join_all(deletes).await {
        result?;
    }

    remote.delete_book(book_id).await
}

pub struct BookService<R> {
    remote: Arc<R>,
}

impl<R: Remote> BookService<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    /// Create a book and link it to the selected tags (deduplicated, so a
    /// tag picked twice never yields two join rows). The backend assigns
    /// the id, so creation is remote-first; the store is only updated once
    /// every call succeeded.
    pub async fn add_book(
        &self,
        store: &mut EntityStore,
        new: NewBook,
        tag_ids: &[String],
    ) -> Result<Book> {
        let title = required("title", &new.title)?;
        let author = new
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from);

        let book = self
            .remote
            .create_book(NewBook {
                title,
                author,
                status: new.status,
            })
            .await?;

        let mut distinct: Vec<&str> = Vec::new();
        for tag_id in tag_ids {
            if !distinct.contains(&tag_id.as_str()) {
                distinct.push(tag_id);
            }
        }
        let creates = distinct.iter().map(|tag_id| {
            self.remote.create_book_tag(NewBookTag {
                book_id: book.id.clone(),
                tag_id: (*tag_id).to_string(),
            })
        });
        let mut links = Vec::with_capacity(distinct.len());
        for result in join_all(creates).await {
            links.push(result?);
        }

        store.insert_book(book.clone());
        for link in links {
            store.insert_book_tag(link);
        }
        tracing::info!(book = %book.id, "book added");
        Ok(book)
    }

    /// Change a book's status. A book cannot stay in a status-specific
    /// folder after crossing buckets: if it sits in a folder whose status
    /// differs from the new one, it is evicted to the new bucket's root
    /// in the same update.
    pub async fn change_status(
        &self,
        store: &mut EntityStore,
        book_id: &str,
        new_status: BookStatus,
    ) -> Result<()> {
        let book = store.book(book_id).ok_or(AppError::NotFound("book"))?;
        let prev_status = book.status;
        let prev_folder = book.folder_id.clone();
        let evict = prev_folder
            .as_deref()
            .and_then(|folder_id| store.folder(folder_id))
            .is_some_and(|folder| folder.status != new_status);

        if let Some(b) = store.book_mut(book_id) {
            b.status = new_status;
            if evict {
                b.folder_id = None;
            }
        }

        let patch = BookPatch {
            status: Some(new_status),
            folder_id: if evict { Some(None) } else { None },
            ..Default::default()
        };
        match self.remote.update_book(book_id, patch).await {
            Ok(_) => {
                tracing::info!(book = %book_id, status = %new_status, evicted = evict, "status changed");
                Ok(())
            }
            Err(err) => {
                if let Some(b) = store.book_mut(book_id) {
                    b.status = prev_status;
                    b.folder_id = prev_folder;
                }
                tracing::warn!(book = %book_id, error = %err, "status change rolled back");
                Err(err)
            }
        }
    }

    /// Drag-and-drop move. Dropping a book where it already is produces
    /// zero remote calls and zero store mutation.
    pub async fn move_to_folder(
        &self,
        store: &mut EntityStore,
        book_id: &str,
        target: DropTarget,
    ) -> Result<MoveOutcome> {
        let book = store.book(book_id).ok_or(AppError::NotFound("book"))?;
        let new_folder = match &target {
            DropTarget::Root => None,
            DropTarget::Folder(id) => Some(id.clone()),
        };
        if book.folder_id == new_folder {
            return Ok(MoveOutcome::NoOp);
        }

        let prev_folder = book.folder_id.clone();
        if let Some(b) = store.book_mut(book_id) {
            b.folder_id = new_folder.clone();
        }

        let patch = BookPatch {
            folder_id: Some(new_folder),
            ..Default::default()
        };
        match self.remote.update_book(book_id, patch).await {
            Ok(_) => {
                tracing::info!(book = %book_id, "book moved");
                Ok(MoveOutcome::Moved)
            }
            Err(err) => {
                if let Some(b) = store.book_mut(book_id) {
                    b.folder_id = prev_folder;
                }
                tracing::warn!(book = %book_id, error = %err, "move rolled back");
                Err(err)
            }
        }
    }

    /// Delete a book with its full cascade (memos, tag links, then the
    /// record). Not undo-able; the caller is responsible for confirming
    /// with the user first.
    pub async fn delete_book(&self, store: &mut EntityStore, book_id: &str) -> Result<()> {
        let Some(book) = store.remove_book(book_id) else {
            return Err(AppError::NotFound("book"));
        };
        let memos = store.remove_memos_for_book(book_id);
        let links = store.remove_book_tags_for_book(book_id);

        match cascade_delete_book_remote(self.remote.as_ref(), book_id).await {
            Ok(()) => {
                tracing::info!(book = %book_id, "book deleted");
                Ok(())
            }
            Err(err) => {
                store.insert_book(book);
                for memo in memos.into_iter().rev() {
                    store.insert_memo_front(memo);
                }
                for link in links {
                    store.insert_book_tag(link);
                }
                tracing::warn!(book = %book_id, error = %err, "book delete rolled back");
                Err(err)
            }
        }
    }
}
