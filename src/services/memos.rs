use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{BookPatch, InsightMemo, MemoPatch, NewMemo};
use crate::remote::Remote;
use crate::store::EntityStore;

use super::required;

/// Single-shot undo token for a deleted memo. Valid until `deadline`
/// (the lifetime of the delete notification); after that, undoing is a
/// silent no-op. The restored memo gets a fresh id and `created_at`.
#[derive(Debug)]
pub struct MemoUndo {
    original: InsightMemo,
    deadline: Instant,
}

impl MemoUndo {
    pub fn memo(&self) -> &InsightMemo {
        &self.original
    }

    pub fn expires_at(&self) -> Instant {
        self.deadline
    }

    pub fn expired(&self) -> bool {
        Instant::now() > self.deadline
    }
}

pub struct MemoService<R> {
    remote: Arc<R>,
    undo_window: Duration,
}

impl<R: Remote> MemoService<R> {
    pub fn new(remote: Arc<R>, undo_window: Duration) -> Self {
        Self {
            remote,
            undo_window,
        }
    }

    /// Create a memo, prepend it to the list, bump the owning book's
    /// `memo_count` and stamp `last_memo_at`.
    pub async fn add_memo(&self, store: &mut EntityStore, new: NewMemo) -> Result<InsightMemo> {
        let content = required("content", &new.content)?;
        let book = store.book(&new.book_id).ok_or(AppError::NotFound("book"))?;
        let prev_count = book.memo_count;
        let prev_last = book.last_memo_at;

        let memo = self
            .remote
            .create_memo(NewMemo {
                book_id: new.book_id,
                memo_type: new.memo_type,
                content,
                source_page: new.source_page,
                pinned: new.pinned,
            })
            .await?;

        let now = Utc::now();
        store.insert_memo_front(memo.clone());
        if let Some(b) = store.book_mut(&memo.book_id) {
            b.memo_count = prev_count + 1;
            b.last_memo_at = Some(now);
        }

        let patch = BookPatch {
            memo_count: Some(prev_count + 1),
            last_memo_at: Some(Some(now)),
            ..Default::default()
        };
        match self.remote.update_book(&memo.book_id, patch).await {
            Ok(_) => {
                tracing::info!(memo = %memo.id, book = %memo.book_id, "memo added");
                Ok(memo)
            }
            Err(err) => {
                store.remove_memo(&memo.id);
                if let Some(b) = store.book_mut(&memo.book_id) {
                    b.memo_count = prev_count;
                    b.last_memo_at = prev_last;
                }
                tracing::warn!(memo = %memo.id, error = %err, "memo add rolled back");
                Err(err)
            }
        }
    }

    /// Edit a memo's content, type or source page in place.
    pub async fn update_memo(
        &self,
        store: &mut EntityStore,
        memo_id: &str,
        patch: MemoPatch,
    ) -> Result<()> {
        if let Some(content) = &patch.content {
            required("content", content)?;
        }
        let snapshot = store
            .memo(memo_id)
            .cloned()
            .ok_or(AppError::NotFound("memo"))?;

        if let Some(memo) = store.memo_mut(memo_id) {
            if let Some(memo_type) = patch.memo_type {
                memo.memo_type = memo_type;
            }
            if let Some(content) = &patch.content {
                memo.content = content.trim().to_string();
            }
            if let Some(source_page) = &patch.source_page {
                memo.source_page = Some(source_page.clone());
            }
            if let Some(pinned) = patch.pinned {
                memo.pinned = pinned;
            }
        }

        match self.remote.update_memo(memo_id, patch).await {
            Ok(_) => Ok(()),
            Err(err) => {
                if let Some(memo) = store.memo_mut(memo_id) {
                    *memo = snapshot;
                }
                tracing::warn!(memo = %memo_id, error = %err, "memo update rolled back");
                Err(err)
            }
        }
    }

    /// Flip a memo's pinned flag. Ordering is derived at view time, so no
    /// stored re-sort is needed. Returns the new pinned value.
    pub async fn toggle_pin(&self, store: &mut EntityStore, memo_id: &str) -> Result<bool> {
        let pinned = store
            .memo(memo_id)
            .ok_or(AppError::NotFound("memo"))?
            .pinned;
        let new_pinned = !pinned;
        if let Some(memo) = store.memo_mut(memo_id) {
            memo.pinned = new_pinned;
        }

        let patch = MemoPatch {
            pinned: Some(new_pinned),
            ..Default::default()
        };
        match self.remote.update_memo(memo_id, patch).await {
            Ok(_) => Ok(new_pinned),
            Err(err) => {
                if let Some(memo) = store.memo_mut(memo_id) {
                    memo.pinned = pinned;
                }
                tracing::warn!(memo = %memo_id, error = %err, "pin toggle rolled back");
                Err(err)
            }
        }
    }

    /// Delete a memo and decrement the owning book's `memo_count`
    /// (floored at zero). Returns the undo token; its window starts now.
    pub async fn delete_memo(&self, store: &mut EntityStore, memo_id: &str) -> Result<MemoUndo> {
        let Some(memo) = store.remove_memo(memo_id) else {
            return Err(AppError::NotFound("memo"));
        };
        let prev_count = store
            .book(&memo.book_id)
            .map(|b| b.memo_count)
            .unwrap_or(0);
        let next_count = (prev_count - 1).max(0);
        if let Some(b) = store.book_mut(&memo.book_id) {
            b.memo_count = next_count;
        }

        let result: Result<()> = async {
            self.remote.delete_memo(memo_id).await?;
            let patch = BookPatch {
                memo_count: Some(next_count),
                ..Default::default()
            };
            self.remote.update_book(&memo.book_id, patch).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(memo = %memo_id, "memo deleted");
                Ok(MemoUndo {
                    original: memo,
                    deadline: Instant::now() + self.undo_window,
                })
            }
            Err(err) => {
                if let Some(b) = store.book_mut(&memo.book_id) {
                    b.memo_count = prev_count;
                }
                store.insert_memo_front(memo);
                tracing::warn!(memo = %memo_id, error = %err, "memo delete rolled back");
                Err(err)
            }
        }
    }

    /// Restore a deleted memo from its undo token. Past the deadline this
    /// is a silent no-op (`Ok(None)`). The recreated memo is equivalent in
    /// type, content, source page and pinned state but carries a new
    /// identity and creation time.
    pub async fn undo_delete(
        &self,
        store: &mut EntityStore,
        undo: MemoUndo,
    ) -> Result<Option<InsightMemo>> {
        if undo.expired() {
            tracing::debug!(memo = %undo.original.id, "memo undo window expired");
            return Ok(None);
        }

        let original = undo.original;
        let restored = self
            .remote
            .create_memo(NewMemo {
                book_id: original.book_id.clone(),
                memo_type: original.memo_type,
                content: original.content.clone(),
                source_page: original.source_page.clone(),
                pinned: original.pinned,
            })
            .await?;

        let prev_count = store
            .book(&restored.book_id)
            .map(|b| b.memo_count)
            .unwrap_or(0);
        store.insert_memo_front(restored.clone());
        if let Some(b) = store.book_mut(&restored.book_id) {
            b.memo_count = prev_count + 1;
        }

        let patch = BookPatch {
            memo_count: Some(prev_count + 1),
            ..Default::default()
        };
        match self.remote.update_book(&restored.book_id, patch).await {
            Ok(_) => {
                tracing::info!(memo = %restored.id, "memo restored");
                Ok(Some(restored))
            }
            Err(err) => {
                store.remove_memo(&restored.id);
                if let Some(b) = store.book_mut(&restored.book_id) {
                    b.memo_count = prev_count;
                }
                tracing::warn!(error = %err, "memo undo rolled back");
                Err(err)
            }
        }
    }
}
