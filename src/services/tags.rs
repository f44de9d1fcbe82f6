use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;

use crate::error::{AppError, Result};
use crate::models::{BookTag, NewBookTag, NewTag, Tag};
use crate::remote::{BookTagFilter, Remote};
use crate::store::EntityStore;
use crate::views::ShelfFilter;

use super::required;

pub struct TagService<R> {
    remote: Arc<R>,
}

impl<R: Remote> TagService<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    pub async fn create_tag(&self, store: &mut EntityStore, new: NewTag) -> Result<Tag> {
        let name = required("name", &new.name)?;
        let tag = self
            .remote
            .create_tag(NewTag {
                name,
                color: new.color,
            })
            .await?;
        store.insert_tag(tag.clone());
        tracing::info!(tag = %tag.id, "tag created");
        Ok(tag)
    }

    /// Delete a tag: its join rows go first (concurrently), then the tag
    /// record. If the tag was the active shelf selection, the selection is
    /// cleared — and restored should the delete roll back.
    pub async fn delete_tag(
        &self,
        store: &mut EntityStore,
        filter: &mut ShelfFilter,
        tag_id: &str,
    ) -> Result<()> {
        let Some(tag) = store.remove_tag(tag_id) else {
            return Err(AppError::NotFound("tag"));
        };
        let removed_links = store.remove_book_tags_for_tag(tag_id);
        let was_selected = filter.selected_tag.as_deref() == Some(tag_id);
        if was_selected {
            filter.selected_tag = None;
        }

        let result: Result<()> = async {
            let links = self
                .remote
                .list_book_tags(BookTagFilter::by_tag(tag_id))
                .await?;
            let deletes = links.iter().map(|link| self.remote.delete_book_tag(&link.id));
            for deleted in join_all(deletes).await {
                deleted?;
            }
            self.remote.delete_tag(tag_id).await
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(tag = %tag_id, "tag deleted");
                Ok(())
            }
            Err(err) => {
                store.insert_tag(tag);
                for link in removed_links {
                    store.insert_book_tag(link);
                }
                if was_selected {
                    filter.selected_tag = Some(tag_id.to_string());
                }
                tracing::warn!(tag = %tag_id, error = %err, "tag delete rolled back");
                Err(err)
            }
        }
    }

    /// Replace a book's tag set with `selected`: removed links are
    /// deleted, missing links created, all in one concurrent batch. The
    /// diff keeps `(book_id, tag_id)` pairs unique even if a tag id is
    /// passed twice.
    pub async fn sync_book_tags(
        &self,
        store: &mut EntityStore,
        book_id: &str,
        selected: &[String],
    ) -> Result<()> {
        store.book(book_id).ok_or(AppError::NotFound("book"))?;

        let current = self
            .remote
            .list_book_tags(BookTagFilter::by_book(book_id))
            .await?;

        let to_remove: Vec<&BookTag> = current
            .iter()
            .filter(|link| !selected.contains(&link.tag_id))
            .collect();
        let mut to_add: Vec<&str> = Vec::new();
        for tag_id in selected {
            let already_linked = current.iter().any(|link| &link.tag_id == tag_id);
            if !already_linked && !to_add.contains(&tag_id.as_str()) {
                to_add.push(tag_id);
            }
        }

        let mut ops: Vec<BoxFuture<'_, Result<Option<BookTag>>>> = Vec::new();
        for link in &to_remove {
            let fut = self.remote.delete_book_tag(&link.id);
            ops.push(async move { fut.await.map(|()| None) }.boxed());
        }
        for tag_id in &to_add {
            let new = NewBookTag {
                book_id: book_id.to_string(),
                tag_id: (*tag_id).to_string(),
            };
            ops.push(async move { self.remote.create_book_tag(new).await.map(Some) }.boxed());
        }

        let mut created = Vec::new();
        for result in join_all(ops).await {
            if let Some(link) = result? {
                created.push(link);
            }
        }

        for link in &to_remove {
            store.remove_book_tag(&link.id);
        }
        for link in created {
            store.insert_book_tag(link);
        }
        tracing::info!(book = %book_id, "book tags synced");
        Ok(())
    }
}
