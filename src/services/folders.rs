use std::sync::Arc;

use futures::future::join_all;

use crate::error::{AppError, Result};
use crate::models::{Folder, FolderPatch, NewFolder, FOLDER_COLORS};
use crate::remote::Remote;
use crate::store::EntityStore;
use crate::views::folder_book_count;

use super::books::cascade_delete_book_remote;
use super::required;

/// What a folder delete confirmation must show: the folder and the exact
/// live count of books that will go with it.
#[derive(Debug, Clone)]
pub struct FolderDeletePlan {
    pub folder: Folder,
    pub book_count: usize,
}

pub struct FolderService<R> {
    remote: Arc<R>,
}

impl<R: Remote> FolderService<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    /// Create a folder in a status bucket with a palette color (defaults
    /// to the first palette entry).
    pub async fn create_folder(&self, store: &mut EntityStore, new: NewFolder) -> Result<Folder> {
        let name = required("name", &new.name)?;
        let color = new.color.or_else(|| Some(FOLDER_COLORS[0].to_string()));
        let folder = self
            .remote
            .create_folder(NewFolder {
                name,
                status: new.status,
                color,
            })
            .await?;
        store.insert_folder(folder.clone());
        tracing::info!(folder = %folder.id, "folder created");
        Ok(folder)
    }

    pub async fn update_folder(
        &self,
        store: &mut EntityStore,
        folder_id: &str,
        patch: FolderPatch,
    ) -> Result<()> {
        if let Some(name) = &patch.name {
            required("name", name)?;
        }
        let snapshot = store
            .folder(folder_id)
            .cloned()
            .ok_or(AppError::NotFound("folder"))?;

        if let Some(folder) = store.folder_mut(folder_id) {
            if let Some(name) = &patch.name {
                folder.name = name.trim().to_string();
            }
            if let Some(status) = patch.status {
                folder.status = status;
            }
            if let Some(color) = &patch.color {
                folder.color = Some(color.clone());
            }
        }

        match self.remote.update_folder(folder_id, patch).await {
            Ok(_) => Ok(()),
            Err(err) => {
                if let Some(folder) = store.folder_mut(folder_id) {
                    *folder = snapshot;
                }
                tracing::warn!(folder = %folder_id, error = %err, "folder update rolled back");
                Err(err)
            }
        }
    }

    /// Compute the confirmation data for a destructive folder delete.
    pub fn delete_plan(&self, store: &EntityStore, folder_id: &str) -> Result<FolderDeletePlan> {
        let folder = store
            .folder(folder_id)
            .cloned()
            .ok_or(AppError::NotFound("folder"))?;
        let book_count = folder_book_count(store, folder_id);
        Ok(FolderDeletePlan { folder, book_count })
    }

    /// Delete a folder and every book it contains, each book with its own
    /// full cascade. The cascades run concurrently; the folder record goes
    /// last. This is a destructive batch: a partial remote failure rolls
    /// back the local state but does not reconcile which remote deletes
    /// already committed.
    pub async fn delete_folder(&self, store: &mut EntityStore, folder_id: &str) -> Result<()> {
        let Some(folder) = store.remove_folder(folder_id) else {
            return Err(AppError::NotFound("folder"));
        };

        let book_ids: Vec<String> = store
            .books()
            .iter()
            .filter(|b| b.folder_id.as_deref() == Some(folder_id))
            .map(|b| b.id.clone())
            .collect();

        let mut removed_books = Vec::with_capacity(book_ids.len());
        let mut removed_memos = Vec::new();
        let mut removed_links = Vec::new();
        for book_id in &book_ids {
            if let Some(book) = store.remove_book(book_id) {
                removed_books.push(book);
            }
            removed_memos.extend(store.remove_memos_for_book(book_id));
            removed_links.extend(store.remove_book_tags_for_book(book_id));
        }

        let result: Result<()> = async {
            let cascades = book_ids
                .iter()
                .map(|book_id| cascade_delete_book_remote(self.remote.as_ref(), book_id));
            for cascade in join_all(cascades).await {
                cascade?;
            }
            self.remote.delete_folder(folder_id).await
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(folder = %folder_id, books = book_ids.len(), "folder deleted");
                Ok(())
            }
            Err(err) => {
                store.insert_folder(folder);
                for book in removed_books {
                    store.insert_book(book);
                }
                for memo in removed_memos.into_iter().rev() {
                    store.insert_memo_front(memo);
                }
                for link in removed_links {
                    store.insert_book_tag(link);
                }
                tracing::warn!(folder = %folder_id, error = %err, "folder delete rolled back");
                Err(err)
            }
        }
    }
}
