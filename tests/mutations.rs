//! End-to-end coordinator tests against the in-memory backend: the
//! optimistic-update/rollback contract, cascades, and the memo undo
//! window.

use std::sync::Arc;
use std::time::Duration;

use hondana::models::{BookStatus, MemoType, NewBook, NewFolder, NewMemo, NewTag};
use hondana::remote::{BookTagFilter, BookTagRemote, MemoRemote, MemoryRemote};
use hondana::services::{
    resolve_drop_target, BookService, DropTarget, FolderService, MemoService, MoveOutcome,
    TagService, ROOT_DROP_ID,
};
use hondana::views::{self, MemoTypeFilter, ShelfFilter};
use hondana::{AppError, EntityStore};

const UNDO_WINDOW: Duration = Duration::from_secs(60);

struct App {
    remote: Arc<MemoryRemote>,
    books: BookService<MemoryRemote>,
    folders: FolderService<MemoryRemote>,
    tags: TagService<MemoryRemote>,
    memos: MemoService<MemoryRemote>,
    store: EntityStore,
}

impl App {
    async fn new() -> Self {
        let remote = Arc::new(MemoryRemote::new());
        let store = EntityStore::load(remote.as_ref()).await.unwrap();
        Self {
            books: BookService::new(remote.clone()),
            folders: FolderService::new(remote.clone()),
            tags: TagService::new(remote.clone()),
            memos: MemoService::new(remote.clone(), UNDO_WINDOW),
            remote,
            store,
        }
    }

    async fn seed_book(&mut self, title: &str, status: BookStatus) -> String {
        let book = self
            .books
            .add_book(
                &mut self.store,
                NewBook {
                    title: title.into(),
                    author: None,
                    status,
                },
                &[],
            )
            .await
            .unwrap();
        book.id
    }

    async fn seed_folder(&mut self, name: &str, status: BookStatus) -> String {
        let folder = self
            .folders
            .create_folder(
                &mut self.store,
                NewFolder {
                    name: name.into(),
                    status,
                    color: None,
                },
            )
            .await
            .unwrap();
        folder.id
    }

    async fn seed_memo(&mut self, book_id: &str, content: &str) -> String {
        let memo = self
            .memos
            .add_memo(
                &mut self.store,
                NewMemo {
                    book_id: book_id.into(),
                    memo_type: MemoType::Summary,
                    content: content.into(),
                    source_page: None,
                    pinned: false,
                },
            )
            .await
            .unwrap();
        memo.id
    }
}

// ── status changes ─────────────────────────────────────────────────────

#[tokio::test]
async fn finishing_a_book_moves_it_between_status_views() {
    let mut app = App::new().await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;

    let reading = ShelfFilter::new(BookStatus::Reading);
    assert_eq!(views::visible_books(&app.store, &reading).len(), 1);
    let before = views::status_counts(&app.store);

    app.books
        .change_status(&mut app.store, &book_id, BookStatus::Read)
        .await
        .unwrap();

    assert!(views::visible_books(&app.store, &reading).is_empty());
    let after = views::status_counts(&app.store);
    assert_eq!(after.reading, before.reading - 1);
    assert_eq!(after.read, before.read + 1);
}

#[tokio::test]
async fn crossing_status_buckets_evicts_from_folder() {
    let mut app = App::new().await;
    let folder_id = app.seed_folder("Space operas", BookStatus::Reading).await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    app.books
        .move_to_folder(&mut app.store, &book_id, DropTarget::Folder(folder_id.clone()))
        .await
        .unwrap();

    app.books
        .change_status(&mut app.store, &book_id, BookStatus::Read)
        .await
        .unwrap();

    let book = app.store.book(&book_id).unwrap();
    assert_eq!(book.status, BookStatus::Read);
    assert_eq!(book.folder_id, None);
    assert_eq!(views::folder_book_count(&app.store, &folder_id), 0);
}

#[tokio::test]
async fn same_bucket_status_change_keeps_folder() {
    let mut app = App::new().await;
    let folder_id = app.seed_folder("Queue", BookStatus::ToRead).await;
    let book_id = app.seed_book("Emma", BookStatus::Reading).await;
    app.books
        .move_to_folder(&mut app.store, &book_id, DropTarget::Folder(folder_id.clone()))
        .await
        .unwrap();

    // Folder is a TO_READ bucket; moving the book to TO_READ matches it.
    app.books
        .change_status(&mut app.store, &book_id, BookStatus::ToRead)
        .await
        .unwrap();
    assert_eq!(
        app.store.book(&book_id).unwrap().folder_id,
        Some(folder_id)
    );
}

#[tokio::test]
async fn failed_status_change_rolls_back_status_and_folder() {
    let mut app = App::new().await;
    let folder_id = app.seed_folder("Space operas", BookStatus::Reading).await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    app.books
        .move_to_folder(&mut app.store, &book_id, DropTarget::Folder(folder_id.clone()))
        .await
        .unwrap();

    app.remote.fail_next(1);
    let err = app
        .books
        .change_status(&mut app.store, &book_id, BookStatus::Read)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Remote(_)));

    let book = app.store.book(&book_id).unwrap();
    assert_eq!(book.status, BookStatus::Reading);
    assert_eq!(book.folder_id, Some(folder_id));
}

// ── drag and drop ──────────────────────────────────────────────────────

#[tokio::test]
async fn dropping_on_current_location_is_a_complete_noop() {
    let mut app = App::new().await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;

    let calls_before = app.remote.call_count();
    let outcome = app
        .books
        .move_to_folder(&mut app.store, &book_id, DropTarget::Root)
        .await
        .unwrap();
    assert_eq!(outcome, MoveOutcome::NoOp);
    assert_eq!(app.remote.call_count(), calls_before);
    assert_eq!(app.store.book(&book_id).unwrap().folder_id, None);
}

#[tokio::test]
async fn drop_targets_resolve_to_folder_root_or_nothing() {
    let mut app = App::new().await;
    let folder_id = app.seed_folder("Space operas", BookStatus::Reading).await;

    assert_eq!(
        resolve_drop_target(&app.store, ROOT_DROP_ID),
        Some(DropTarget::Root)
    );
    assert_eq!(
        resolve_drop_target(&app.store, &folder_id),
        Some(DropTarget::Folder(folder_id))
    );
    assert_eq!(resolve_drop_target(&app.store, "no-such-target"), None);
}

#[tokio::test]
async fn failed_move_restores_previous_folder() {
    let mut app = App::new().await;
    let folder_id = app.seed_folder("Space operas", BookStatus::Reading).await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;

    app.remote.fail_next(1);
    app.books
        .move_to_folder(&mut app.store, &book_id, DropTarget::Folder(folder_id))
        .await
        .unwrap_err();
    assert_eq!(app.store.book(&book_id).unwrap().folder_id, None);
}

// ── book create / delete ───────────────────────────────────────────────

#[tokio::test]
async fn add_book_rejects_blank_title_before_any_remote_call() {
    let mut app = App::new().await;
    let calls_before = app.remote.call_count();
    let err = app
        .books
        .add_book(
            &mut app.store,
            NewBook {
                title: "   ".into(),
                author: None,
                status: BookStatus::ToRead,
            },
            &[],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(app.remote.call_count(), calls_before);
}

#[tokio::test]
async fn add_book_links_each_selected_tag_once() {
    let mut app = App::new().await;
    let tag = app
        .tags
        .create_tag(
            &mut app.store,
            NewTag {
                name: "sf".into(),
                color: None,
            },
        )
        .await
        .unwrap();

    let book = app
        .books
        .add_book(
            &mut app.store,
            NewBook {
                title: "Dune".into(),
                author: None,
                status: BookStatus::Reading,
            },
            &[tag.id.clone(), tag.id.clone()],
        )
        .await
        .unwrap();

    let links = app
        .remote
        .list_book_tags(BookTagFilter::by_book(&book.id))
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(app.store.book_tags_for_book(&book.id).count(), 1);
}

#[tokio::test]
async fn deleting_a_book_cascades_to_memos_and_links() {
    let mut app = App::new().await;
    let tag = app
        .tags
        .create_tag(
            &mut app.store,
            NewTag {
                name: "sf".into(),
                color: None,
            },
        )
        .await
        .unwrap();
    let book = app
        .books
        .add_book(
            &mut app.store,
            NewBook {
                title: "Dune".into(),
                author: None,
                status: BookStatus::Reading,
            },
            std::slice::from_ref(&tag.id),
        )
        .await
        .unwrap();
    app.seed_memo(&book.id, "spice").await;

    app.books.delete_book(&mut app.store, &book.id).await.unwrap();

    assert!(app.store.book(&book.id).is_none());
    assert!(app.store.memos().is_empty());
    assert_eq!(app.store.book_tags().len(), 0);
    assert!(app.remote.list_memos(Some(&book.id)).await.unwrap().is_empty());
    assert!(app
        .remote
        .list_book_tags(BookTagFilter::by_book(&book.id))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn failed_book_delete_restores_the_local_rows() {
    let mut app = App::new().await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    let memo_id = app.seed_memo(&book_id, "spice").await;

    // Fail the very first cascade call (the memo listing).
    app.remote.fail_next(1);
    app.books
        .delete_book(&mut app.store, &book_id)
        .await
        .unwrap_err();

    assert!(app.store.book(&book_id).is_some());
    assert!(app.store.memo(&memo_id).is_some());
}

// ── folders ────────────────────────────────────────────────────────────

#[tokio::test]
async fn folder_delete_plan_names_the_live_book_count() {
    let mut app = App::new().await;
    let folder_id = app.seed_folder("Space operas", BookStatus::Reading).await;
    for title in ["Dune", "Hyperion"] {
        let book_id = app.seed_book(title, BookStatus::Reading).await;
        app.books
            .move_to_folder(&mut app.store, &book_id, DropTarget::Folder(folder_id.clone()))
            .await
            .unwrap();
    }

    let plan = app.folders.delete_plan(&app.store, &folder_id).unwrap();
    assert_eq!(plan.book_count, 2);
    assert_eq!(plan.folder.name, "Space operas");
}

#[tokio::test]
async fn deleting_a_folder_removes_its_books_everywhere() {
    let mut app = App::new().await;
    let tag = app
        .tags
        .create_tag(
            &mut app.store,
            NewTag {
                name: "sf".into(),
                color: None,
            },
        )
        .await
        .unwrap();
    let folder_id = app.seed_folder("Space operas", BookStatus::Reading).await;
    let mut book_ids = Vec::new();
    for title in ["Dune", "Hyperion"] {
        let book = app
            .books
            .add_book(
                &mut app.store,
                NewBook {
                    title: title.into(),
                    author: None,
                    status: BookStatus::Reading,
                },
                std::slice::from_ref(&tag.id),
            )
            .await
            .unwrap();
        app.books
            .move_to_folder(&mut app.store, &book.id, DropTarget::Folder(folder_id.clone()))
            .await
            .unwrap();
        book_ids.push(book.id);
    }

    app.folders
        .delete_folder(&mut app.store, &folder_id)
        .await
        .unwrap();

    assert!(app.store.folder(&folder_id).is_none());
    for book_id in &book_ids {
        assert!(app.store.book(book_id).is_none());
        assert!(app
            .remote
            .list_book_tags(BookTagFilter::by_book(book_id))
            .await
            .unwrap()
            .is_empty());
    }
    let filter = ShelfFilter::new(BookStatus::Reading);
    assert!(views::visible_books(&app.store, &filter).is_empty());
    assert!(views::visible_folders(&app.store, &filter).is_empty());
}

#[tokio::test]
async fn failed_folder_delete_restores_folder_and_books() {
    let mut app = App::new().await;
    let folder_id = app.seed_folder("Space operas", BookStatus::Reading).await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    app.books
        .move_to_folder(&mut app.store, &book_id, DropTarget::Folder(folder_id.clone()))
        .await
        .unwrap();

    app.remote.fail_next(1);
    app.folders
        .delete_folder(&mut app.store, &folder_id)
        .await
        .unwrap_err();

    assert!(app.store.folder(&folder_id).is_some());
    assert_eq!(
        app.store.book(&book_id).unwrap().folder_id,
        Some(folder_id)
    );
}

// ── tags ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_the_selected_tag_clears_the_filter_and_links() {
    let mut app = App::new().await;
    let tag = app
        .tags
        .create_tag(
            &mut app.store,
            NewTag {
                name: "sf".into(),
                color: None,
            },
        )
        .await
        .unwrap();
    let book = app
        .books
        .add_book(
            &mut app.store,
            NewBook {
                title: "Dune".into(),
                author: None,
                status: BookStatus::Reading,
            },
            std::slice::from_ref(&tag.id),
        )
        .await
        .unwrap();

    let mut filter = ShelfFilter::new(BookStatus::Reading);
    filter.selected_tag = Some(tag.id.clone());

    app.tags
        .delete_tag(&mut app.store, &mut filter, &tag.id)
        .await
        .unwrap();

    assert_eq!(filter.selected_tag, None);
    assert!(app.store.tag(&tag.id).is_none());
    assert!(app
        .remote
        .list_book_tags(BookTagFilter::by_tag(&tag.id))
        .await
        .unwrap()
        .is_empty());
    // With the filter cleared, the book is visible again.
    assert_eq!(views::visible_books(&app.store, &filter).len(), 1);
    assert_eq!(views::visible_books(&app.store, &filter)[0].id, book.id);
}

#[tokio::test]
async fn failed_tag_delete_restores_tag_links_and_selection() {
    let mut app = App::new().await;
    let tag = app
        .tags
        .create_tag(
            &mut app.store,
            NewTag {
                name: "sf".into(),
                color: None,
            },
        )
        .await
        .unwrap();
    let book = app
        .books
        .add_book(
            &mut app.store,
            NewBook {
                title: "Dune".into(),
                author: None,
                status: BookStatus::Reading,
            },
            std::slice::from_ref(&tag.id),
        )
        .await
        .unwrap();

    let mut filter = ShelfFilter::new(BookStatus::Reading);
    filter.selected_tag = Some(tag.id.clone());

    app.remote.fail_next(1);
    app.tags
        .delete_tag(&mut app.store, &mut filter, &tag.id)
        .await
        .unwrap_err();

    assert_eq!(filter.selected_tag, Some(tag.id.clone()));
    assert!(app.store.tag(&tag.id).is_some());
    assert_eq!(app.store.book_tags_for_book(&book.id).count(), 1);
}

#[tokio::test]
async fn syncing_tags_diffs_links_and_keeps_pairs_unique() {
    let mut app = App::new().await;
    let keep = app
        .tags
        .create_tag(&mut app.store, NewTag { name: "keep".into(), color: None })
        .await
        .unwrap();
    let drop = app
        .tags
        .create_tag(&mut app.store, NewTag { name: "drop".into(), color: None })
        .await
        .unwrap();
    let book = app
        .books
        .add_book(
            &mut app.store,
            NewBook {
                title: "Dune".into(),
                author: None,
                status: BookStatus::Reading,
            },
            std::slice::from_ref(&drop.id),
        )
        .await
        .unwrap();

    // Select "keep" twice; "drop" is deselected.
    let selection = vec![keep.id.clone(), keep.id.clone()];
    app.tags
        .sync_book_tags(&mut app.store, &book.id, &selection)
        .await
        .unwrap();

    let links = app
        .remote
        .list_book_tags(BookTagFilter::by_book(&book.id))
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].tag_id, keep.id);

    // Re-syncing the same selection changes nothing.
    app.tags
        .sync_book_tags(&mut app.store, &book.id, &selection)
        .await
        .unwrap();
    assert_eq!(app.store.book_tags_for_book(&book.id).count(), 1);
}

// ── memos ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn adding_a_memo_bumps_count_and_last_memo_at() {
    let mut app = App::new().await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    assert_eq!(app.store.book(&book_id).unwrap().memo_count, 0);

    app.seed_memo(&book_id, "spice").await;

    let book = app.store.book(&book_id).unwrap();
    assert_eq!(book.memo_count, 1);
    assert!(book.last_memo_at.is_some());
    assert_eq!(
        views::book_memos(&app.store, &book_id, MemoTypeFilter::All).len(),
        1
    );
}

#[tokio::test]
async fn undo_within_window_restores_an_equivalent_memo() {
    let mut app = App::new().await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    let memo_id = app
        .memos
        .add_memo(
            &mut app.store,
            NewMemo {
                book_id: book_id.clone(),
                memo_type: MemoType::Quote,
                content: "Fear is the mind-killer.".into(),
                source_page: Some("8".into()),
                pinned: true,
            },
        )
        .await
        .unwrap()
        .id;
    let count_before = app.store.book(&book_id).unwrap().memo_count;

    let undo = app.memos.delete_memo(&mut app.store, &memo_id).await.unwrap();
    assert_eq!(
        app.store.book(&book_id).unwrap().memo_count,
        count_before - 1
    );

    let restored = app
        .memos
        .undo_delete(&mut app.store, undo)
        .await
        .unwrap()
        .expect("undo inside the window restores the memo");

    assert_ne!(restored.id, memo_id);
    assert_eq!(restored.memo_type, MemoType::Quote);
    assert_eq!(restored.content, "Fear is the mind-killer.");
    assert_eq!(restored.source_page.as_deref(), Some("8"));
    assert!(restored.pinned);
    assert_eq!(app.store.book(&book_id).unwrap().memo_count, count_before);
}

#[tokio::test]
async fn undo_after_the_window_expires_silently() {
    let remote = Arc::new(MemoryRemote::new());
    let mut store = EntityStore::load(remote.as_ref()).await.unwrap();
    let books = BookService::new(remote.clone());
    let memos = MemoService::new(remote.clone(), Duration::ZERO);

    let book = books
        .add_book(
            &mut store,
            NewBook {
                title: "Dune".into(),
                author: None,
                status: BookStatus::Reading,
            },
            &[],
        )
        .await
        .unwrap();
    let memo = memos
        .add_memo(
            &mut store,
            NewMemo {
                book_id: book.id.clone(),
                memo_type: MemoType::Summary,
                content: "spice".into(),
                source_page: None,
                pinned: false,
            },
        )
        .await
        .unwrap();

    let undo = memos.delete_memo(&mut store, &memo.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let calls_before = remote.call_count();
    let restored = memos.undo_delete(&mut store, undo).await.unwrap();
    assert!(restored.is_none());
    assert_eq!(remote.call_count(), calls_before);
    assert_eq!(store.book(&book.id).unwrap().memo_count, 0);
    assert!(store.memos().is_empty());
}

#[tokio::test]
async fn memo_count_never_goes_below_zero() {
    let mut app = App::new().await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    let memo_id = app.seed_memo(&book_id, "spice").await;

    // Simulate denormalized drift: the counter lost the increment.
    app.store.book_mut(&book_id).unwrap().memo_count = 0;

    app.memos.delete_memo(&mut app.store, &memo_id).await.unwrap();
    assert_eq!(app.store.book(&book_id).unwrap().memo_count, 0);
}

#[tokio::test]
async fn failed_memo_delete_restores_memo_and_count() {
    let mut app = App::new().await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    let memo_id = app.seed_memo(&book_id, "spice").await;

    app.remote.fail_next(1);
    app.memos
        .delete_memo(&mut app.store, &memo_id)
        .await
        .unwrap_err();

    assert!(app.store.memo(&memo_id).is_some());
    assert_eq!(app.store.book(&book_id).unwrap().memo_count, 1);
}

#[tokio::test]
async fn pin_toggle_reorders_the_derived_memo_list() {
    let mut app = App::new().await;
    let book_id = app.seed_book("Dune", BookStatus::Reading).await;
    let first = app.seed_memo(&book_id, "older").await;
    let second = app.seed_memo(&book_id, "newer").await;

    let order: Vec<String> = views::book_memos(&app.store, &book_id, MemoTypeFilter::All)
        .iter()
        .map(|m| m.id.clone())
        .collect();
    assert_eq!(order, [second.clone(), first.clone()]);

    assert!(app.memos.toggle_pin(&mut app.store, &first).await.unwrap());
    let order: Vec<String> = views::book_memos(&app.store, &book_id, MemoTypeFilter::All)
        .iter()
        .map(|m| m.id.clone())
        .collect();
    assert_eq!(order, [first, second]);
}
