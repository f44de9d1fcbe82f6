//! Demo session against the in-memory backend: seeds a small catalog,
//! then walks through the flows the UI would drive — shelf filtering,
//! a status change with folder eviction, a memo delete with undo.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hondana::models::{BookStatus, MemoType, NewBook, NewFolder, NewMemo, NewTag};
use hondana::notify::Notice;
use hondana::remote::MemoryRemote;
use hondana::services::{BookService, DropTarget, FolderService, MemoService, TagService};
use hondana::views::{self, MemoTypeFilter, ShelfFilter};
use hondana::{Config, EntityStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hondana=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let remote = Arc::new(MemoryRemote::new());

    let books = BookService::new(remote.clone());
    let folders = FolderService::new(remote.clone());
    let tags = TagService::new(remote.clone());
    let memos = MemoService::new(remote.clone(), config.undo_window());

    let mut store = EntityStore::load(remote.as_ref()).await?;
    let mut filter = ShelfFilter::new(config.default_status);

    // Seed a small catalog through the same services the UI would use.
    let sf = tags
        .create_tag(
            &mut store,
            NewTag {
                name: "science fiction".into(),
                color: Some("#3B82F6".into()),
            },
        )
        .await?;
    let shelf_folder = folders
        .create_folder(
            &mut store,
            NewFolder {
                name: "Space operas".into(),
                status: BookStatus::Reading,
                color: None,
            },
        )
        .await?;
    let dune = books
        .add_book(
            &mut store,
            NewBook {
                title: "Dune".into(),
                author: Some("Frank Herbert".into()),
                status: BookStatus::Reading,
            },
            std::slice::from_ref(&sf.id),
        )
        .await?;
    books
        .add_book(
            &mut store,
            NewBook {
                title: "Emma".into(),
                author: Some("Jane Austen".into()),
                status: BookStatus::ToRead,
            },
            &[],
        )
        .await?;
    let memo = memos
        .add_memo(
            &mut store,
            NewMemo {
                book_id: dune.id.clone(),
                memo_type: MemoType::Quote,
                content: "Fear is the mind-killer.".into(),
                source_page: Some("8".into()),
                pinned: false,
            },
        )
        .await?;

    println!(
        "counts: {}",
        serde_json::to_string(&views::status_counts(&store))?
    );
    print_shelf(&store, &filter);

    // Drag the book into the folder, then open the folder.
    books
        .move_to_folder(
            &mut store,
            &dune.id,
            DropTarget::Folder(shelf_folder.id.clone()),
        )
        .await?;
    filter.open_folder = Some(shelf_folder.id.clone());
    print_shelf(&store, &filter);
    filter.open_folder = None;

    // Finishing the book evicts it from the Reading-bucket folder.
    books
        .change_status(&mut store, &dune.id, BookStatus::Read)
        .await?;
    println!(
        "after finishing Dune: {}",
        serde_json::to_string(&views::status_counts(&store))?
    );

    // Validation failures never reach the backend; they surface as an
    // inline error the same way a failed remote call would.
    if let Err(err) = books
        .add_book(
            &mut store,
            NewBook {
                title: "  ".into(),
                author: None,
                status: BookStatus::ToRead,
            },
            &[],
        )
        .await
    {
        let notice = Notice::from(&err);
        println!("toast: {:?}", notice.message);
    }

    // Delete the memo, show the undo toast, restore it.
    let undo = memos.delete_memo(&mut store, &memo.id).await?;
    let toast = Notice::success("Memo deleted").with_ttl(config.undo_window());
    println!("toast: {:?} (undo within {:?})", toast.message, toast.ttl);
    if let Some(restored) = memos.undo_delete(&mut store, undo).await? {
        println!("restored memo {}", restored.id);
    }
    for m in views::book_memos(&store, &dune.id, MemoTypeFilter::All) {
        println!("memo [{}] {}", m.memo_type.label(), m.content);
    }

    Ok(())
}

fn print_shelf(store: &EntityStore, filter: &ShelfFilter) {
    let scope = match &filter.open_folder {
        Some(id) => format!("folder {id}"),
        None => "root".to_string(),
    };
    println!("shelf [{} / {scope}]:", filter.active_status);
    for folder in views::visible_folders(store, filter) {
        println!(
            "  [dir] {} ({} books)",
            folder.name,
            views::folder_book_count(store, &folder.id)
        );
    }
    for book in views::visible_books(store, filter) {
        println!(
            "  {} - {}",
            book.title,
            book.author.as_deref().unwrap_or("unknown")
        );
    }
}
