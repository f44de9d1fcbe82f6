//! Mutation coordinator: one service per domain, all following the same
//! contract — snapshot the affected fields, apply the change to the
//! entity store optimistically, call the remote backend, and on failure
//! revert the snapshot. Remote failures are uniform and never retried.

pub mod books;
pub mod folders;
pub mod memos;
pub mod tags;

pub use books::{resolve_drop_target, BookService, DropTarget, MoveOutcome, ROOT_DROP_ID};
pub use folders::{FolderDeletePlan, FolderService};
pub use memos::{MemoService, MemoUndo};
pub use tags::TagService;

use crate::error::{AppError, Result};

/// Required-field check run before any remote call. Returns the trimmed
/// value.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
