//! Data model for the catalog: books, folders, tags and insight memos.
//!
//! Each submodule owns one entity plus its create/patch request types.
//! Everything is re-exported here so callers can write `models::Book`
//! instead of `models::book::Book`.

pub mod book;
pub mod folder;
pub mod memo;
pub mod tag;

pub use book::*;
pub use folder::*;
pub use memo::*;
pub use tag::*;
