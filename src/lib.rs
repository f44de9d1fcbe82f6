//! Core of a personal book tracker: catalog books, group them into
//! status-scoped folders, label them with tags and attach insight memos
//! (summaries, quotes, data points).
//!
//! Persistence and authorization live in a managed backend reached
//! through the [`remote`] traits. This crate owns everything in front of
//! it: the client-side [`store::EntityStore`], the pure derived-view
//! functions in [`views`], and the optimistic mutation services in
//! [`services`] (apply locally, call the backend, roll back on failure).

pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod remote;
pub mod services;
pub mod store;
pub mod views;

pub use config::Config;
pub use error::{AppError, Result};
pub use store::EntityStore;
