//! Runtime settings, read once from the environment at startup.
//!
//! Everything has a default; `.env` loading is the binary's business
//! (`dotenvy`), the library only reads the process environment.

use std::env;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::BookStatus;

#[derive(Debug, Clone)]
pub struct Config {
    /// How long a deleted memo can be restored, in milliseconds.
    /// Matches the lifetime of the delete notification.
    pub undo_window_ms: u64,
    /// Shelf tab selected when the app opens.
    pub default_status: BookStatus,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            undo_window_ms: 5_000,
            default_status: BookStatus::Reading,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(raw) = env::var("HONDANA_UNDO_WINDOW_MS") {
            config.undo_window_ms = raw
                .parse()
                .map_err(|_| AppError::Config(format!("invalid HONDANA_UNDO_WINDOW_MS: {raw}")))?;
        }

        if let Ok(raw) = env::var("HONDANA_DEFAULT_STATUS") {
            config.default_status = match raw.as_str() {
                "TO_READ" => BookStatus::ToRead,
                "READING" => BookStatus::Reading,
                "READ" => BookStatus::Read,
                _ => {
                    return Err(AppError::Config(format!(
                        "invalid HONDANA_DEFAULT_STATUS: {raw}"
                    )))
                }
            };
        }

        Ok(config)
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_millis(self.undo_window_ms)
    }
}
