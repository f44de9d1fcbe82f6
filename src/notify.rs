//! Transient outcome notifications (toasts).
//!
//! Services return `Result`; the presentation layer turns the outcome
//! into a [`Notice`]. A notice may carry a time-to-live — the memo-delete
//! notice lives exactly as long as its undo window.

use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: Level,
    pub message: String,
    pub ttl: Option<Duration>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
            ttl: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        Notice::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_error_notices() {
        let notice = Notice::from(&AppError::Validation("title must not be empty".into()));
        assert_eq!(notice.level, Level::Error);
        assert!(notice.message.contains("title"));
        assert_eq!(notice.ttl, None);
    }

    #[test]
    fn ttl_is_attached_fluently() {
        let notice = Notice::success("Memo deleted").with_ttl(Duration::from_secs(5));
        assert_eq!(notice.ttl, Some(Duration::from_secs(5)));
    }
}
