use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reading status. Every book and every folder belongs to exactly one
/// status bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    #[serde(rename = "TO_READ")]
    ToRead,
    #[serde(rename = "READING")]
    Reading,
    #[serde(rename = "READ")]
    Read,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [BookStatus::ToRead, BookStatus::Reading, BookStatus::Read];

    pub fn label(self) -> &'static str {
        match self {
            BookStatus::ToRead => "To read",
            BookStatus::Reading => "Reading",
            BookStatus::Read => "Read",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub status: BookStatus,
    /// Denormalized count of attached memos, maintained by the memo service.
    pub memo_count: i64,
    pub last_memo_at: Option<DateTime<Utc>>,
    /// `None` means the book sits at the root of its status bucket.
    pub folder_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub status: BookStatus,
}

/// Partial update. Absent fields are left untouched by the backend.
/// `folder_id` is tri-state: `None` = no change, `Some(None)` = move to
/// root, `Some(Some(id))` = move into a folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub status: Option<BookStatus>,
    pub folder_id: Option<Option<String>>,
    pub memo_count: Option<i64>,
    pub last_memo_at: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_wire_names() {
        let json = serde_json::to_string(&BookStatus::ToRead).unwrap();
        assert_eq!(json, "\"TO_READ\"");
        let back: BookStatus = serde_json::from_str("\"READING\"").unwrap();
        assert_eq!(back, BookStatus::Reading);
    }
}
