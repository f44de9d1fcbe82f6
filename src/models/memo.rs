use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoType {
    #[serde(rename = "SUMMARY")]
    Summary,
    #[serde(rename = "QUOTE")]
    Quote,
    #[serde(rename = "DATA")]
    Data,
}

impl MemoType {
    pub fn label(self) -> &'static str {
        match self {
            MemoType::Summary => "Summary",
            MemoType::Quote => "Quote",
            MemoType::Data => "Data",
        }
    }
}

/// A structured note attached to a book: a summary, a quote or a data
/// point, optionally with a source page reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightMemo {
    pub id: String,
    pub book_id: String,
    #[serde(rename = "type")]
    pub memo_type: MemoType,
    pub content: String,
    pub source_page: Option<String>,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemo {
    pub book_id: String,
    #[serde(rename = "type")]
    pub memo_type: MemoType,
    pub content: String,
    pub source_page: Option<String>,
    pub pinned: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoPatch {
    #[serde(rename = "type")]
    pub memo_type: Option<MemoType>,
    pub content: Option<String>,
    pub source_page: Option<String>,
    pub pinned: Option<bool>,
}
