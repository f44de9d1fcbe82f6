use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BookStatus;

/// Fixed theme palette offered when creating or editing a folder.
/// The first entry is the default.
pub const FOLDER_COLORS: [&str; 8] = [
    "#8B5CF6", // purple
    "#EC4899", // pink
    "#3B82F6", // blue
    "#10B981", // emerald
    "#F59E0B", // amber
    "#EF4444", // red
    "#6366F1", // indigo
    "#7C3AED", // violet
];

/// A folder groups books inside a single status bucket. Folders never nest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub status: BookStatus,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFolder {
    pub name: String,
    pub status: BookStatus,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPatch {
    pub name: Option<String>,
    pub status: Option<BookStatus>,
    pub color: Option<String>,
}
