//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use crate::store::{BackupItem, FileEntry};

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct TreeItem {
    pub name: String,
    pub is_dir: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub path: String,
    pub dirty: bool,
}

impl From<FileEntry> for TreeItem {
    fn from(e: FileEntry) -> Self {
        TreeItem {
            kind: if e.is_dir { "folder" } else { "file" },
            name: e.name,
            is_dir: e.is_dir,
            path: e.path,
            dirty: e.dirty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TreeResponse {
    pub base: String,
    pub path: String,
    pub items: Vec<TreeItem>,
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub path: String,
    pub content: String,
    pub mtime: i64,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateFileBody {
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveBody {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MkdirBody {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub src: String,
    pub dst: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub root: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<FileEntry>,
}

// ============================================================================
// Backups
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RestoreQuery {
    pub file: String,
    pub backup: String,
}

#[derive(Debug, Deserialize)]
pub struct BackupQuery {
    pub backup: String,
}

#[derive(Debug, Serialize)]
pub struct BackupListResponse {
    pub items: Vec<BackupItem>,
}

// ============================================================================
// Drafts
// ============================================================================

/// `path`/`content` may arrive in the query string or the JSON body
#[derive(Debug, Default, Deserialize)]
pub struct DraftParams {
    pub path: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ============================================================================
// Associations
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AssociationBody {
    pub path: String,
    pub container: String,
}

#[derive(Debug, Serialize)]
pub struct AssociationResponse {
    pub path: String,
    pub container: Option<String>,
}
