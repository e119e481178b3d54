//! Store error taxonomy
//!
//! Sandbox, existence and conflict failures are detected locally and carry no
//! filesystem detail. Unexpected I/O failures are wrapped in `Io` and only
//! their generic form reaches callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Path is outside the workspace")]
    OutsideWorkspace,

    #[error("Path not found")]
    NotFound,

    #[error("File not found")]
    FileNotFound,

    #[error("Path is not a directory")]
    NotADirectory,

    #[error("Directory is not empty")]
    DirNotEmpty,

    #[error("A file already exists at this path")]
    AlreadyExistsFile,

    #[error("A directory already exists at this path")]
    AlreadyExistsDir,

    #[error("Target path already exists")]
    AlreadyExists,

    #[error("Parent directory does not exist")]
    ParentMissing,

    #[error("File is not valid UTF-8 text")]
    NotText,

    #[error("Path is a directory")]
    PathIsDirectory,

    #[error("Invalid service reference")]
    InvalidReference,

    #[error("Cannot move a directory into itself")]
    MoveIntoSelf,

    #[error("Path is reserved for store data")]
    ReservedPath,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Stable error code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::OutsideWorkspace => "path_outside_workspace",
            StoreError::NotFound => "path_not_found",
            StoreError::FileNotFound => "file_not_found",
            StoreError::NotADirectory => "not_dir",
            StoreError::DirNotEmpty => "dir_not_empty",
            StoreError::AlreadyExistsFile => "file_already_exists",
            StoreError::AlreadyExistsDir => "dir_already_exists",
            StoreError::AlreadyExists => "path_already_exists",
            StoreError::ParentMissing => "parent_not_exists",
            StoreError::NotText => "not_utf8",
            StoreError::PathIsDirectory => "path_is_directory",
            StoreError::InvalidReference => "invalid_container",
            StoreError::MoveIntoSelf => "move_into_self",
            StoreError::ReservedPath => "path_reserved",
            StoreError::Io(_) => "internal_error",
        }
    }

    /// True for failures that are not the caller's fault
    pub fn is_internal(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
