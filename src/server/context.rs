//! Shared handler state and error type
//!
//! Store calls are synchronous disk I/O; handlers hop onto the blocking pool
//! through [`run_blocking`] and map failures through [`AppError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::store::{StoreError, StoreResult, WorkspaceStore};

/// State shared by every handler
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<WorkspaceStore>,
}

impl AppContext {
    pub fn new(store: WorkspaceStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Unified handler error, rendered as `{"ok": false, "error": {code, message}}`
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{message}")]
    BadRequest {
        code: &'static str,
        message: &'static str,
    },

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(code: &'static str, message: &'static str) -> Self {
        AppError::BadRequest { code, message }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(e) => match e {
                StoreError::NotFound | StoreError::FileNotFound => StatusCode::NOT_FOUND,
                StoreError::AlreadyExistsFile
                | StoreError::AlreadyExistsDir
                | StoreError::AlreadyExists => StatusCode::CONFLICT,
                StoreError::NotText => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                StoreError::OutsideWorkspace
                | StoreError::NotADirectory
                | StoreError::DirNotEmpty
                | StoreError::ParentMissing
                | StoreError::PathIsDirectory
                | StoreError::InvalidReference
                | StoreError::MoveIntoSelf
                | StoreError::ReservedPath => StatusCode::BAD_REQUEST,
            },
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Store(e) => e.code(),
            AppError::BadRequest { code, .. } => *code,
            AppError::Forbidden => "forbidden",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn is_internal(&self) -> bool {
        match self {
            AppError::Store(e) => e.is_internal(),
            AppError::Internal(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Internal details stay in the server log
        let message = if self.is_internal() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "ok": false,
            "error": { "code": self.code(), "message": message },
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Task failed: {}", e))
    }
}

/// Run a store operation on the blocking pool
pub async fn run_blocking<T, F>(ctx: &AppContext, f: F) -> Result<T, AppError>
where
    F: FnOnce(&WorkspaceStore) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = ctx.store.clone();
    let result = tokio::task::spawn_blocking(move || f(&store)).await?;
    Ok(result?)
}
