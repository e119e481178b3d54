use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::server::context::{run_blocking, AppContext, AppError};
use crate::server::protocol::{BackupListResponse, BackupQuery, PathQuery, RestoreQuery};

pub async fn make_backup(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Value>, AppError> {
    let backup = run_blocking(&ctx, move |store| store.backups().backup(&query.path)).await?;
    Ok(Json(json!({ "ok": true, "backup": backup })))
}

pub async fn list_backups(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<BackupListResponse>, AppError> {
    let items = run_blocking(&ctx, move |store| store.backups().list(&query.path)).await?;
    Ok(Json(BackupListResponse { items }))
}

pub async fn restore_backup(
    State(ctx): State<AppContext>,
    Query(query): Query<RestoreQuery>,
) -> Result<Json<Value>, AppError> {
    run_blocking(&ctx, move |store| {
        store.backups().restore(&query.file, &query.backup)
    })
    .await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn delete_backup(
    State(ctx): State<AppContext>,
    Query(query): Query<BackupQuery>,
) -> Result<Json<Value>, AppError> {
    run_blocking(&ctx, move |store| store.backups().delete_backup(&query.backup)).await?;
    Ok(Json(json!({ "ok": true })))
}
