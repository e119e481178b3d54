use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::server::context::{run_blocking, AppContext, AppError};
use crate::server::protocol::{DraftParams, DraftResponse, PathQuery};

/// Query parameters take precedence over the JSON body
pub async fn save_draft(
    State(ctx): State<AppContext>,
    Query(params): Query<DraftParams>,
    body: Option<Json<DraftParams>>,
) -> Result<Json<Value>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let path = params
        .path
        .or(body.path)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::bad_request("missing_path", "Path is required"))?;
    let content = params.content.or(body.content).unwrap_or_default();

    let key = run_blocking(&ctx, move |store| store.save_draft(&path, &content)).await?;
    Ok(Json(json!({ "ok": true, "path": key })))
}

pub async fn get_draft(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<DraftResponse>, AppError> {
    let draft = run_blocking(&ctx, move |store| store.get_draft(&query.path)).await?;
    Ok(Json(DraftResponse {
        exists: draft.is_some(),
        content: draft,
    }))
}

pub async fn delete_draft(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Value>, AppError> {
    let key = run_blocking(&ctx, move |store| store.discard_draft(&query.path)).await?;
    Ok(Json(json!({ "ok": true, "path": key })))
}

pub async fn list_dirty(State(ctx): State<AppContext>) -> Result<Json<Value>, AppError> {
    let dirty = run_blocking(&ctx, |store| Ok(store.dirty_map())).await?;
    Ok(Json(json!({ "dirty": dirty })))
}

pub async fn clear_dirty(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Value>, AppError> {
    let key = run_blocking(&ctx, move |store| store.clear_dirty(&query.path)).await?;
    Ok(Json(json!({ "ok": true, "path": key })))
}
