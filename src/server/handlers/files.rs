use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::server::context::{run_blocking, AppContext, AppError};
use crate::server::protocol::{
    CreateFileBody, FileResponse, MkdirBody, MoveBody, PathQuery, SaveBody, SearchQuery,
    SearchResponse, TreeItem, TreeQuery, TreeResponse,
};
use crate::validate::{validate, ValidationReport};

pub async fn list_dir(
    State(ctx): State<AppContext>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<TreeResponse>, AppError> {
    let path = query.path.clone();
    let entries = run_blocking(&ctx, move |store| store.list(&path)).await?;

    Ok(Json(TreeResponse {
        base: ctx.store.root().display().to_string(),
        path: query.path,
        items: entries.into_iter().map(TreeItem::from).collect(),
    }))
}

pub async fn read_file(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<FileResponse>, AppError> {
    let path = query.path.clone();
    let file = run_blocking(&ctx, move |store| store.read(&path)).await?;

    Ok(Json(FileResponse {
        path: query.path,
        content: file.content,
        mtime: file.mtime,
        size: file.size,
    }))
}

pub async fn create_file(
    State(ctx): State<AppContext>,
    Json(body): Json<CreateFileBody>,
) -> Result<Json<Value>, AppError> {
    let path = body.path.clone();
    let content = body.content.unwrap_or_default();
    run_blocking(&ctx, move |store| store.create(&path, &content)).await?;

    Ok(Json(json!({ "ok": true, "path": body.path })))
}

pub async fn save_file(
    State(ctx): State<AppContext>,
    Json(body): Json<SaveBody>,
) -> Result<Json<Value>, AppError> {
    run_blocking(&ctx, move |store| store.write(&body.path, &body.content)).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn delete_path(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Value>, AppError> {
    run_blocking(&ctx, move |store| store.delete(&query.path)).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn mkdir(
    State(ctx): State<AppContext>,
    Json(body): Json<MkdirBody>,
) -> Result<Json<Value>, AppError> {
    run_blocking(&ctx, move |store| store.mkdir(&body.path)).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn search(
    State(ctx): State<AppContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    if query.q.is_empty() {
        return Err(AppError::bad_request("missing_query", "Search query is required"));
    }
    let items = run_blocking(&ctx, move |store| store.search(&query.root, &query.q)).await?;
    Ok(Json(SearchResponse { items }))
}

pub async fn move_path(
    State(ctx): State<AppContext>,
    Json(body): Json<MoveBody>,
) -> Result<Json<Value>, AppError> {
    let outcome = run_blocking(&ctx, move |store| store.move_path(&body.src, &body.dst)).await?;
    let mut body = json!({ "ok": true, "src": outcome.src, "dst": outcome.dst });
    if !outcome.stale.is_empty() {
        body["stale"] = json!(outcome.stale);
    }
    Ok(Json(body))
}

pub async fn validate_content(Json(body): Json<SaveBody>) -> Json<ValidationReport> {
    Json(validate(&body.path, &body.content))
}
