use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::server::context::{run_blocking, AppContext, AppError};
use crate::server::protocol::{AssociationBody, AssociationResponse, PathQuery};

pub async fn get_association(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<AssociationResponse>, AppError> {
    let path = query.path.clone();
    let container = run_blocking(&ctx, move |store| Ok(store.associations().get(&path))).await?;
    Ok(Json(AssociationResponse {
        path: query.path,
        container,
    }))
}

pub async fn set_association(
    State(ctx): State<AppContext>,
    Json(body): Json<AssociationBody>,
) -> Result<Json<Value>, AppError> {
    run_blocking(&ctx, move |store| {
        store.associations().set(&body.path, &body.container)
    })
    .await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn delete_association(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Value>, AppError> {
    run_blocking(&ctx, move |store| store.associations().delete(&query.path)).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn association_map(State(ctx): State<AppContext>) -> Result<Json<Value>, AppError> {
    let map = run_blocking(&ctx, |store| Ok(store.associations().all())).await?;
    Ok(Json(json!({ "map": map })))
}
