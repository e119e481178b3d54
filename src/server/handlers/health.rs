use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::server::context::{run_blocking, AppContext, AppError};

/// Liveness: the process answers
pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Readiness: both roots are present; 503 otherwise
pub async fn readyz(State(ctx): State<AppContext>) -> Result<(StatusCode, Json<Value>), AppError> {
    let (data_ok, temp_ok) = run_blocking(&ctx, |store| {
        Ok((store.root().is_dir(), store.temp_root().is_dir()))
    })
    .await?;

    let ready = data_ok && temp_ok;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((
        status,
        Json(json!({
            "ok": ready,
            "data_dir_ok": data_ok,
            "temp_dir_ok": temp_ok,
        })),
    ))
}

/// Store status plus associations grouped by service
pub async fn health(State(ctx): State<AppContext>) -> Result<Json<Value>, AppError> {
    let report = run_blocking(&ctx, |store| {
        let associations = store.associations();
        let containers: serde_json::Map<String, Value> = associations
            .by_service()
            .into_iter()
            .map(|(service, files)| (service, json!({ "files": files })))
            .collect();

        Ok(json!({
            "ok": true,
            "time": chrono::Utc::now().to_rfc3339(),
            "data_dir": store.root().display().to_string(),
            "temp_dir": store.temp_root().display().to_string(),
            "data_ok": store.root().is_dir(),
            "temp_ok": store.temp_root().is_dir(),
            "associations": associations.effective(),
            "containers": containers,
            "sources": {
                "static_count": associations.fixed().len(),
                "dynamic_count": associations.all().len(),
            },
        }))
    })
    .await?;
    Ok(Json(report))
}
