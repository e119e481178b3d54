use axum::extract::Request;
use axum::http::header::ACCEPT;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::server::context::{AppContext, AppError};
use crate::server::handlers::{associations, backups, drafts, files, health};
use crate::store::WorkspaceStore;

/// Build the API router over an opened store
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/tree", get(files::list_dir))
        .route(
            "/file",
            get(files::read_file)
                .post(files::create_file)
                .put(files::save_file)
                .delete(files::delete_path),
        )
        .route("/mkdir", post(files::mkdir))
        .route("/search", get(files::search))
        .route("/mv", post(files::move_path))
        .route("/validate", post(files::validate_content))
        .route(
            "/backup",
            post(backups::make_backup).delete(backups::delete_backup),
        )
        .route("/backups", get(backups::list_backups))
        .route("/backup/restore", post(backups::restore_backup))
        .route(
            "/temp",
            put(drafts::save_draft)
                .get(drafts::get_draft)
                .delete(drafts::delete_draft),
        )
        .route("/dirty", get(drafts::list_dirty).delete(drafts::clear_dirty))
        .route(
            "/file/container",
            get(associations::get_association)
                .put(associations::set_association)
                .delete(associations::delete_association),
        )
        .route("/containers/map", get(associations::association_map))
        .route("/health", get(health::health))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .layer(middleware::from_fn(reject_browser))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// The API is not a website; direct browser navigation gets a 403
async fn reject_browser(req: Request, next: Next) -> Response {
    let wants_html = req
        .headers()
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));

    if wants_html {
        return AppError::Forbidden.into_response();
    }
    next.run(req).await
}

/// Open the store described by `config` and serve until ctrl-c
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let temp_dir = config.effective_temp_dir();
    let store = WorkspaceStore::open(
        &config.data_dir,
        &temp_dir,
        config.file_containers.clone(),
    )?;
    info!(
        "Workspace at {}, drafts at {}",
        store.root().display(),
        store.temp_root().display()
    );

    let app = build_router(AppContext::new(store));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
