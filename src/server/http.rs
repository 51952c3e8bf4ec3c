use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::PluginConfig;
use crate::server::context::{AppContext, AppError};
use crate::server::file_api::{self, FileContent};
use crate::server::file_index::{self, DirectoryEntry};

#[derive(Debug, Deserialize)]
pub struct ListProjectQuery {
    pub subdir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReadFileQuery {
    pub filepath: String,
}

/// Build the router with both API routes and the `/static` mount
pub fn build_router(ctx: AppContext) -> Router {
    let static_dir = ServeDir::new(&ctx.config.static_dir);

    Router::new()
        .route("/list-project", get(list_project_handler))
        .route("/read-file", get(read_file_handler))
        .nest_service("/static", static_dir)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Run the HTTP server until Ctrl-C
pub async fn run_server(config: PluginConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr();
    info!(
        "Serving project root {:?} (hiding '{}'), static files from {:?}",
        config.project_root, config.exclusion_name, config.static_dir
    );

    let app = build_router(AppContext::new(config));
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl-C, shutting down");
    }
}

/// GET /list-project?subdir=
async fn list_project_handler(
    State(ctx): State<AppContext>,
    Query(query): Query<ListProjectQuery>,
) -> Result<Json<Vec<DirectoryEntry>>, AppError> {
    debug!("list-project subdir={:?}", query.subdir);

    let config = ctx.config.clone();
    let items = tokio::task::spawn_blocking(move || {
        file_index::list_project(&config, query.subdir.as_deref())
    })
    .await??;

    Ok(Json(items))
}

/// GET /read-file?filepath=
async fn read_file_handler(
    State(ctx): State<AppContext>,
    Query(query): Query<ReadFileQuery>,
) -> Result<Json<FileContent>, AppError> {
    debug!("read-file filepath={:?}", query.filepath);

    let config = ctx.config.clone();
    let file =
        tokio::task::spawn_blocking(move || file_api::read_file(&config, &query.filepath))
            .await??;

    Ok(Json(file))
}
