pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Accounts
        .route("/api/register", post(routes::accounts::register))
        .route("/api/login", post(routes::accounts::login))
        .route("/api/logout", post(routes::accounts::logout))
        .route("/api/me", get(routes::accounts::me))
        // Projects
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::save_project),
        )
        .route(
            "/api/projects/generate",
            post(routes::projects::generate_project),
        )
        .route(
            "/api/projects/regenerate",
            post(routes::projects::regenerate_fields),
        )
        .route(
            "/api/projects/{id}",
            get(routes::projects::get_project).delete(routes::projects::delete_project),
        )
        // Use cases
        .route(
            "/api/projects/{id}/usecases",
            get(routes::usecases::list_usecases).post(routes::usecases::create_usecase),
        )
        .route(
            "/api/usecases/{id}",
            get(routes::usecases::get_usecase)
                .put(routes::usecases::update_usecase)
                .delete(routes::usecases::delete_usecase),
        )
        .route(
            "/api/usecases/{id}/actors",
            get(routes::usecases::list_actors).post(routes::usecases::attach_actor),
        )
        .route(
            "/api/usecases/{id}/actors/{actor_id}",
            delete(routes::usecases::detach_actor),
        )
        .route(
            "/api/usecases/{id}/event-lists",
            get(routes::usecases::list_event_lists).post(routes::usecases::create_event_list),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the archdraft API server.
pub async fn serve(
    app_state: AppState,
    host: &str,
    port: u16,
    open_browser: bool,
) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener, open_browser).await
}

/// Start the archdraft API server on a pre-bound listener.
///
/// Accepts a `TcpListener` that was already bound so the caller can read the
/// actual port before starting (useful when `port = 0` and the OS picks a
/// free port).
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("archdraft API listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/health");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
