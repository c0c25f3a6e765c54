pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;


use axum::{
    Router,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

/// Build the HTTP router
///
/// Every transfer route shares one handler; the aliases exist for older
/// callers and behave identically.
pub fn router(state: Arc<AppState>) -> Router {
    let mut transfer_routes = Router::new();
    for path in handlers::TRANSFER_ROUTES {
        transfer_routes = transfer_routes.route(path, post(handlers::create_transfer));
    }

    let app = Router::new()
        .route("/", get(handlers::service_info))
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        .route("/balance", get(handlers::get_balance))
        .route("/wallet/balance", get(handlers::get_balance))
        .route("/price", get(handlers::get_price))
        .route("/eth-price", get(handlers::get_price))
        .route("/transactions", get(handlers::list_transactions))
        .route("/transactions/{id}", get(handlers::get_transaction))
        .merge(transfer_routes);

    app.with_state(state)
        // Stateless, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Start HTTP Gateway server
///
/// Returns once `shutdown` resolves and in-flight requests have drained.
pub async fn run_server(
    host: &str,
    port: u16,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(
            addr = %addr,
            error = %e,
            "Failed to bind, port {} may already be in use",
            port
        );
    })?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
