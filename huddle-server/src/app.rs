use crate::signaling::{SignalingService, ws_handler};
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(service)
}

/// Serves the relay on an already bound listener until `shutdown` resolves,
/// then releases every room.
pub async fn serve<F>(
    listener: TcpListener,
    service: SignalingService,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service.clone()))
        .with_graceful_shutdown(shutdown)
        .await?;
    service.rooms().shutdown();
    Ok(())
}
