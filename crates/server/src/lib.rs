pub mod config;
pub mod error;
pub mod rooms;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::rooms::registry::Rooms;

/// Builds the application router with shared state attached.
pub fn app(rooms: Arc<Rooms>) -> Router {
    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router — same paths as the Next.js API
    Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Room lifecycle
        .route("/create-room", post(routes::rooms::create_room))
        .route("/join-room", post(routes::rooms::join_room))
        .route("/leave-room", post(routes::rooms::leave_room))
        .route("/room/{room_id}", get(routes::rooms::get_room))
        // Game actions
        .route("/room/{room_id}/start", post(routes::rooms::start_game))
        .route("/room/{room_id}/move", post(routes::rooms::submit_move))
        .route("/room/{room_id}/drop", post(routes::rooms::submit_drop))
        .route("/room/{room_id}/resign", post(routes::rooms::resign))
        // Event feed
        .route("/ws/room/{room_id}", get(routes::room_ws::room_events))
        // Shared state
        .layer(Extension(rooms))
        .layer(cors)
}

/// Serves the app on an already-bound listener.
pub async fn serve(
    listener: tokio::net::TcpListener,
    rooms: Arc<Rooms>,
) -> std::io::Result<()> {
    axum::serve(listener, app(rooms)).await
}
