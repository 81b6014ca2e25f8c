use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use server::config;
use server::rooms::registry::Rooms;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();
    let rooms = Arc::new(Rooms::new(&config));

    // Sweep abandoned rooms in the background
    tokio::spawn({
        let rooms = rooms.clone();
        async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            loop {
                tick.tick().await;
                let closed = rooms.sweep_idle().await;
                if closed > 0 {
                    tracing::info!("Swept {} idle rooms", closed);
                }
            }
        }
    });

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    server::serve(listener, rooms).await.expect("Server error");
}
