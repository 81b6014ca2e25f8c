use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::Client;

use server::config::Config;
use server::rooms::registry::Rooms;

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Spawn the app on an ephemeral port and return its base URL.
pub async fn spawn_server() -> String {
    let config = Config {
        host: "127.0.0.1".into(),
        port: 0,
        gate_wait: Duration::from_secs(1),
        event_capacity: 64,
        room_idle: Duration::from_secs(3600),
    };
    let rooms = Arc::new(Rooms::new(&config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(server::serve(listener, rooms));

    format!("http://{addr}")
}

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}
