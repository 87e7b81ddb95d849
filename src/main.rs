mod color;
mod game;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use crate::store::GameStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let ttl = store::game_ttl();

    // Networked cache when configured, in-process map otherwise. The
    // engine never knows which backend is active.
    let game_store: Arc<dyn GameStore> = match std::env::var("REDIS_URL") {
        Ok(url) => {
            let redis = store::redis::RedisStore::connect(&url, ttl)
                .await
                .expect("redis init failed");
            tracing::info!("using redis game store");
            Arc::new(redis)
        }
        Err(_) => {
            tracing::warn!("REDIS_URL not set, games live in process memory only");
            Arc::new(store::memory::MemoryStore::new(ttl))
        }
    };

    let state = state::AppState::new(game_store);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "colorclue listening");
    axum::serve(listener, app).await.expect("server failed");
}
