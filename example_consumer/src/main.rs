//! Demo server: loads model definitions and serves them as REST resources.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! `CONFIG_PATH` points at `models.json` (or its directory). With `DATABASE_URL` set the
//! resources are backed by PostgreSQL, otherwise by an in-memory store.

use resource_router::{
    build_router, init_tracing, load_from_path, resolve, AppState, MemoryStore, Persistence, PgStore,
    RouterOptions,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("resource_router=info,example_consumer=info");

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "models.json".into());
    let config = load_from_path(&config_path).await?;
    let registry = Arc::new(resolve(&config)?);
    tracing::info!(path = %config_path, models = registry.len(), "model definitions loaded");

    let store: Arc<dyn Persistence> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await?;
            tracing::info!("using PostgreSQL store");
            Arc::new(PgStore::new(pool, Arc::clone(&registry)))
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            Arc::new(MemoryStore::new(Arc::clone(&registry)))
        }
    };

    let options = RouterOptions::from_env()?;
    let state = AppState::new(registry, store, options)?;
    let app = build_router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
