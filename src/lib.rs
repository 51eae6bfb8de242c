//! Resource router: convention-driven REST resources derived from model metadata.

pub mod config;
pub mod cors;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod inflection;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod transport;

pub use config::{load_from_path, parse_config, resolve, FullConfig, IdFormat, ModelRegistry, RouterOptions};
pub use error::{AppError, ConfigError};
pub use query::QueryOptions;
pub use routes::{build_router, common_routes, resource_routes};
pub use service::ResourceService;
pub use state::AppState;
pub use store::{MemoryStore, Persistence, PgStore, Record, StoreError};
pub use transport::{transport_by_name, Transport};

/// Install a `tracing-subscriber` fmt layer filtered by `RUST_LOG`, or `default_directive` when unset.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    // a second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
