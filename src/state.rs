//! Shared application state for all routes. Built once at startup; read-only afterwards.

use crate::config::{ModelRegistry, RouterOptions};
use crate::error::ConfigError;
use crate::service::ResourceService;
use crate::store::Persistence;
use crate::transport::transport_by_name;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ResourceService>,
    pub options: Arc<RouterOptions>,
}

impl AppState {
    /// Apply the allowlist to `registry`, pick the transport and id format named in `options`.
    /// Fails on an unknown transport or an invalid id pattern.
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<dyn Persistence>,
        options: RouterOptions,
    ) -> Result<Self, ConfigError> {
        let transport = transport_by_name(&options.transport)?;
        let id_format = options.id_format()?;
        let routable = Arc::new(registry.as_ref().clone().with_allowed(options.allowed.clone()));
        tracing::info!(
            models = routable.len(),
            transport = transport.name(),
            endpoint = %options.normalized_endpoint(),
            "resource router configured"
        );
        Ok(AppState {
            service: Arc::new(ResourceService::new(routable, store, transport, id_format)),
            options: Arc::new(options),
        })
    }
}
