//! Wire representation of records, selected by name at construction.

mod json;
mod json_api;

pub use json::JsonTransport;
pub use json_api::JsonApiTransport;

use crate::error::{AppError, ConfigError};
use crate::service::RequestContext;
use crate::store::Record;
use serde_json::{Map, Value};
use std::sync::Arc;

pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Convert one record into its wire document.
    fn serialize_one(&self, ctx: &RequestContext, record: &dyn Record) -> Value;

    /// Convert a request body into a plain attribute mapping. Association keys stay under their alias.
    fn deserialize(&self, ctx: &RequestContext, body: Value) -> Result<Map<String, Value>, AppError>;
}

pub fn transport_by_name(name: &str) -> Result<Arc<dyn Transport>, ConfigError> {
    match name.to_lowercase().as_str() {
        "json-api" | "jsonapi" => Ok(Arc::new(JsonApiTransport)),
        "json" => Ok(Arc::new(JsonTransport)),
        _ => Err(ConfigError::UnknownTransport(name.to_string())),
    }
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}
