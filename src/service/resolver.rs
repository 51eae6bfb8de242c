//! Resource resolution: path segment -> model, canonical route names, id validation.

use crate::config::{IdFormat, ModelDescriptor, ModelRegistry};
use crate::error::AppError;
use crate::inflection::{pluralize, singularize};
use crate::query::QueryOptions;
use crate::service::includes::SettableAssociation;
use serde_json::Value;
use std::sync::Arc;

/// Per-request state threaded through the pipeline; dropped with the response.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub model: Arc<ModelDescriptor>,
    /// Singular route name, used in messages and wrapped bodies.
    pub model_name: String,
    /// Plural route name, the envelope key.
    pub route_name: String,
    pub query_options: QueryOptions,
    pub settable: Vec<SettableAssociation>,
}

/// Look up `segment` in the registry. Unknown or disallowed segments fail with `UnknownResource`.
pub fn resolve_resource(registry: &ModelRegistry, segment: &str) -> Result<RequestContext, AppError> {
    let model = registry
        .lookup(segment)
        .ok_or_else(|| AppError::UnknownResource(segment.to_string()))?;
    let lower = segment.to_lowercase();
    Ok(RequestContext {
        model: Arc::clone(model),
        model_name: singularize(&lower),
        route_name: pluralize(&lower),
        query_options: QueryOptions::default(),
        settable: Vec::new(),
    })
}

/// Validate an id path segment. `batch_operation` names the verb ("Fetching", "Deleting") for
/// routes that reject comma-separated id lists; that check runs before the format check.
pub fn resolve_id(id: &str, format: &IdFormat, batch_operation: Option<&'static str>) -> Result<Value, AppError> {
    if let Some(op) = batch_operation {
        if id.contains(',') {
            return Err(AppError::UnsupportedBatchOperation(op));
        }
    }
    if !format.is_valid(id) {
        return Err(AppError::InvalidIdentifier(id.to_string()));
    }
    Ok(coerce_id(id))
}

/// Numeric id strings become JSON integers; anything else stays a string.
pub fn coerce_id(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(id.to_string()),
    }
}

/// Coerce a payload id: numeric strings become integers, other values pass through.
pub fn coerce_value_id(v: &Value) -> Value {
    match v {
        Value::String(s) => coerce_id(s),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests_support::registry;
    use serde_json::json;

    #[test]
    fn resolves_known_resource_names() {
        let reg = registry();
        let ctx = resolve_resource(&reg, "Authors").unwrap();
        assert_eq!(ctx.model.name, "authors");
        assert_eq!(ctx.model_name, "author");
        assert_eq!(ctx.route_name, "authors");
        assert!(ctx.settable.is_empty());

        let ctx = resolve_resource(&reg, "book").unwrap();
        assert_eq!(ctx.model.name, "books");
        assert_eq!(ctx.route_name, "books");
    }

    #[test]
    fn unknown_resource_fails_fast() {
        let reg = registry();
        assert!(matches!(
            resolve_resource(&reg, "widgets"),
            Err(AppError::UnknownResource(s)) if s == "widgets"
        ));
    }

    #[test]
    fn batch_check_precedes_format_check() {
        let f = IdFormat::Integer;
        assert!(matches!(
            resolve_id("1,2", &f, Some("Deleting")),
            Err(AppError::UnsupportedBatchOperation("Deleting"))
        ));
        assert!(matches!(resolve_id("1,2", &f, None), Err(AppError::InvalidIdentifier(_))));
        assert!(matches!(resolve_id("abc", &f, Some("Fetching")), Err(AppError::InvalidIdentifier(_))));
        assert_eq!(resolve_id("7", &f, Some("Fetching")).unwrap(), json!(7));
        assert_eq!(resolve_id("x7", &IdFormat::Any, None).unwrap(), json!("x7"));
    }

    #[test]
    fn coerces_payload_ids() {
        assert_eq!(coerce_value_id(&json!("9")), json!(9));
        assert_eq!(coerce_value_id(&json!(9)), json!(9));
        assert_eq!(coerce_value_id(&json!("abc")), json!("abc"));
    }
}
