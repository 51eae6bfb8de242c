//! Plain JSON: a record is its attribute object.

use super::{body_to_map, Transport};
use crate::error::AppError;
use crate::service::RequestContext;
use crate::store::Record;
use serde_json::{Map, Value};

pub struct JsonTransport;

impl Transport for JsonTransport {
    fn name(&self) -> &'static str {
        "json"
    }

    fn serialize_one(&self, _ctx: &RequestContext, record: &dyn Record) -> Value {
        Value::Object(record.attributes().clone())
    }

    /// Accepts the attribute object itself or one wrapped as `{"<singular>": {...}}`.
    fn deserialize(&self, ctx: &RequestContext, body: Value) -> Result<Map<String, Value>, AppError> {
        let mut map = body_to_map(body)?;
        if map.len() == 1
            && ctx.model.field(&ctx.model_name).is_none()
            && matches!(map.get(&ctx.model_name), Some(Value::Object(_)))
        {
            if let Some(Value::Object(inner)) = map.remove(&ctx.model_name) {
                return Ok(inner);
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests_support::{author_context, record};
    use serde_json::json;

    #[test]
    fn serializes_attributes_verbatim() {
        let ctx = author_context();
        let r = record(json!({"id": 7, "name": "A", "books": [{"id": 1}]}));
        assert_eq!(
            JsonTransport.serialize_one(&ctx, &r),
            json!({"id": 7, "name": "A", "books": [{"id": 1}]})
        );
    }

    #[test]
    fn unwraps_singular_envelope() {
        let ctx = author_context();
        let attrs = JsonTransport
            .deserialize(&ctx, json!({"author": {"name": "A"}}))
            .unwrap();
        assert_eq!(Value::Object(attrs), json!({"name": "A"}));
        let attrs = JsonTransport.deserialize(&ctx, json!({"name": "A"})).unwrap();
        assert_eq!(Value::Object(attrs), json!({"name": "A"}));
        assert!(JsonTransport.deserialize(&ctx, json!([1, 2])).is_err());
    }

    #[test]
    fn keeps_singular_key_holding_a_scalar() {
        let ctx = author_context();
        let attrs = JsonTransport.deserialize(&ctx, json!({"author": "x"})).unwrap();
        assert_eq!(Value::Object(attrs), json!({"author": "x"}));
        let attrs = JsonTransport.deserialize(&ctx, json!({"author": null})).unwrap();
        assert_eq!(Value::Object(attrs), json!({"author": null}));
    }
}
