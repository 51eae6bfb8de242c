//! JSON:API-style documents: `{id, type, attributes, relationships}`.

use super::{body_to_map, Transport};
use crate::error::AppError;
use crate::service::RequestContext;
use crate::store::{key_of, Record};
use serde_json::{json, Map, Value};

pub struct JsonApiTransport;

fn resource_identifier(type_: &str, primary_key: &str, value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let id = obj.get(primary_key).and_then(key_of);
            let attributes: Map<String, Value> = obj
                .iter()
                .filter(|(k, _)| k.as_str() != primary_key)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            json!({ "type": type_, "id": id, "attributes": attributes })
        }
        _ => Value::Null,
    }
}

fn relationship_ids(data: &Value) -> Value {
    match data {
        Value::Array(items) => Value::Array(items.iter().map(relationship_ids).collect()),
        Value::Object(obj) => obj.get("id").cloned().unwrap_or(Value::Null),
        Value::Null => Value::Null,
        other => other.clone(),
    }
}

impl Transport for JsonApiTransport {
    fn name(&self) -> &'static str {
        "json-api"
    }

    fn serialize_one(&self, _ctx: &RequestContext, record: &dyn Record) -> Value {
        let model = record.model();
        let mut attributes = Map::new();
        let mut relationships = Map::new();
        for (k, v) in record.attributes() {
            if *k == model.primary_key {
                continue;
            }
            match model.association_by_alias(k) {
                Some(assoc) if model.field(k).is_none() => {
                    let target_pk = assoc.target_primary_key.as_str();
                    let data = match v {
                        Value::Array(items) => Value::Array(
                            items
                                .iter()
                                .map(|item| resource_identifier(&assoc.target, target_pk, item))
                                .collect(),
                        ),
                        other => resource_identifier(&assoc.target, target_pk, other),
                    };
                    relationships.insert(k.clone(), json!({ "data": data }));
                }
                _ => {
                    attributes.insert(k.clone(), v.clone());
                }
            }
        }
        let mut doc = json!({
            "id": key_of(&record.id()),
            "type": model.name,
            "attributes": attributes,
        });
        if !relationships.is_empty() {
            doc["relationships"] = Value::Object(relationships);
        }
        doc
    }

    /// Accepts `{"data": {"attributes": {...}, "relationships": {...}}}` or a flat attribute object.
    fn deserialize(&self, _ctx: &RequestContext, body: Value) -> Result<Map<String, Value>, AppError> {
        let mut map = body_to_map(body)?;
        let data = match map.remove("data") {
            Some(Value::Object(data)) => data,
            Some(_) => return Err(AppError::BadRequest("data must be a JSON object".into())),
            None => return Ok(map),
        };
        let mut out = match data.get("attributes") {
            Some(Value::Object(attrs)) => attrs.clone(),
            None | Some(Value::Null) => Map::new(),
            Some(_) => return Err(AppError::BadRequest("attributes must be a JSON object".into())),
        };
        if let Some(Value::Object(rels)) = data.get("relationships") {
            for (alias, rel) in rels {
                let ids = rel.get("data").map(relationship_ids).unwrap_or(Value::Null);
                out.insert(alias.clone(), ids);
            }
        }
        Ok(out)
    }
}
