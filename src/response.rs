//! Response envelope helpers.

use axum::{http::StatusCode, Json};
use serde_json::{Map, Value};

/// `{ <key>: value }`, keyed by the plural route name.
pub fn envelope(key: &str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), value);
    Value::Object(map)
}

pub fn ok(body: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(body))
}

pub fn created(body: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_is_keyed_by_route() {
        assert_eq!(envelope("authors", json!([])), json!({"authors": []}));
    }
}
