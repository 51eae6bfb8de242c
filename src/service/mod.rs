//! Resource service: resolution, include planning and the CRUD pipeline, independent of axum.

mod includes;
mod resolver;
mod resource;

pub use includes::{resolve_includes, settable_for_write, IncludePlan, SettableAssociation};
pub use resolver::{coerce_id, resolve_id, resolve_resource, RequestContext};
pub use resource::ResourceService;

#[cfg(test)]
pub(crate) mod tests_support {
    use super::{resolve_resource, RequestContext};
    use crate::config::{parse_config, resolve, ModelDescriptor, ModelRegistry};
    use crate::query::QueryOptions;
    use crate::store::{Record, RecordHandle, StoreError};
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::Arc;

    pub const MODELS: &str = r#"[
        {
            "name": "authors",
            "fields": [
                {"name": "id", "type": "integer", "nullable": false},
                {"name": "name", "type": "text"},
                {"name": "born", "type": "integer"}
            ],
            "associations": [
                {"name": "profile", "target": "profiles", "kind": "has_one", "foreign_key": "author_id"},
                {"name": "books", "target": "books", "kind": "has_many", "foreign_key": "author_id"}
            ]
        },
        {
            "name": "books",
            "fields": [
                {"name": "id", "type": "integer", "nullable": false},
                {"name": "title", "type": "text"},
                {"name": "author_id", "type": "integer"}
            ],
            "associations": [
                {"name": "author", "target": "authors", "kind": "belongs_to", "foreign_key": "author_id"}
            ]
        },
        {
            "name": "profiles",
            "fields": [
                {"name": "id", "type": "integer", "nullable": false},
                {"name": "bio", "type": "text"},
                {"name": "author_id", "type": "integer"}
            ],
            "associations": [
                {"name": "author", "target": "authors", "kind": "belongs_to", "foreign_key": "author_id"}
            ]
        }
    ]"#;

    pub fn registry() -> ModelRegistry {
        resolve(&parse_config(MODELS).unwrap()).unwrap()
    }

    pub fn author_context() -> RequestContext {
        resolve_resource(&registry(), "authors").unwrap()
    }

    /// Read-only record over fixed attributes of the `authors` model.
    #[derive(Debug)]
    pub struct FixedRecord {
        model: Arc<ModelDescriptor>,
        attributes: Map<String, Value>,
    }

    pub fn record(attributes: Value) -> FixedRecord {
        let Value::Object(attributes) = attributes else {
            panic!("record attributes must be an object");
        };
        FixedRecord {
            model: Arc::clone(registry().get("authors").unwrap()),
            attributes,
        }
    }

    #[async_trait]
    impl Record for FixedRecord {
        fn model(&self) -> &ModelDescriptor {
            &self.model
        }

        fn id(&self) -> Value {
            self.attributes.get(&self.model.primary_key).cloned().unwrap_or(Value::Null)
        }

        fn attributes(&self) -> &Map<String, Value> {
            &self.attributes
        }

        async fn set_association(&mut self, setter: &str, _related: &[RecordHandle]) -> Result<(), StoreError> {
            Err(StoreError::UnknownAccessor(setter.to_string()))
        }

        async fn update_attributes(&mut self, attributes: Map<String, Value>) -> Result<(), StoreError> {
            self.attributes.extend(attributes);
            Ok(())
        }

        async fn reload(&mut self, _options: &QueryOptions) -> Result<(), StoreError> {
            Ok(())
        }

        async fn destroy(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
    }
}
