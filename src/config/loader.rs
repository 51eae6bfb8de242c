//! Load model definitions from JSON and resolve them into a `ModelRegistry`.

use crate::config::resolved::{Association, FieldDescriptor, ModelDescriptor, ModelRegistry};
use crate::config::{validate, FullConfig, ModelConfig};
use crate::error::ConfigError;
use crate::inflection::to_pascal_case;
use std::collections::HashMap;
use std::path::Path;

/// Build the resolved registry from full config (validates first).
pub fn resolve(config: &FullConfig) -> Result<ModelRegistry, ConfigError> {
    validate(config)?;
    let primary_keys: HashMap<String, String> = config
        .models
        .iter()
        .map(|m| (m.name.to_lowercase(), m.primary_key.clone()))
        .collect();
    let models = config
        .models
        .iter()
        .map(|m| resolve_model(m, &primary_keys))
        .collect();
    Ok(ModelRegistry::new(models))
}

fn resolve_model(m: &ModelConfig, primary_keys: &HashMap<String, String>) -> ModelDescriptor {
    let name = m.name.to_lowercase();
    let fields = m
        .fields
        .iter()
        .map(|f| FieldDescriptor {
            name: f.name.clone(),
            type_: f.type_,
            nullable: f.nullable,
            default: f.default.clone(),
        })
        .collect();

    let associations: Vec<Association> = m
        .associations
        .iter()
        .map(|a| {
            let alias = a.as_.as_deref().unwrap_or(&a.name).to_lowercase();
            let setter = a
                .setter
                .clone()
                .unwrap_or_else(|| format!("set{}", to_pascal_case(&alias)));
            let target = a.target.to_lowercase();
            Association {
                name: a.name.to_lowercase(),
                alias,
                target_primary_key: primary_keys.get(&target).cloned().unwrap_or_else(|| "id".into()),
                target,
                kind: a.kind,
                foreign_key: a.foreign_key.clone(),
                setter,
            }
        })
        .collect();

    ModelDescriptor {
        table: m.table.clone().unwrap_or_else(|| name.clone()),
        schema: m.schema.clone().unwrap_or_else(|| "public".into()),
        name,
        primary_key: m.primary_key.clone(),
        fields,
        associations,
    }
}

/// Read model definitions from a `models.json` file, or from `<dir>/models.json` when `path` is a directory.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    let file = if tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        path.join("models.json")
    } else {
        path.to_path_buf()
    };
    tracing::debug!(path = %file.display(), "loading model definitions");
    let raw = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", file.display(), e)))?;
    parse_config(&raw)
}

/// Parse either `{"models": [...]}` or a bare array of models.
pub fn parse_config(raw: &str) -> Result<FullConfig, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))?;
    let config = match value {
        serde_json::Value::Array(_) => FullConfig {
            models: serde_json::from_value(value).map_err(|e| ConfigError::Load(e.to_string()))?,
        },
        other => serde_json::from_value(other).map_err(|e| ConfigError::Load(e.to_string()))?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssociationKind;

    const MODELS: &str = r#"[
        {
            "name": "Authors",
            "fields": [
                {"name": "id", "type": "integer", "nullable": false},
                {"name": "name", "type": "text"}
            ],
            "associations": [
                {"name": "Books", "target": "books", "kind": "has_many", "foreign_key": "author_id"}
            ]
        },
        {
            "name": "books",
            "table": "book",
            "fields": [
                {"name": "id", "type": "integer"},
                {"name": "title", "type": "text"},
                {"name": "author_id", "type": "integer"}
            ],
            "associations": [
                {"name": "authors", "as": "author", "target": "authors", "kind": "belongs_to", "foreign_key": "author_id"}
            ]
        }
    ]"#;

    #[test]
    fn resolves_names_aliases_and_setters() {
        let registry = resolve(&parse_config(MODELS).unwrap()).unwrap();
        let authors = registry.get("authors").unwrap();
        assert_eq!(authors.table, "authors");
        assert_eq!(authors.schema, "public");
        let books = authors.association("books").unwrap();
        assert_eq!(books.alias, "books");
        assert_eq!(books.setter, "setBooks");
        assert_eq!(books.kind, AssociationKind::HasMany);

        let book = registry.get("books").unwrap();
        assert_eq!(book.table, "book");
        let author = book.association("Authors").unwrap();
        assert_eq!(author.alias, "author");
        assert_eq!(author.setter, "setAuthor");
        assert_eq!(book.association("Author").unwrap().name, "authors");
        assert_eq!(book.filter_column("author"), Some("author_id"));
        assert_eq!(book.filter_column("title"), Some("title"));
        assert_eq!(authors.filter_column("books"), None);
    }

    #[test]
    fn lookup_accepts_singular_and_respects_allowlist() {
        let registry = resolve(&parse_config(MODELS).unwrap()).unwrap();
        assert_eq!(registry.lookup("AUTHORS").unwrap().name, "authors");
        assert_eq!(registry.lookup("author").unwrap().name, "authors");
        assert!(registry.lookup("widgets").is_none());

        let registry = registry.with_allowed(Some(vec!["Books".into()]));
        assert!(registry.lookup("authors").is_none());
        assert!(registry.lookup("books").is_some());
    }

    #[test]
    fn accepts_wrapped_models_object() {
        let wrapped = format!(r#"{{"models": {}}}"#, MODELS);
        assert_eq!(parse_config(&wrapped).unwrap().models.len(), 2);
        assert!(matches!(parse_config("{"), Err(ConfigError::Load(_))));
    }
}
