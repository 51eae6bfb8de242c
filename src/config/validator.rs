//! Config validation: referential integrity between models and associations.

use crate::config::{AssociationKind, FullConfig, ModelConfig};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

fn has_field(model: &ModelConfig, name: &str) -> bool {
    model.fields.iter().any(|f| f.name == name)
}

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let mut by_name: HashMap<String, &ModelConfig> = HashMap::new();
    for m in &config.models {
        let key = m.name.to_lowercase();
        if key.is_empty() {
            return Err(ConfigError::Validation("model name must not be empty".into()));
        }
        if by_name.insert(key, m).is_some() {
            return Err(ConfigError::DuplicateModel(m.name.clone()));
        }
    }

    for m in &config.models {
        if !has_field(m, &m.primary_key) {
            return Err(ConfigError::InvalidPrimaryKey {
                model: m.name.clone(),
                field: m.primary_key.clone(),
            });
        }

        let mut names = HashSet::new();
        let mut aliases = HashSet::new();
        for a in &m.associations {
            let target = by_name
                .get(&a.target.to_lowercase())
                .ok_or_else(|| ConfigError::MissingReference {
                    kind: "model",
                    id: a.target.clone(),
                })?;
            let (carrier, carrier_name) = match a.kind {
                AssociationKind::BelongsTo => (m, &m.name),
                AssociationKind::HasOne | AssociationKind::HasMany => (*target, &target.name),
            };
            if !has_field(carrier, &a.foreign_key) {
                return Err(ConfigError::MissingReference {
                    kind: "foreign key",
                    id: format!("{}.{}", carrier_name, a.foreign_key),
                });
            }
            let name = a.name.to_lowercase();
            if !names.insert(name.clone()) {
                return Err(ConfigError::DuplicateAssociation {
                    model: m.name.clone(),
                    alias: name,
                });
            }
            let alias = a.as_.as_deref().unwrap_or(&a.name).to_lowercase();
            if !aliases.insert(alias.clone()) {
                return Err(ConfigError::DuplicateAssociation {
                    model: m.name.clone(),
                    alias,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssociationConfig, FieldConfig, FieldType};

    fn field(name: &str) -> FieldConfig {
        FieldConfig {
            name: name.into(),
            type_: FieldType::Integer,
            nullable: true,
            default: None,
        }
    }

    fn model(name: &str, fields: &[&str], associations: Vec<AssociationConfig>) -> ModelConfig {
        ModelConfig {
            name: name.into(),
            table: None,
            schema: None,
            primary_key: "id".into(),
            fields: fields.iter().map(|f| field(f)).collect(),
            associations,
        }
    }

    fn has_many(name: &str, target: &str, fk: &str) -> AssociationConfig {
        AssociationConfig {
            name: name.into(),
            target: target.into(),
            kind: AssociationKind::HasMany,
            foreign_key: fk.into(),
            as_: None,
            setter: None,
        }
    }

    #[test]
    fn accepts_consistent_models() {
        let config = FullConfig {
            models: vec![
                model("authors", &["id", "name"], vec![has_many("books", "books", "author_id")]),
                model("books", &["id", "author_id"], vec![]),
            ],
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_unknown_target() {
        let config = FullConfig {
            models: vec![model("authors", &["id"], vec![has_many("books", "books", "author_id")])],
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingReference { kind: "model", .. })
        ));
    }

    #[test]
    fn rejects_foreign_key_on_wrong_side() {
        let config = FullConfig {
            models: vec![
                model("authors", &["id", "author_id"], vec![has_many("books", "books", "author_id")]),
                model("books", &["id"], vec![]),
            ],
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingReference { kind: "foreign key", .. })
        ));
    }

    #[test]
    fn rejects_duplicates() {
        let config = FullConfig {
            models: vec![model("authors", &["id"], vec![]), model("Authors", &["id"], vec![])],
        };
        assert!(matches!(validate(&config), Err(ConfigError::DuplicateModel(_))));

        let config = FullConfig {
            models: vec![
                model(
                    "authors",
                    &["id"],
                    vec![has_many("books", "books", "author_id"), has_many("Books", "books", "author_id")],
                ),
                model("books", &["id", "author_id"], vec![]),
            ],
        };
        assert!(matches!(validate(&config), Err(ConfigError::DuplicateAssociation { .. })));
    }

    #[test]
    fn rejects_names_differing_only_in_case() {
        let mut works = has_many("Books", "books", "author_id");
        works.as_ = Some("works".into());
        let config = FullConfig {
            models: vec![
                model("authors", &["id"], vec![has_many("books", "books", "author_id"), works]),
                model("books", &["id", "author_id"], vec![]),
            ],
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::DuplicateAssociation { ref alias, .. }) if alias == "books"
        ));
    }

    #[test]
    fn rejects_missing_primary_key() {
        let config = FullConfig {
            models: vec![model("authors", &["name"], vec![])],
        };
        assert!(matches!(validate(&config), Err(ConfigError::InvalidPrimaryKey { .. })));
    }
}
