//! Include resolution: `?include=a,b` -> eager-load plan plus settable associations.

use crate::config::{Association, ModelDescriptor, ModelRegistry};
use crate::error::AppError;
use crate::query::IncludeDirective;
use std::sync::Arc;

/// An association whose full related set may be replaced on write.
#[derive(Clone, Debug)]
pub struct SettableAssociation {
    /// Payload key (the association alias).
    pub alias: String,
    pub setter: String,
    pub target: Arc<ModelDescriptor>,
}

#[derive(Clone, Debug, Default)]
pub struct IncludePlan {
    pub eager: Vec<IncludeDirective>,
    pub settable: Vec<SettableAssociation>,
}

fn target_of(registry: &ModelRegistry, route: &str, assoc: &Association) -> Result<Arc<ModelDescriptor>, AppError> {
    registry
        .get(&assoc.target)
        .cloned()
        .ok_or_else(|| AppError::UnknownAssociation {
            route: route.to_string(),
            association: assoc.name.clone(),
        })
}

fn settable(assoc: &Association, target: Arc<ModelDescriptor>) -> SettableAssociation {
    SettableAssociation {
        alias: assoc.alias.clone(),
        setter: assoc.setter.clone(),
        target,
    }
}

/// Validate every name in `include` against `model`'s associations. One unknown name fails the
/// whole request. An absent parameter yields empty lists.
pub fn resolve_includes(
    registry: &ModelRegistry,
    model: &ModelDescriptor,
    route: &str,
    include: Option<&str>,
) -> Result<IncludePlan, AppError> {
    let mut plan = IncludePlan::default();
    let Some(include) = include else {
        return Ok(plan);
    };
    for name in include.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let assoc = model
            .association(name)
            .ok_or_else(|| AppError::UnknownAssociation {
                route: route.to_string(),
                association: name.to_string(),
            })?;
        if plan.eager.iter().any(|d| d.alias() == assoc.alias) {
            continue;
        }
        let target = target_of(registry, route, assoc)?;
        plan.settable.push(settable(assoc, Arc::clone(&target)));
        plan.eager.push(IncludeDirective {
            model: target,
            association: assoc.clone(),
        });
    }
    Ok(plan)
}

/// Associations a write may replace: those named in `include` when given, otherwise all declared ones.
pub fn settable_for_write(
    registry: &ModelRegistry,
    model: &ModelDescriptor,
    route: &str,
    plan: &IncludePlan,
    include_given: bool,
) -> Result<Vec<SettableAssociation>, AppError> {
    if include_given {
        return Ok(plan.settable.clone());
    }
    model
        .associations
        .iter()
        .map(|a| Ok(settable(a, target_of(registry, route, a)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests_support::registry;

    #[test]
    fn absent_parameter_yields_empty_lists() {
        let reg = registry();
        let authors = reg.get("authors").unwrap();
        let plan = resolve_includes(&reg, authors, "authors", None).unwrap();
        assert!(plan.eager.is_empty());
        assert!(plan.settable.is_empty());
    }

    #[test]
    fn valid_names_produce_directives_and_setters() {
        let reg = registry();
        let authors = reg.get("authors").unwrap();
        let plan = resolve_includes(&reg, authors, "authors", Some("Books, books")).unwrap();
        assert_eq!(plan.eager.len(), 1);
        assert_eq!(plan.eager[0].alias(), "books");
        assert_eq!(plan.eager[0].model.name, "books");
        assert_eq!(plan.settable[0].setter, "setBooks");
        assert_eq!(plan.settable[0].alias, "books");
    }

    #[test]
    fn alias_and_declared_name_both_resolve() {
        let reg = crate::config::resolve(
            &crate::config::parse_config(
                r#"[
                {"name": "authors", "fields": [{"name": "id", "type": "integer"}]},
                {"name": "books",
                 "fields": [{"name": "id", "type": "integer"}, {"name": "author_id", "type": "integer"}],
                 "associations": [{"name": "authors", "as": "writer", "target": "authors",
                                   "kind": "belongs_to", "foreign_key": "author_id"}]}
            ]"#,
            )
            .unwrap(),
        )
        .unwrap();
        let books = reg.get("books").unwrap();
        for name in ["writer", "Writer", "authors"] {
            let plan = resolve_includes(&reg, books, "books", Some(name)).unwrap();
            assert_eq!(plan.eager[0].alias(), "writer", "{name}");
            assert_eq!(plan.settable[0].setter, "setWriter");
        }
    }

    #[test]
    fn one_bad_name_fails_everything() {
        let reg = registry();
        let authors = reg.get("authors").unwrap();
        let err = resolve_includes(&reg, authors, "authors", Some("books,pets")).unwrap_err();
        assert!(matches!(
            err,
            AppError::UnknownAssociation { ref association, .. } if association == "pets"
        ));
    }

    #[test]
    fn writes_default_to_every_association_in_declaration_order() {
        let reg = registry();
        let authors = reg.get("authors").unwrap();
        let plan = IncludePlan::default();
        let all = settable_for_write(&reg, authors, "authors", &plan, false).unwrap();
        let aliases: Vec<&str> = all.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases, vec!["profile", "books"]);
        let none = settable_for_write(&reg, authors, "authors", &plan, true).unwrap();
        assert!(none.is_empty());
    }
}
