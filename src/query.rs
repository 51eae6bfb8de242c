//! Query options: `where` filters and the eager-load `include` list, merged additively.

use crate::config::{Association, ModelDescriptor};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Eager-load directive: the related model plus the association (alias, kind, foreign key) that reaches it.
#[derive(Clone, Debug)]
pub struct IncludeDirective {
    pub model: Arc<ModelDescriptor>,
    pub association: Association,
}

impl IncludeDirective {
    pub fn alias(&self) -> &str {
        &self.association.alias
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    pub where_: Map<String, Value>,
    pub include: Vec<IncludeDirective>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.where_.insert(key.into(), value);
        self
    }

    pub fn with_include(mut self, include: Vec<IncludeDirective>) -> Self {
        self.include = include;
        self
    }

    /// Merge `other` over `self`: `where` keys are unioned with `other` winning on conflict,
    /// include directives are unioned by alias with `other` winning on conflict.
    /// Keys present only in `self` are never dropped.
    pub fn merge(mut self, other: QueryOptions) -> Self {
        for (k, v) in other.where_ {
            self.where_.insert(k, v);
        }
        for directive in other.include {
            match self.include.iter_mut().find(|d| d.alias() == directive.alias()) {
                Some(existing) => *existing = directive,
                None => self.include.push(directive),
            }
        }
        self
    }

    pub fn include_aliases(&self) -> Vec<&str> {
        self.include.iter().map(IncludeDirective::alias).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssociationKind, ModelDescriptor};
    use serde_json::json;

    fn directive(alias: &str, target: &str) -> IncludeDirective {
        IncludeDirective {
            model: Arc::new(ModelDescriptor {
                name: target.into(),
                table: target.into(),
                schema: "public".into(),
                primary_key: "id".into(),
                fields: vec![],
                associations: vec![],
            }),
            association: Association {
                name: alias.into(),
                alias: alias.into(),
                target: target.into(),
                target_primary_key: "id".into(),
                kind: AssociationKind::HasMany,
                foreign_key: "owner_id".into(),
                setter: "setX".into(),
            },
        }
    }

    #[test]
    fn merge_keeps_unrelated_keys() {
        let base = QueryOptions::new()
            .filter("id", json!(7))
            .with_include(vec![directive("books", "books")]);
        let caller = QueryOptions::new().filter("published", json!(true));
        let merged = base.merge(caller);
        assert_eq!(merged.where_["id"], json!(7));
        assert_eq!(merged.where_["published"], json!(true));
        assert_eq!(merged.include_aliases(), vec!["books"]);
    }

    #[test]
    fn merge_overrides_conflicting_keys() {
        let base = QueryOptions::new()
            .filter("id", json!(7))
            .with_include(vec![directive("books", "books")]);
        let caller = QueryOptions::new()
            .filter("id", json!(8))
            .with_include(vec![directive("books", "novels"), directive("awards", "awards")]);
        let merged = base.merge(caller);
        assert_eq!(merged.where_["id"], json!(8));
        assert_eq!(merged.include_aliases(), vec!["books", "awards"]);
        assert_eq!(merged.include[0].model.name, "novels");
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let base = QueryOptions::new()
            .filter("id", json!(1))
            .with_include(vec![directive("books", "books")]);
        let merged = base.clone().merge(QueryOptions::default());
        assert_eq!(merged.where_, base.where_);
        assert_eq!(merged.include_aliases(), base.include_aliases());
    }
}
