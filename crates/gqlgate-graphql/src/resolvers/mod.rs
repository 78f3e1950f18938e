//! Field resolvers.
//!
//! - `rest`: Query fields backed by a `GET` against a downstream service
//! - [`PropertyResolver`]: Object fields read off the parent value

mod rest;

pub use rest::{ResolveError, RestResolver};

use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::ResolverContext;
use async_trait::async_trait;

/// Resolves one field to a value.
#[async_trait]
pub trait FieldResolver: Send + Sync {
    /// Produces the field's value; `None` resolves to null.
    async fn resolve(&self, ctx: ResolverContext<'_>) -> async_graphql::Result<Option<Value>>;
}

/// Shared resolver handle bound to a field coordinate.
pub type Resolver = Arc<dyn FieldResolver>;

/// Reads a key off the parent object value.
///
/// Used for every field that has no explicitly bound resolver.
#[derive(Debug, Clone)]
pub struct PropertyResolver {
    key: String,
}

impl PropertyResolver {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl FieldResolver for PropertyResolver {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> async_graphql::Result<Option<Value>> {
        let value = match ctx.parent_value.as_value() {
            Some(Value::Object(object)) => object.get(self.key.as_str()).cloned(),
            _ => None,
        };
        Ok(value)
    }
}

/// Convert a serde_json::Value to async_graphql::Value.
pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f)
                        .unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<async_graphql::Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (async_graphql::Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_graphql_value_primitives() {
        assert!(matches!(json_to_graphql_value(json!(null)), Value::Null));
        assert!(matches!(json_to_graphql_value(json!(true)), Value::Boolean(true)));
        assert!(matches!(json_to_graphql_value(json!(42)), Value::Number(_)));
        assert!(matches!(json_to_graphql_value(json!("hello")), Value::String(s) if s == "hello"));
    }

    #[test]
    fn test_json_to_graphql_value_nested() {
        let value = json_to_graphql_value(json!({
            "title": "Dune",
            "tags": ["sf", "classic"],
            "author": { "name": "Herbert" }
        }));
        let Value::Object(book) = value else {
            panic!("expected object");
        };
        assert!(matches!(&book["tags"], Value::List(tags) if tags.len() == 2));
        assert!(matches!(&book["author"], Value::Object(author) if author.contains_key("name")));
    }
}
