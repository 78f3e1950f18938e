//! Schema definitions produced by translation and consumed by the builder.

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use indexmap::IndexMap;

use super::types::{InputType, OutputType};
use crate::resolvers::Resolver;

/// Root type names.
pub const QUERY_TYPE: &str = "Query";
pub const MUTATION_TYPE: &str = "Mutation";

/// A field of an object type, an interface or a root type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: OutputType,
    pub arguments: Vec<ArgumentDef>,
    pub description: Option<String>,
    /// Key of the value on the parent object; differs from `name` when the
    /// property name had to be sanitized.
    pub source_key: String,
}

impl FieldDef {
    /// Creates a field read from the parent key of the same name.
    pub fn new(name: impl Into<String>, ty: OutputType) -> Self {
        let name = name.into();
        Self {
            source_key: name.clone(),
            name,
            ty,
            arguments: Vec::new(),
            description: None,
        }
    }

    pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = key.into();
        self
    }

    pub fn with_argument(mut self, argument: ArgumentDef) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A field argument. Arguments are nullable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: InputType,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>, ty: InputType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An object type with its fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTypeDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDef>,
    /// Interfaces the type implements.
    pub interfaces: Vec<String>,
}

impl ObjectTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            interfaces: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn implement(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }
}

/// An interface type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceTypeDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl InterfaceTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

/// Identifies a field by its parent type and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldCoordinate {
    pub type_name: String,
    pub field_name: String,
}

impl FieldCoordinate {
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }

    /// Coordinate of a field on the `Query` root.
    pub fn query(field_name: impl Into<String>) -> Self {
        Self::new(QUERY_TYPE, field_name)
    }
}

impl fmt::Display for FieldCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// Picks the concrete object type name for a value of an interface type.
pub type TypeResolver = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// The schema contribution of one service.
#[derive(Clone, Default)]
pub struct SchemaFragment {
    pub object_types: Vec<ObjectTypeDef>,
    pub query_fields: Vec<FieldDef>,
    pub resolvers: IndexMap<FieldCoordinate, Resolver>,
}

impl fmt::Debug for SchemaFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaFragment")
            .field("object_types", &self.object_types)
            .field("query_fields", &self.query_fields)
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::ScalarType;

    #[test]
    fn test_field_coordinate_display() {
        assert_eq!(FieldCoordinate::query("booksById").to_string(), "Query.booksById");
        assert_eq!(FieldCoordinate::new("Book", "title").to_string(), "Book.title");
    }

    #[test]
    fn test_field_def_source_key_defaults_to_name() {
        let field = FieldDef::new("title", OutputType::Scalar(ScalarType::String));
        assert_eq!(field.source_key, "title");

        let renamed = FieldDef::new("first_name", OutputType::Scalar(ScalarType::String))
            .with_source_key("first-name");
        assert_eq!(renamed.source_key, "first-name");
    }
}
