//! Mapping of API description types to GraphQL types.
//!
//! Only `string` and `integer` scalars are recognized. A field or parameter
//! named exactly `id` is always an `ID`, whatever its declared type.

use async_graphql::dynamic::TypeRef;

use super::naming::graphql_name;
use crate::openapi::{Parameter, ParameterLocation, PropertyDescriptor, ScalarKind};

/// Name that forces the `ID` scalar.
const ID_FIELD: &str = "id";

/// GraphQL scalars the gateway produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Id,
    String,
    Int,
}

impl ScalarType {
    /// Looks up the scalar for a declared kind.
    pub fn from_kind(kind: &ScalarKind) -> Option<Self> {
        match kind {
            ScalarKind::String => Some(Self::String),
            ScalarKind::Integer => Some(Self::Int),
            _ => None,
        }
    }

    /// GraphQL name of the scalar.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Id => TypeRef::ID,
            Self::String => TypeRef::STRING,
            Self::Int => TypeRef::INT,
        }
    }
}

/// Output type of a field. Every level is nullable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputType {
    Scalar(ScalarType),
    /// A named object or interface type, resolved when the schema compiles.
    Named(String),
    List(Box<OutputType>),
}

impl OutputType {
    /// Converts to an engine type reference.
    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            Self::Scalar(scalar) => TypeRef::named(scalar.type_name()),
            Self::Named(name) => TypeRef::named(name.clone()),
            Self::List(inner) => TypeRef::List(Box::new(inner.to_type_ref())),
        }
    }

    /// Returns the innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Scalar(scalar) => scalar.type_name(),
            Self::Named(name) => name,
            Self::List(inner) => inner.named_type(),
        }
    }
}

/// Input type of an argument.
pub type InputType = ScalarType;

/// Maps a property (or response schema) to an output type.
///
/// `None` means the property is omitted from the schema.
pub fn map_output_type(field_name: &str, descriptor: &PropertyDescriptor) -> Option<OutputType> {
    if field_name == ID_FIELD {
        return Some(OutputType::Scalar(ScalarType::Id));
    }
    map_descriptor(descriptor)
}

fn map_descriptor(descriptor: &PropertyDescriptor) -> Option<OutputType> {
    match descriptor {
        PropertyDescriptor::Scalar(kind) => ScalarType::from_kind(kind).map(OutputType::Scalar),
        PropertyDescriptor::Reference(target) => Some(OutputType::Named(graphql_name(target))),
        PropertyDescriptor::Array(items) => {
            map_descriptor(items).map(|inner| OutputType::List(Box::new(inner)))
        }
        PropertyDescriptor::Object(_) => None,
    }
}

/// Maps an operation parameter to an argument type.
///
/// Only path and body parameters produce arguments.
pub fn map_input_type(parameter: &Parameter) -> Option<InputType> {
    if parameter.name == ID_FIELD {
        return Some(ScalarType::Id);
    }
    match parameter.location {
        ParameterLocation::Path | ParameterLocation::Body => match parameter.descriptor.as_ref()? {
            PropertyDescriptor::Scalar(kind) => ScalarType::from_kind(kind),
            _ => None,
        },
        _ => None,
    }
}
