//! GraphQL schema composition.
//!
//! Service descriptions are translated into [`SchemaFragment`]s, merged by the
//! first-write-wins [`SchemaBuilder`] and compiled into a [`ComposedSchema`].
//!
//! ## Components
//!
//! - `types` - Type Mapper from description types to GraphQL types
//! - `naming` - Field and type names derived from paths and models
//! - [`translate`] - One description to one fragment
//! - [`SchemaBuilder`] - Accumulates fragments and compiles the schema

mod builder;
mod definition;
mod naming;
mod translator;
mod types;

pub use builder::{
    AddOutcome, ComposedSchema, DefinitionKind, HEALTH_FIELD, PLACEHOLDER_FIELD, Rejection,
    SchemaBuilder, SchemaBuilderConfig,
};
pub use definition::{
    ArgumentDef, FieldCoordinate, FieldDef, InterfaceTypeDef, MUTATION_TYPE, ObjectTypeDef,
    QUERY_TYPE, SchemaFragment, TypeResolver,
};
pub use naming::{capitalize, derive_field_name, graphql_name, is_valid_graphql_name};
pub use translator::{TranslateError, TranslateOptions, translate};
pub use types::{InputType, OutputType, ScalarType, map_input_type, map_output_type};
