//! Translation of an [`ApiDescription`] into a [`SchemaFragment`].
//!
//! Each model definition becomes an object type with the properties that map
//! to GraphQL types. Each path with a `GET` operation becomes a `Query` field
//! named after its template, typed by the `200` response schema and bound to
//! a [`RestResolver`].

use std::sync::Arc;

use tracing::{debug, trace};

use super::definition::{ArgumentDef, FieldCoordinate, FieldDef, ObjectTypeDef, SchemaFragment};
use super::naming::{capitalize, derive_field_name, graphql_name, is_valid_graphql_name};
use super::types::{OutputType, map_input_type, map_output_type};
use crate::openapi::{
    ApiDescription, ModelDefinition, Operation, ParameterLocation, PropertyDescriptor,
};
use crate::resolvers::RestResolver;

/// Errors that make a whole description untranslatable.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// The description declares no host and none could be inferred.
    #[error("API description declares no host")]
    MissingHost,

    /// A `GET` operation has no `200` response schema.
    #[error("GET {path} declares no schema for its 200 response")]
    MissingSuccessSchema { path: String },

    /// The `200` response schema maps to no GraphQL type.
    #[error("GET {path} has a 200 response schema that cannot be mapped")]
    UnmappableResponse { path: String },

    /// The field name derived from the path is not a GraphQL name.
    #[error("Path {path} derives the invalid field name '{name}'")]
    InvalidFieldName { path: String, name: String },
}

/// Inputs shared by every translation.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Client used by the generated resolvers.
    pub client: reqwest::Client,
    /// Scheme used when a description declares none.
    pub default_scheme: String,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            default_scheme: "http".to_string(),
        }
    }
}

/// Translates one service description.
pub fn translate(
    description: &ApiDescription,
    options: &TranslateOptions,
) -> Result<SchemaFragment, TranslateError> {
    let host = description.host.as_deref().ok_or(TranslateError::MissingHost)?;
    let scheme = description
        .scheme
        .as_deref()
        .unwrap_or(&options.default_scheme);
    let base_url = format!("{scheme}://{host}");

    let mut fragment = SchemaFragment::default();

    for (name, properties) in &description.definitions {
        fragment
            .object_types
            .push(object_type(&graphql_name(name), properties));
    }

    for (template, item) in &description.paths {
        let Some(operation) = &item.get else {
            debug!(path = %template, "Skipping path without a GET operation");
            continue;
        };

        let field_name = derive_field_name(template);
        if !is_valid_graphql_name(&field_name) {
            return Err(TranslateError::InvalidFieldName {
                path: template.clone(),
                name: field_name,
            });
        }
        if fragment.query_fields.iter().any(|f| f.name == field_name) {
            debug!(path = %template, field = %field_name, "Path derives an already used field name, skipping");
            continue;
        }
        if let Some(parameter) = operation
            .parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Path && map_input_type(p).is_none())
        {
            debug!(
                path = %template,
                parameter = %parameter.name,
                "Path parameter type cannot be mapped to an argument, skipping"
            );
            continue;
        }

        let schema = operation
            .success_schema()
            .ok_or_else(|| TranslateError::MissingSuccessSchema {
                path: template.clone(),
            })?;
        let ty = response_type(template, &field_name, schema, &mut fragment)?;

        let field = query_field(&field_name, ty, operation);
        let resolver = RestResolver::new(
            options.client.clone(),
            &base_url,
            &description.base_path,
            template,
            operation,
        );
        trace!(field = %field_name, url = %resolver.url_template(), "Bound REST resolver");

        fragment
            .resolvers
            .insert(FieldCoordinate::query(&field_name), Arc::new(resolver));
        fragment.query_fields.push(field);
    }

    debug!(
        title = description.title.as_deref().unwrap_or_default(),
        object_types = fragment.object_types.len(),
        query_fields = fragment.query_fields.len(),
        "Translated API description"
    );
    Ok(fragment)
}

/// Builds an object type from the mappable subset of `properties`.
fn object_type(type_name: &str, properties: &ModelDefinition) -> ObjectTypeDef {
    let mut object = ObjectTypeDef::new(type_name);
    for (key, descriptor) in properties {
        let Some(ty) = map_output_type(key, descriptor) else {
            trace!(object = %type_name, property = %key, "Omitting unmappable property");
            continue;
        };
        let field_name = graphql_name(key);
        if object.fields.iter().any(|f| f.name == field_name) {
            debug!(object = %type_name, property = %key, "Property name collides after sanitizing, omitting");
            continue;
        }
        object
            .fields
            .push(FieldDef::new(field_name, ty).with_source_key(key.clone()));
    }
    object
}

/// Types a query field from its `200` schema, synthesizing an object type
/// named `Capitalize(fieldName)` for inline object schemas.
fn response_type(
    template: &str,
    field_name: &str,
    schema: &PropertyDescriptor,
    fragment: &mut SchemaFragment,
) -> Result<OutputType, TranslateError> {
    // The `id` rule applies to properties, never to a whole response.
    if let Some(ty) = map_output_type("", schema) {
        return Ok(ty);
    }

    let (properties, listed) = match schema {
        PropertyDescriptor::Object(properties) => (properties, false),
        PropertyDescriptor::Array(items) => match items.as_ref() {
            PropertyDescriptor::Object(properties) => (properties, true),
            _ => {
                return Err(TranslateError::UnmappableResponse {
                    path: template.to_string(),
                });
            }
        },
        _ => {
            return Err(TranslateError::UnmappableResponse {
                path: template.to_string(),
            });
        }
    };

    let type_name = capitalize(field_name);
    debug!(path = %template, object = %type_name, "Synthesizing type for inline response schema");
    fragment.object_types.push(object_type(&type_name, properties));

    let named = OutputType::Named(type_name);
    Ok(if listed {
        OutputType::List(Box::new(named))
    } else {
        named
    })
}

fn query_field(field_name: &str, ty: OutputType, operation: &Operation) -> FieldDef {
    let mut field = FieldDef::new(field_name, ty);
    for parameter in &operation.parameters {
        let Some(input) = map_input_type(parameter) else {
            trace!(field = %field_name, parameter = %parameter.name, "Omitting unmappable parameter");
            continue;
        };
        let argument = graphql_name(&parameter.name);
        if field.arguments.iter().any(|a| a.name == argument) {
            continue;
        }
        field = field.with_argument(ArgumentDef::new(argument, input));
    }
    if let Some(summary) = &operation.summary {
        field = field.with_description(summary.clone());
    }
    field
}
