//! Raw serde model of Swagger 2.0 and OpenAPI 3.x documents.
//!
//! Only the parts the gateway consumes are modelled; everything else in the
//! document is ignored. [`RawDocument::normalize`] folds both dialects into
//! an [`ApiDescription`].

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, IgnoredAny, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, trace};

use super::{
    ApiDescription, DescriptionError, Operation, Parameter, ParameterLocation, PathItem,
    PropertyDescriptor, Response, ScalarKind,
};

/// Media types tried, in order, when picking a response schema from `content`.
const JSON_MEDIA_TYPES: [&str; 2] = ["application/json", "*/*"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawDocument {
    /// Version markers; YAML may write them as numbers (`openapi: 3.1`).
    swagger: Option<serde_json::Value>,
    openapi: Option<serde_json::Value>,
    info: Option<RawInfo>,
    host: Option<String>,
    base_path: Option<String>,
    #[serde(default)]
    schemes: Vec<String>,
    #[serde(default)]
    servers: Vec<RawServer>,
    #[serde(default)]
    definitions: IndexMap<String, RawSchema>,
    /// Swagger 2.0 shared parameters (`#/parameters/X`).
    #[serde(default)]
    parameters: IndexMap<String, RawParameter>,
    components: Option<RawComponents>,
    #[serde(default)]
    paths: IndexMap<String, RawPathItem>,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawComponents {
    #[serde(default)]
    schemas: IndexMap<String, RawSchema>,
    #[serde(default)]
    parameters: IndexMap<String, RawParameter>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPathItem {
    get: Option<RawOperation>,
    put: Option<IgnoredAny>,
    post: Option<IgnoredAny>,
    delete: Option<IgnoredAny>,
    patch: Option<IgnoredAny>,
    options: Option<IgnoredAny>,
    head: Option<IgnoredAny>,
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    operation_id: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(default)]
    responses: IndexMap<StatusKey, RawResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawParameter {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    name: Option<String>,
    #[serde(rename = "in")]
    location: Option<String>,
    #[serde(rename = "type")]
    kind: Option<RawType>,
    items: Option<Box<RawSchema>>,
    schema: Option<RawSchema>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    schema: Option<RawSchema>,
    #[serde(default)]
    content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Deserialize)]
struct RawMediaType {
    schema: Option<RawSchema>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSchema {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "type")]
    kind: Option<RawType>,
    items: Option<Box<RawSchema>>,
    #[serde(default)]
    properties: IndexMap<String, RawSchema>,
}

/// `type` is a string, or a list of strings in OpenAPI 3.1.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawType {
    Single(String),
    Multiple(Vec<String>),
}

impl RawType {
    /// Returns the first non-`null` type.
    fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(kind) => Some(kind.as_str()),
            Self::Multiple(kinds) => kinds.iter().map(String::as_str).find(|k| *k != "null"),
        }
    }
}

/// Response map key. YAML documents often write status codes as integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StatusKey(String);

impl<'de> Deserialize<'de> for StatusKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusKeyVisitor;

        impl Visitor<'_> for StatusKeyVisitor {
            type Value = StatusKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an HTTP status code or `default`")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<StatusKey, E> {
                Ok(StatusKey(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<StatusKey, E> {
                Ok(StatusKey(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<StatusKey, E> {
                Ok(StatusKey(value.to_string()))
            }
        }

        deserializer.deserialize_any(StatusKeyVisitor)
    }
}

/// Reduces `#/definitions/Book` or `#/components/schemas/Book` to `Book`.
fn simple_ref(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

impl RawSchema {
    fn normalize(&self) -> PropertyDescriptor {
        if let Some(reference) = &self.reference {
            return PropertyDescriptor::Reference(simple_ref(reference).to_string());
        }

        match self.kind.as_ref().and_then(RawType::primary) {
            Some("array") => PropertyDescriptor::Array(Box::new(
                self.items
                    .as_ref()
                    .map(|items| items.normalize())
                    .unwrap_or_else(|| PropertyDescriptor::Scalar(ScalarKind::Other("any".into()))),
            )),
            Some("object") => PropertyDescriptor::Object(self.normalize_properties()),
            Some(kind) => PropertyDescriptor::Scalar(ScalarKind::from_declared(kind)),
            None if !self.properties.is_empty() => {
                PropertyDescriptor::Object(self.normalize_properties())
            }
            None => PropertyDescriptor::Scalar(ScalarKind::Other("any".into())),
        }
    }

    fn normalize_properties(&self) -> IndexMap<String, PropertyDescriptor> {
        self.properties
            .iter()
            .map(|(name, schema)| (name.clone(), schema.normalize()))
            .collect()
    }
}

impl RawDocument {
    /// Folds the raw document into an [`ApiDescription`].
    pub(super) fn normalize(self) -> Result<ApiDescription, DescriptionError> {
        let (scheme, host, base_path) = match (&self.swagger, &self.openapi) {
            (Some(version), _) => {
                trace!(%version, "Normalizing Swagger document");
                (
                    self.schemes.first().cloned(),
                    self.host.clone(),
                    self.base_path.clone().unwrap_or_default(),
                )
            }
            (None, Some(version)) => {
                trace!(%version, "Normalizing OpenAPI document");
                self.servers
                    .first()
                    .map(|server| split_server_url(&server.url))
                    .unwrap_or_default()
            }
            (None, None) => return Err(DescriptionError::UnknownFormat),
        };

        let components = self.components.unwrap_or_default();
        let shared_parameters: IndexMap<String, RawParameter> = self
            .parameters
            .into_iter()
            .chain(components.parameters)
            .collect();

        let definitions = self
            .definitions
            .iter()
            .chain(components.schemas.iter())
            .map(|(name, schema)| (name.clone(), schema.normalize_properties()))
            .collect();

        let paths = self
            .paths
            .into_iter()
            .map(|(template, item)| {
                let normalized = normalize_path_item(&template, item, &shared_parameters);
                (template, normalized)
            })
            .collect();

        Ok(ApiDescription {
            title: self.info.and_then(|info| info.title),
            scheme,
            host,
            base_path,
            definitions,
            paths,
        })
    }
}

/// Splits an OpenAPI 3 server URL into scheme, host and base path.
/// Relative server URLs only contribute a base path.
fn split_server_url(server_url: &str) -> (Option<String>, Option<String>, String) {
    match url::Url::parse(server_url) {
        Ok(parsed) => {
            let host = parsed.host_str().map(|host| match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            });
            let path = parsed.path().trim_end_matches('/').to_string();
            (Some(parsed.scheme().to_string()), host, path)
        }
        Err(_) => (None, None, server_url.trim_end_matches('/').to_string()),
    }
}

fn normalize_path_item(
    template: &str,
    item: RawPathItem,
    shared: &IndexMap<String, RawParameter>,
) -> PathItem {
    let ignored_methods: Vec<&'static str> = [
        ("put", item.put.is_some()),
        ("post", item.post.is_some()),
        ("delete", item.delete.is_some()),
        ("patch", item.patch.is_some()),
        ("options", item.options.is_some()),
        ("head", item.head.is_some()),
    ]
    .into_iter()
    .filter_map(|(method, present)| present.then_some(method))
    .collect();

    if !ignored_methods.is_empty() {
        debug!(path = %template, methods = ?ignored_methods, "Ignoring non-GET operations");
    }

    let get = item.get.map(|operation| {
        // Path-level parameters apply unless the operation redeclares them.
        let mut parameters: Vec<Parameter> = Vec::new();
        for raw in operation.parameters.iter().chain(item.parameters.iter()) {
            let Some(parameter) = resolve_parameter(raw, shared) else {
                continue;
            };
            let redeclared = parameters
                .iter()
                .any(|p| p.name == parameter.name && p.location == parameter.location);
            if !redeclared {
                parameters.push(parameter);
            }
        }

        let responses = operation
            .responses
            .into_iter()
            .map(|(StatusKey(status), response)| (status, normalize_response(response)))
            .collect();

        Operation {
            operation_id: operation.operation_id,
            summary: operation.summary,
            parameters,
            responses,
        }
    });

    PathItem {
        get,
        ignored_methods,
    }
}

fn resolve_parameter(
    raw: &RawParameter,
    shared: &IndexMap<String, RawParameter>,
) -> Option<Parameter> {
    let raw = match &raw.reference {
        Some(reference) => match shared.get(simple_ref(reference)) {
            Some(target) => target,
            None => {
                debug!(reference = %reference, "Skipping unresolvable parameter reference");
                return None;
            }
        },
        None => raw,
    };

    let name = raw.name.clone()?;
    let Some(location) = raw.location.as_deref().and_then(ParameterLocation::from_declared) else {
        debug!(parameter = %name, location = ?raw.location, "Skipping parameter with unknown location");
        return None;
    };

    let descriptor = match (&raw.schema, &raw.kind) {
        (Some(schema), _) => Some(schema.normalize()),
        (None, Some(kind)) => kind.primary().map(|kind| {
            if kind == "array" {
                let items = raw
                    .items
                    .as_ref()
                    .map(|items| items.normalize())
                    .unwrap_or_else(|| PropertyDescriptor::Scalar(ScalarKind::Other("any".into())));
                PropertyDescriptor::Array(Box::new(items))
            } else {
                PropertyDescriptor::Scalar(ScalarKind::from_declared(kind))
            }
        }),
        (None, None) => None,
    };

    Some(Parameter {
        name,
        location,
        descriptor,
    })
}

fn normalize_response(response: RawResponse) -> Response {
    let schema = response.schema.map(|schema| schema.normalize()).or_else(|| {
        JSON_MEDIA_TYPES
            .iter()
            .find_map(|media| response.content.get(*media))
            .or_else(|| {
                response
                    .content
                    .iter()
                    .find(|(media, _)| media.contains("json"))
                    .map(|(_, value)| value)
            })
            .or_else(|| response.content.values().next())
            .and_then(|media| media.schema.as_ref())
            .map(RawSchema::normalize)
    });

    Response { schema }
}
