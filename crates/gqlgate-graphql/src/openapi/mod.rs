//! API description model.
//!
//! An [`ApiDescription`] is the normalized, immutable form of one REST
//! service's OpenAPI/Swagger document: where the service lives, the models it
//! defines and the `GET` operations it exposes. Both Swagger 2.0 and
//! OpenAPI 3.x documents, in JSON or YAML, normalize into the same model.
//!
//! ## Components
//!
//! - [`ApiDescription`] - Normalized description owned by the registry
//! - [`PropertyDescriptor`] - Tagged type descriptor for properties and schemas
//! - [`DescriptionLoader`] - Retrieves descriptions from URLs or files

mod document;
mod loader;

use indexmap::IndexMap;

pub use loader::{DescriptionLoader, DynDescriptionLoader, HttpDescriptionLoader};

/// Errors raised while retrieving or parsing an API description.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    /// The document could not be fetched.
    #[error("Failed to fetch API description from {location}: {message}")]
    Fetch {
        /// Where the document was requested from.
        location: String,
        /// Underlying transport error.
        message: String,
    },

    /// The document server answered with a non-success status.
    #[error("Fetching API description from {location} returned HTTP {status}")]
    HttpStatus {
        /// Where the document was requested from.
        location: String,
        /// HTTP status code.
        status: u16,
    },

    /// Reading a local document failed.
    #[error("Failed to read API description {location}: {source}")]
    Io {
        /// Local path of the document.
        location: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is neither valid JSON nor valid YAML.
    #[error("Failed to parse API description: {0}")]
    Parse(String),

    /// The document declares neither `swagger` nor `openapi`.
    #[error("Document is not a Swagger 2.0 or OpenAPI 3.x description")]
    UnknownFormat,
}

/// Declared kind of a scalar schema (`type: string`, `type: integer`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Any other declared type, kept verbatim (`file`, `null`, a vendor type).
    Other(String),
}

impl ScalarKind {
    /// Classifies a declared `type` value.
    pub fn from_declared(kind: &str) -> Self {
        match kind {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Type descriptor of a property or schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyDescriptor {
    /// A scalar with its declared kind.
    Scalar(ScalarKind),
    /// A by-name reference to a model definition (`#/definitions/Book` -> `Book`).
    Reference(String),
    /// An array of elements.
    Array(Box<PropertyDescriptor>),
    /// An inline object schema with its own properties.
    Object(IndexMap<String, PropertyDescriptor>),
}

/// Where an operation parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Body,
    Query,
    Header,
    FormData,
    Cookie,
}

impl ParameterLocation {
    /// Parses the `in` field of a parameter object.
    pub fn from_declared(location: &str) -> Option<Self> {
        match location {
            "path" => Some(Self::Path),
            "body" => Some(Self::Body),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "formData" => Some(Self::FormData),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// One operation parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    /// Declared type; for body parameters this is the request body schema.
    pub descriptor: Option<PropertyDescriptor>,
}

/// One declared response of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub schema: Option<PropertyDescriptor>,
}

/// A `GET` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code as written (`"200"`, `"404"`, `"default"`).
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    /// Returns the schema of the `200` response, if declared.
    pub fn success_schema(&self) -> Option<&PropertyDescriptor> {
        self.responses.get("200").and_then(|r| r.schema.as_ref())
    }

    /// Returns the names of path parameters in declaration order.
    pub fn path_parameter_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
            .map(|p| p.name.clone())
            .collect()
    }
}

/// Operations available under one path template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathItem {
    pub get: Option<Operation>,
    /// Methods other than `GET` declared on the path (`post`, `delete`, ...).
    pub ignored_methods: Vec<&'static str>,
}

/// Properties of one model definition, in document order.
pub type ModelDefinition = IndexMap<String, PropertyDescriptor>;

/// Normalized description of one REST service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiDescription {
    /// Title from the `info` block.
    pub title: Option<String>,
    /// URL scheme (`http`, `https`) if the document declares one.
    pub scheme: Option<String>,
    /// Host with optional port (`books.internal:8080`).
    pub host: Option<String>,
    /// Base path prefixed to every path template (may be empty).
    pub base_path: String,
    pub definitions: IndexMap<String, ModelDefinition>,
    pub paths: IndexMap<String, PathItem>,
}

impl ApiDescription {
    /// Parses a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, DescriptionError> {
        let raw: document::RawDocument =
            serde_json::from_str(source).map_err(|e| DescriptionError::Parse(e.to_string()))?;
        raw.normalize()
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, DescriptionError> {
        let raw: document::RawDocument =
            serde_yaml::from_str(source).map_err(|e| DescriptionError::Parse(e.to_string()))?;
        raw.normalize()
    }

    /// Parses a document, trying JSON first and falling back to YAML.
    pub fn parse(bytes: &[u8]) -> Result<Self, DescriptionError> {
        let source = std::str::from_utf8(bytes)
            .map_err(|e| DescriptionError::Parse(format!("document is not UTF-8: {e}")))?;
        match Self::from_json_str(source) {
            Ok(description) => Ok(description),
            Err(DescriptionError::Parse(json_err)) => {
                Self::from_yaml_str(source).map_err(|yaml_err| match yaml_err {
                    DescriptionError::Parse(yaml_msg) => DescriptionError::Parse(format!(
                        "not valid JSON ({json_err}) or YAML ({yaml_msg})"
                    )),
                    other => other,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Fills scheme and host from the URL the document was fetched from
    /// when the document itself does not declare them.
    pub fn with_origin_defaults(mut self, origin: &url::Url) -> Self {
        if self.host.is_none() {
            self.host = origin.host_str().map(|host| match origin.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            });
        }
        if self.scheme.is_none() && matches!(origin.scheme(), "http" | "https") {
            self.scheme = Some(origin.scheme().to_string());
        }
        self
    }
}
