//! Error types for gateway operations.
//!
//! [`GatewayError`] is returned by registry changes and schema compilation.
//! It carries the HTTP status and error code the registry endpoints respond
//! with. Field-level failures during query execution are
//! [`ResolveError`](crate::resolvers::ResolveError)s instead and never reach
//! this type.

use std::fmt;

use crate::openapi::DescriptionError;
use crate::schema::TranslateError;

/// Errors that can occur while changing or compiling the composed schema.
#[derive(Debug)]
pub enum GatewayError {
    /// The API description could not be retrieved or parsed.
    Description(DescriptionError),

    /// A service's description could not be translated.
    Translate {
        /// Name the service was registered under.
        service: String,
        /// Translation failure.
        source: TranslateError,
    },

    /// The composed schema failed to compile.
    SchemaBuildFailed(String),

    /// The request to the gateway itself is malformed.
    InvalidRequest(String),

    /// Internal error.
    Internal(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Description(err) => write!(f, "{err}"),
            Self::Translate { service, source } => {
                write!(f, "Cannot translate service '{service}': {source}")
            }
            Self::SchemaBuildFailed(msg) => {
                write!(f, "Failed to build GraphQL schema: {msg}")
            }
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Description(err) => Some(err),
            Self::Translate { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Description(DescriptionError::Fetch { .. })
            | Self::Description(DescriptionError::HttpStatus { .. }) => 502,
            Self::Description(DescriptionError::Io { .. }) => 400,
            Self::Description(_) => 422,
            Self::Translate { .. } => 422,
            Self::SchemaBuildFailed(_) => 422,
            Self::InvalidRequest(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for error response bodies.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Description(DescriptionError::Fetch { .. })
            | Self::Description(DescriptionError::HttpStatus { .. })
            | Self::Description(DescriptionError::Io { .. }) => "DESCRIPTION_UNAVAILABLE",
            Self::Description(_) => "INVALID_DESCRIPTION",
            Self::Translate { .. } => "TRANSLATION_FAILED",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::InvalidRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Renders the error as a JSON response body.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": [{
                "message": self.to_string(),
                "extensions": { "code": self.error_code() }
            }]
        })
    }
}

impl From<DescriptionError> for GatewayError {
    fn from(err: DescriptionError) -> Self {
        Self::Description(err)
    }
}
