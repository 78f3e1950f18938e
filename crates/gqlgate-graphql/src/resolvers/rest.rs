//! REST-backed query field resolver.
//!
//! Each query field derived from a path template gets a [`RestResolver`]
//! that substitutes the field's arguments into the template, performs one
//! `GET` and returns the decoded JSON body.

use async_graphql::dynamic::ResolverContext;
use async_graphql::{ErrorExtensions, Value};
use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::{debug, warn};

use super::{FieldResolver, json_to_graphql_value};
use crate::openapi::Operation;
use crate::schema::graphql_name;

/// Errors raised while resolving a REST-backed field.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A path parameter had no argument value.
    #[error("Missing required argument '{0}'")]
    MissingArgument(String),

    /// An argument value cannot be placed in a URL path.
    #[error("Argument '{0}' cannot be used as a path segment")]
    InvalidArgument(String),

    /// The request could not be sent or the connection failed.
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The downstream service did not answer in time.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// The downstream service answered with a non-success status.
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body is not JSON.
    #[error("Response from {url} is not valid JSON: {message}")]
    Decode { url: String, message: String },
}

impl ResolveError {
    /// Returns the value of the `code` error extension.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument(_) => "MISSING_ARGUMENT",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Request { .. } => "DOWNSTREAM_UNAVAILABLE",
            Self::Timeout { .. } => "DOWNSTREAM_TIMEOUT",
            Self::Status { .. } => "DOWNSTREAM_ERROR",
            Self::Decode { .. } => "DOWNSTREAM_INVALID_RESPONSE",
        }
    }
}

impl ErrorExtensions for ResolveError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            if let Self::Status { status, .. } = self {
                e.set("status", i32::from(*status));
            }
        })
    }
}

/// Resolver performing a `GET` against `<base><basePath><path>`.
#[derive(Debug, Clone)]
pub struct RestResolver {
    client: reqwest::Client,
    /// Joined URL with `{param}` tokens left in place.
    url_template: String,
    /// Path parameters in declaration order.
    path_parameters: Vec<PathParameter>,
}

/// A `{name}` token and the field argument that supplies it.
#[derive(Debug, Clone)]
struct PathParameter {
    name: String,
    argument: String,
}

impl RestResolver {
    /// Creates a resolver for `path_template` of a service rooted at
    /// `base_url` (`scheme://host[:port]`).
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        base_path: &str,
        path_template: &str,
        operation: &Operation,
    ) -> Self {
        Self {
            client,
            url_template: join_url(&[base_url, base_path, path_template]),
            path_parameters: operation
                .path_parameter_names()
                .into_iter()
                .map(|name| PathParameter {
                    argument: graphql_name(&name),
                    name,
                })
                .collect(),
        }
    }

    /// URL with `{param}` tokens unsubstituted.
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Builds the request URL from argument values keyed by parameter name.
    ///
    /// Every declared path parameter must have a value; each `{name}` token
    /// is replaced by the percent-encoded value.
    pub fn request_url(&self, arguments: &IndexMap<String, String>) -> Result<String, ResolveError> {
        let mut url = self.url_template.clone();
        for PathParameter { name, .. } in &self.path_parameters {
            let value = arguments
                .get(name)
                .ok_or_else(|| ResolveError::MissingArgument(name.clone()))?;
            url = url.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
        }
        Ok(url)
    }

    /// Performs the `GET` and decodes the body. An empty body decodes to null.
    pub async fn fetch(&self, url: &str) -> Result<serde_json::Value, ResolveError> {
        debug!(%url, "Calling downstream service");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolveError::Timeout { url: url.to_string() }
                } else {
                    ResolveError::Request {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ResolveError::Timeout { url: url.to_string() }
            } else {
                ResolveError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| ResolveError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn collect_arguments(
        &self,
        ctx: &ResolverContext<'_>,
    ) -> Result<IndexMap<String, String>, ResolveError> {
        let mut arguments = IndexMap::with_capacity(self.path_parameters.len());
        for PathParameter { name, argument } in &self.path_parameters {
            let Some(accessor) = ctx.args.get(argument) else {
                continue;
            };
            let rendered = match accessor.as_value() {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Boolean(b) => b.to_string(),
                Value::Enum(e) => e.to_string(),
                _ => return Err(ResolveError::InvalidArgument(name.clone())),
            };
            arguments.insert(name.clone(), rendered);
        }
        Ok(arguments)
    }
}

#[async_trait]
impl FieldResolver for RestResolver {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> async_graphql::Result<Option<Value>> {
        let result = async {
            let arguments = self.collect_arguments(&ctx)?;
            let url = self.request_url(&arguments)?;
            self.fetch(&url).await
        }
        .await;

        match result {
            Ok(body) => Ok(Some(json_to_graphql_value(body))),
            Err(e) => {
                warn!(
                    field = %ctx.field().name(),
                    url_template = %self.url_template,
                    code = e.code(),
                    error = %e,
                    "Field resolution failed"
                );
                Err(e.extend())
            }
        }
    }
}

/// Joins URL parts, collapsing a doubled `/` at each join boundary and
/// inserting one where neither side has it. Slashes inside a part are kept.
pub(crate) fn join_url(parts: &[&str]) -> String {
    let mut url = String::new();
    for part in parts.iter().copied().filter(|p| !p.is_empty()) {
        match (url.ends_with('/'), part.starts_with('/')) {
            (true, true) => url.push_str(&part[1..]),
            (false, false) if !url.is_empty() => {
                url.push('/');
                url.push_str(part);
            }
            _ => url.push_str(part),
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::{Parameter, ParameterLocation, PropertyDescriptor, ScalarKind};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn operation(path_parameters: &[&str]) -> Operation {
        Operation {
            parameters: path_parameters
                .iter()
                .map(|name| Parameter {
                    name: name.to_string(),
                    location: ParameterLocation::Path,
                    descriptor: Some(PropertyDescriptor::Scalar(ScalarKind::String)),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn args(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url(&["http://h", "/", "/books"]), "http://h/books");
        assert_eq!(join_url(&["http://h", "/api/", "/books"]), "http://h/api/books");
        assert_eq!(join_url(&["http://h", "", "/books"]), "http://h/books");
        assert_eq!(join_url(&["http://h", "api", "books"]), "http://h/api/books");
        assert_eq!(join_url(&["http://h", "/api", "/a//b"]), "http://h/api/a//b");
    }

    #[test]
    fn test_request_url_substitutes_path_parameter() {
        let resolver = RestResolver::new(
            reqwest::Client::new(),
            "http://catalog.local",
            "/",
            "/books/{id}",
            &operation(&["id"]),
        );
        assert_eq!(resolver.url_template(), "http://catalog.local/books/{id}");
        assert_eq!(
            resolver.request_url(&args(&[("id", "42")])).unwrap(),
            "http://catalog.local/books/42"
        );
    }

    #[test]
    fn test_request_url_substitutes_every_parameter() {
        let resolver = RestResolver::new(
            reqwest::Client::new(),
            "http://h",
            "/v1",
            "/shelves/{shelfId}/books/{bookId}",
            &operation(&["shelfId", "bookId"]),
        );
        let url = resolver
            .request_url(&args(&[("bookId", "7"), ("shelfId", "a b/c")]))
            .unwrap();
        assert_eq!(url, "http://h/v1/shelves/a%20b%2Fc/books/7");
    }

    #[test]
    fn test_request_url_missing_argument() {
        let resolver = RestResolver::new(
            reqwest::Client::new(),
            "http://h",
            "",
            "/books/{id}",
            &operation(&["id"]),
        );
        let err = resolver.request_url(&IndexMap::new()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingArgument(ref name) if name == "id"));
        assert_eq!(err.code(), "MISSING_ARGUMENT");
    }

    #[test]
    fn test_error_extension_code() {
        let err = ResolveError::Status {
            url: "http://h/books/1".into(),
            status: 503,
        }
        .extend();
        let extensions = err.extensions.unwrap();
        assert_eq!(
            extensions.get("code"),
            Some(&Value::String("DOWNSTREAM_ERROR".into()))
        );
        assert_eq!(extensions.get("status"), Some(&Value::Number(503.into())));
    }

    #[tokio::test]
    async fn test_fetch_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books/42"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 42,
                "title": "Dune"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = RestResolver::new(
            reqwest::Client::new(),
            &server.uri(),
            "/",
            "/books/{id}",
            &operation(&["id"]),
        );
        let url = resolver.request_url(&args(&[("id", "42")])).unwrap();
        let body = resolver.fetch(&url).await.unwrap();
        assert_eq!(body["title"], "Dune");
    }

    #[tokio::test]
    async fn test_fetch_maps_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let resolver = RestResolver::new(
            reqwest::Client::new(),
            &server.uri(),
            "",
            "/unused",
            &operation(&[]),
        );

        let err = resolver
            .fetch(&format!("{}/broken", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Status { status: 500, .. }));

        let err = resolver
            .fetch(&format!("{}/garbage", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Decode { .. }));

        let body = resolver
            .fetch(&format!("{}/empty", server.uri()))
            .await
            .unwrap();
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(50))
            .build()
            .unwrap();
        let resolver = RestResolver::new(client, &server.uri(), "", "/slow", &operation(&[]));
        let err = resolver
            .fetch(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Timeout { .. }));
    }
}
