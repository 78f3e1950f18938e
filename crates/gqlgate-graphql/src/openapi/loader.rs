//! Retrieval of API description documents.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiDescription, DescriptionError};

/// Retrieves and parses an API description from a location.
#[async_trait]
pub trait DescriptionLoader: Send + Sync {
    /// Loads the description found at `location` (a URL or a file path).
    async fn load(&self, location: &str) -> Result<ApiDescription, DescriptionError>;
}

/// Shared loader handle.
pub type DynDescriptionLoader = Arc<dyn DescriptionLoader>;

/// Loads descriptions over HTTP(S) with `reqwest`, or from the local
/// filesystem for `file://` URLs and plain paths.
#[derive(Debug, Clone)]
pub struct HttpDescriptionLoader {
    client: reqwest::Client,
}

impl HttpDescriptionLoader {
    /// Creates a loader whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DescriptionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DescriptionError::Fetch {
                location: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    async fn load_http(&self, url: Url) -> Result<ApiDescription, DescriptionError> {
        let location = url.to_string();
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json, application/yaml")
            .send()
            .await
            .map_err(|e| DescriptionError::Fetch {
                location: location.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DescriptionError::HttpStatus {
                location,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| DescriptionError::Fetch {
            location: location.clone(),
            message: e.to_string(),
        })?;
        debug!(%location, bytes = body.len(), "Fetched API description");

        Ok(ApiDescription::parse(&body)?.with_origin_defaults(&url))
    }

    async fn load_file(&self, path: &Path) -> Result<ApiDescription, DescriptionError> {
        let body = tokio::fs::read(path)
            .await
            .map_err(|source| DescriptionError::Io {
                location: path.display().to_string(),
                source,
            })?;
        debug!(path = %path.display(), bytes = body.len(), "Read API description");
        ApiDescription::parse(&body)
    }
}

#[async_trait]
impl DescriptionLoader for HttpDescriptionLoader {
    #[instrument(skip(self))]
    async fn load(&self, location: &str) -> Result<ApiDescription, DescriptionError> {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.load_http(url).await,
            Ok(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|()| DescriptionError::Fetch {
                    location: location.to_string(),
                    message: "invalid file URL".to_string(),
                })?;
                self.load_file(&path).await
            }
            Ok(url) => Err(DescriptionError::Fetch {
                location: location.to_string(),
                message: format!("unsupported URL scheme '{}'", url.scheme()),
            }),
            Err(_) => self.load_file(Path::new(location)).await,
        }
    }
}
