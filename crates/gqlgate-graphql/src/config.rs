//! Gateway configuration.
//!
//! Configuration can be specified in `gqlgate.toml` under the `[gateway]` section.
//!
//! # Example Configuration
//!
//! ```toml
//! [gateway]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! request_timeout_ms = 10000
//! fetch_timeout_ms = 10000
//! default_scheme = "http"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::schema::{SchemaBuilderConfig, TranslateOptions};

/// Schema composition and downstream call configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Timeout of each downstream REST call made by a resolver, in milliseconds.
    /// Default: 10000
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Timeout for retrieving an API description, in milliseconds.
    /// Default: 10000
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Scheme for services whose description declares none.
    /// Default: "http"
    #[serde(default = "default_scheme")]
    pub default_scheme: String,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_scheme() -> String {
    "http".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            request_timeout_ms: default_request_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            default_scheme: default_scheme(),
        }
    }
}

impl GatewayConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("gateway.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("gateway.max_complexity must be > 0".into());
        }
        if self.request_timeout_ms == 0 {
            return Err("gateway.request_timeout_ms must be > 0".into());
        }
        if self.fetch_timeout_ms == 0 {
            return Err("gateway.fetch_timeout_ms must be > 0".into());
        }
        if !matches!(self.default_scheme.as_str(), "http" | "https") {
            return Err(format!(
                "gateway.default_scheme must be 'http' or 'https', got '{}'",
                self.default_scheme
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
        }
    }

    /// Builds the translation options, including the client shared by every
    /// REST resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn to_translate_options(&self) -> Result<TranslateOptions, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()?;
        Ok(TranslateOptions {
            client,
            default_scheme: self.default_scheme.clone(),
        })
    }
}
