//! Service registry with atomic schema publication.
//!
//! The registry owns the registered service descriptions and the active
//! [`ComposedSchema`]. Every change replays all descriptions, in registration
//! order, through translation and a fresh [`SchemaBuilder`], then swaps the
//! result in. Readers load the active schema without locking and always see
//! either the complete old schema or the complete new one.
//!
//! # Usage
//!
//! ```ignore
//! let registry = ServiceRegistry::new(&GatewayConfig::default())?;
//! registry
//!     .register_from_location("catalog", "http://catalog:8080/v2/api-docs")
//!     .await?;
//!
//! let schema = registry.current_schema();
//! let response = schema.execute("{ booksById(id: \"42\") { title } }").await;
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::openapi::{ApiDescription, DynDescriptionLoader, HttpDescriptionLoader};
use crate::schema::{
    ComposedSchema, Rejection, SchemaBuilder, SchemaBuilderConfig, TranslateOptions, translate,
};

/// A definition of `service` refused during a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRejection {
    pub service: String,
    pub rejection: Rejection,
}

/// Outcome of a successful rebuild.
#[derive(Debug, Clone, Default)]
pub struct RebuildReport {
    /// Services in the new schema, in registration order.
    pub services: Vec<String>,
    /// Definitions that lost to an earlier service's definition.
    pub rejections: Vec<ServiceRejection>,
}

/// Registered services and the schema composed from them.
pub struct ServiceRegistry {
    /// Serializes writers; readers never touch it.
    services: Mutex<IndexMap<String, Arc<ApiDescription>>>,
    active: ArcSwap<ComposedSchema>,
    schema_config: SchemaBuilderConfig,
    translate_options: TranslateOptions,
    loader: DynDescriptionLoader,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.list_service_names())
            .field("schema_config", &self.schema_config)
            .finish_non_exhaustive()
    }
}

impl ServiceRegistry {
    /// Creates an empty registry whose schema exposes only `_health`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be built or the empty
    /// schema fails to compile.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let translate_options = config
            .to_translate_options()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))?;
        let loader: DynDescriptionLoader = Arc::new(HttpDescriptionLoader::new(config.fetch_timeout())?);
        Self::with_parts(config.to_schema_builder_config(), translate_options, loader)
    }

    /// Creates an empty registry from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty schema fails to compile.
    pub fn with_parts(
        schema_config: SchemaBuilderConfig,
        translate_options: TranslateOptions,
        loader: DynDescriptionLoader,
    ) -> Result<Self, GatewayError> {
        let empty = SchemaBuilder::new().compile(&schema_config)?;
        Ok(Self {
            services: Mutex::new(IndexMap::new()),
            active: ArcSwap::from_pointee(empty),
            schema_config,
            translate_options,
            loader,
        })
    }

    /// Replaces the description loader.
    pub fn with_loader(mut self, loader: DynDescriptionLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Registers or replaces a service and publishes the rebuilt schema.
    ///
    /// A replaced service keeps its original registration position. If the
    /// rebuild fails, neither the service set nor the active schema changes.
    #[instrument(skip(self, description))]
    pub async fn register(
        &self,
        name: &str,
        description: ApiDescription,
    ) -> Result<RebuildReport, GatewayError> {
        let mut services = self.services.lock().await;

        let mut candidate = services.clone();
        let replaced = candidate
            .insert(name.to_string(), Arc::new(description))
            .is_some();

        let (schema, report) = self.rebuild(&candidate)?;
        *services = candidate;
        self.active.store(Arc::new(schema));

        info!(
            replaced,
            services = report.services.len(),
            rejections = report.rejections.len(),
            "Service registered"
        );
        Ok(report)
    }

    /// Loads the description at `location` and registers it under `name`.
    pub async fn register_from_location(
        &self,
        name: &str,
        location: &str,
    ) -> Result<RebuildReport, GatewayError> {
        let description = self.loader.load(location).await.map_err(|e| {
            warn!(service = %name, %location, error = %e, "Failed to load API description");
            GatewayError::from(e)
        })?;
        self.register(name, description).await
    }

    /// Removes a service, if registered, and publishes the rebuilt schema.
    #[instrument(skip(self))]
    pub async fn unregister(&self, name: &str) -> Result<RebuildReport, GatewayError> {
        let mut services = self.services.lock().await;

        let mut candidate = services.clone();
        let removed = candidate.shift_remove(name).is_some();

        let (schema, report) = self.rebuild(&candidate)?;
        *services = candidate;
        self.active.store(Arc::new(schema));

        info!(removed, services = report.services.len(), "Service unregistered");
        Ok(report)
    }

    /// Returns the active schema. Never blocks and never rebuilds.
    pub fn current_schema(&self) -> Arc<ComposedSchema> {
        self.active.load_full()
    }

    /// Names of the services in the active schema, in registration order.
    pub fn list_service_names(&self) -> Vec<String> {
        self.active.load().service_names().to_vec()
    }

    pub fn service_count(&self) -> usize {
        self.active.load().service_names().len()
    }

    fn rebuild(
        &self,
        services: &IndexMap<String, Arc<ApiDescription>>,
    ) -> Result<(ComposedSchema, RebuildReport), GatewayError> {
        let mut builder = SchemaBuilder::new();
        let mut report = RebuildReport::default();

        for (name, description) in services {
            let fragment = translate(description, &self.translate_options).map_err(|source| {
                warn!(service = %name, error = %source, "Failed to translate API description");
                GatewayError::Translate {
                    service: name.clone(),
                    source,
                }
            })?;

            report.rejections.extend(
                builder
                    .add_fragment(fragment)
                    .into_iter()
                    .map(|rejection| ServiceRejection {
                        service: name.clone(),
                        rejection,
                    }),
            );
            report.services.push(name.clone());
        }

        let schema = builder
            .compile(&self.schema_config)?
            .with_service_names(report.services.clone());
        Ok((schema, report))
    }
}
