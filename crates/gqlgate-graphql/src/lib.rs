//! # gqlgate-graphql
//!
//! Runtime composition of REST services into one GraphQL schema.
//!
//! Services are registered with their OpenAPI/Swagger description. Each
//! description is translated into a schema fragment: model definitions become
//! object types and `GET` paths become `Query` fields whose resolvers call the
//! service. The fragments of all registered services are merged, first
//! definition wins, and compiled into the schema served on `/graphql`.
//!
//! ## Endpoints
//!
//! - `POST /graphql` - Query the composed schema
//! - `GET /graphql/sdl` - Composed schema SDL
//! - `POST /registry` - Register a service `{ "name", "url" }`
//! - `DELETE /registry?name=` - Remove a service
//! - `GET /registry` - List services
//!
//! ## Configuration
//!
//! Add to `gqlgate.toml`:
//!
//! ```toml
//! [gateway]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! request_timeout_ms = 10000
//! ```
//!
//! ## Modules
//!
//! - [`openapi`] - API description model and loading
//! - [`schema`] - Type mapping, naming, translation and schema building
//! - [`resolvers`] - REST and property field resolvers
//! - [`registry`] - Registered services and the active schema
//! - [`handler`] - Axum HTTP handlers
//! - [`config`] - Configuration options
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod handler;
pub mod openapi;
pub mod registry;
pub mod resolvers;
pub mod schema;

// Re-export main types
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use handler::{GatewayState, router};
pub use openapi::ApiDescription;
pub use registry::{RebuildReport, ServiceRegistry, ServiceRejection};
pub use schema::{ComposedSchema, SchemaBuilder, SchemaBuilderConfig};
