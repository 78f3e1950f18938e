pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig, ServiceEntry};
pub use observability::{init_tracing, shutdown_tracing};
pub use server::{GatewayServer, ServerBuilder, build_app};
