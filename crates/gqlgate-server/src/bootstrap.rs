//! Registration of the services listed in the configuration.
//!
//! Runs once before the server starts listening. A service that fails to
//! load or translate is logged and skipped so the remaining services still
//! make it into the schema.

use gqlgate_graphql::ServiceRegistry;
use tracing::{info, warn};

use crate::config::ServiceEntry;

/// Registers each configured service in order. Returns how many succeeded.
pub async fn register_configured_services(
    registry: &ServiceRegistry,
    services: &[ServiceEntry],
) -> usize {
    let mut registered = 0;
    for entry in services {
        match registry.register_from_location(&entry.name, &entry.url).await {
            Ok(report) => {
                registered += 1;
                for rejected in &report.rejections {
                    warn!(service = %rejected.service, "{}", rejected.rejection);
                }
                info!(service = %entry.name, url = %entry.url, "Configured service registered");
            }
            Err(e) => {
                warn!(
                    service = %entry.name,
                    url = %entry.url,
                    error = %e,
                    "Skipping configured service"
                );
            }
        }
    }
    info!(
        registered,
        configured = services.len(),
        "Configured services processed"
    );
    registered
}
