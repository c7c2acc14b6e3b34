//! HanaExpress Controller
//!
//! Reconciles HanaExpress custom resources into single-instance SAP HANA
//! Express databases: each resource is materialized as a StatefulSet with
//! one replica, a persistent data volume, and credential bootstrap from a
//! referenced secret. A finalizer ensures cleanup notification happens
//! before a resource is allowed to disappear.

mod backoff;
mod config;
mod controller;
mod error;
mod reconciler;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::{ConfigResolver, EnvConfig};
use crate::error::ControllerError;
use crate::reconciler::statefulset::IMAGE_CONFIG_KEY;
use controller::Controller;
use std::env;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting HanaExpress Controller");

    // Load configuration from environment variables
    let namespace = env::var("WATCH_NAMESPACE").ok();

    // The operand image is resolved on every reconcile pass; a missing value
    // degrades every instance, so also surface it at startup.
    if EnvConfig.get(IMAGE_CONFIG_KEY).is_none() {
        warn!(
            "{} is not set; reconciliation will fail until it is provided",
            IMAGE_CONFIG_KEY
        );
    }

    info!("Configuration:");
    info!("  Namespace: {}", namespace.as_deref().unwrap_or("default"));

    // Initialize and run controller
    let controller = Controller::new(namespace).await?;
    controller.run().await?;

    Ok(())
}
