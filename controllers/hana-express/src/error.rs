//! Controller-specific error types.

use cluster_client::ClusterError;
use thiserror::Error;

/// Errors that can occur in the HanaExpress controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes access error
    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// A required configuration value could not be resolved
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// A watched object is missing required metadata
    #[error("invalid resource: {0}")]
    InvalidResource(String),
}
