//! Error types for the cluster access layer.

use thiserror::Error;

/// Errors surfaced by [`crate::ClusterClient`] implementations.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The requested object does not exist
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A version-checked write lost against a newer revision
    #[error("write conflict: {0}")]
    Conflict(String),

    /// Transport or API-server failure
    #[error("Kubernetes API error: {0}")]
    Api(String),
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(response) if response.code == 404 => {
                Self::NotFound(response.message.clone())
            }
            kube::Error::Api(response) if response.code == 409 => {
                Self::Conflict(response.message.clone())
            }
            _ => Self::Api(err.to_string()),
        }
    }
}
