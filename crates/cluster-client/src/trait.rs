//! ClusterClient trait for mocking
//!
//! Abstracts the Kubernetes API surface the reconciler depends on, so unit
//! tests can run against an in-memory implementation instead of a cluster.

use crate::error::ClusterError;
use crds::HanaExpress;
use k8s_openapi::api::apps::v1::StatefulSet;

/// Cluster operations consumed by the reconciler
///
/// All async methods must be `Send` to work with Tokio's work-stealing
/// runtime. Writes to the HanaExpress resource are conditioned on the
/// `resource_version` carried by the passed object; callers must re-fetch
/// after a successful write before writing the same object again.
#[async_trait::async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch a HanaExpress by name, `None` when it does not exist
    async fn get_hana_express(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<HanaExpress>, ClusterError>;

    /// Version-checked replacement of the main resource (spec + metadata)
    async fn update_hana_express(&self, hana: &HanaExpress) -> Result<(), ClusterError>;

    /// Version-checked replacement of the status subresource
    async fn update_hana_express_status(&self, hana: &HanaExpress) -> Result<(), ClusterError>;

    /// Fetch the owned StatefulSet, `None` when it does not exist
    async fn get_stateful_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<StatefulSet>, ClusterError>;

    /// Create the StatefulSet
    async fn create_stateful_set(&self, sts: &StatefulSet) -> Result<(), ClusterError>;

    /// Replace the StatefulSet
    async fn update_stateful_set(&self, sts: &StatefulSet) -> Result<(), ClusterError>;

    /// Publish a Kubernetes event attributed to the given resource
    async fn publish_event(
        &self,
        hana: &HanaExpress,
        event_type: &str,
        reason: &str,
        message: &str,
    ) -> Result<(), ClusterError>;
}
