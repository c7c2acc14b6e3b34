//! Reconciliation logic for HanaExpress resources.
//!
//! The loop is level-triggered and idempotent: every pass re-reads the
//! world, converges the owned StatefulSet toward the declared state, and
//! reports the outcome through status conditions. Writes to the custom
//! resource are version-checked, so each successful write is followed by a
//! re-fetch before the next write to the same object.

pub mod finalize;
pub mod statefulset;

#[cfg(test)]
mod reconcile_test;

use crate::config::ConfigResolver;
use crate::error::ControllerError;
use cluster_client::{ClusterClient, ClusterError};
use crds::{Condition, ConditionStatus, HanaExpress};
use std::time::Duration;
use tracing::{debug, error, info};

/// Finalizer token guarding cleanup before deletion
pub const HANA_EXPRESS_FINALIZER: &str = "db.sap-redhat.io/finalizer";

/// Condition tracking StatefulSet reconciliation
pub(crate) const TYPE_AVAILABLE: &str = "Available";
/// Condition tracking finalizer progress while the resource is deleted
pub(crate) const TYPE_DEGRADED: &str = "Degraded";

/// Delay before verifying an asynchronously created StatefulSet
const CREATION_REQUEUE_DELAY: Duration = Duration::from_secs(60);

/// Requeue directive returned to the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Nothing left to do; wait for the next change event
    None,
    /// Re-verify right away
    Immediate,
    /// Re-verify after the given delay
    After(Duration),
}

/// Reconciles HanaExpress resources against the cluster.
pub struct Reconciler {
    pub(crate) cluster: Box<dyn ClusterClient>,
    config: Box<dyn ConfigResolver>,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        cluster: impl ClusterClient + 'static,
        config: impl ConfigResolver + 'static,
    ) -> Self {
        Self {
            cluster: Box::new(cluster),
            config: Box::new(config),
        }
    }

    /// Runs one reconcile pass for the resource identified by name and
    /// namespace.
    ///
    /// Errors are returned unmodified for the watch loop's retry policy;
    /// the pass itself never retries internally.
    pub async fn reconcile(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Requeue, ControllerError> {
        let Some(mut hana) = self.cluster.get_hana_express(name, namespace).await? else {
            // Already deleted, nothing to converge
            info!(
                "HanaExpress {}/{} not found, ignoring since object must be deleted",
                namespace, name
            );
            return Ok(Requeue::None);
        };

        // A resource we have never touched gets an initial Unknown condition
        // so observers can tell reconciliation has started.
        if hana
            .status
            .as_ref()
            .is_none_or(|status| status.conditions.is_empty())
        {
            self.record_condition(
                &mut hana,
                Condition::new(
                    TYPE_AVAILABLE,
                    ConditionStatus::Unknown,
                    "Reconciling",
                    "Starting reconciliation",
                ),
            )
            .await?;
            hana = self.refetch(name, namespace).await?;
        }

        if !finalize::has_finalizer(&hana) && hana.metadata.deletion_timestamp.is_none() {
            self.attach_finalizer(&hana).await?;
            hana = self.refetch(name, namespace).await?;
        }

        if hana.metadata.deletion_timestamp.is_some() {
            if finalize::has_finalizer(&hana) {
                self.finalize(name, namespace, &mut hana).await?;
            }
            return Ok(Requeue::None);
        }

        match self.cluster.get_stateful_set(name, namespace).await? {
            None => self.create_stateful_set(name, &mut hana).await,
            Some(sts) => self.converge_stateful_set(name, namespace, hana, sts).await,
        }
    }

    /// Builds and creates the StatefulSet for a resource that has none yet.
    async fn create_stateful_set(
        &self,
        name: &str,
        hana: &mut HanaExpress,
    ) -> Result<Requeue, ControllerError> {
        let sts = match statefulset::build_stateful_set(hana, self.config.as_ref()) {
            Ok(sts) => sts,
            Err(e) => {
                error!("Failed to define StatefulSet for HanaExpress {}: {}", name, e);
                self.record_condition(
                    hana,
                    Condition::new(
                        TYPE_AVAILABLE,
                        ConditionStatus::False,
                        "Reconciling",
                        format!(
                            "Failed to create StatefulSet for the custom resource ({name}): ({e})"
                        ),
                    ),
                )
                .await?;
                return Err(e);
            }
        };

        info!(
            "Creating StatefulSet {}/{}",
            sts.metadata.namespace.as_deref().unwrap_or("default"),
            name
        );
        self.cluster.create_stateful_set(&sts).await?;

        // Creation is asynchronous; verify on the next pass instead of
        // blocking this one.
        Ok(Requeue::After(CREATION_REQUEUE_DELAY))
    }

    /// Converges an existing StatefulSet: only the replica count is
    /// reconciled. Other drift (notably volume size) is deliberately left
    /// alone; PVC resizing is out of scope.
    async fn converge_stateful_set(
        &self,
        name: &str,
        namespace: &str,
        mut hana: HanaExpress,
        mut sts: k8s_openapi::api::apps::v1::StatefulSet,
    ) -> Result<Requeue, ControllerError> {
        let replicas = sts.spec.as_ref().and_then(|spec| spec.replicas);
        if replicas != Some(statefulset::DESIRED_REPLICAS) {
            info!(
                "StatefulSet {}/{} has {:?} replicas, scaling to {}",
                namespace,
                name,
                replicas,
                statefulset::DESIRED_REPLICAS
            );
            if let Some(spec) = sts.spec.as_mut() {
                spec.replicas = Some(statefulset::DESIRED_REPLICAS);
            }
            if let Err(e) = self.cluster.update_stateful_set(&sts).await {
                error!("Failed to update StatefulSet {}/{}: {}", namespace, name, e);
                hana = self.refetch(name, namespace).await?;
                self.record_condition(
                    &mut hana,
                    Condition::new(
                        TYPE_AVAILABLE,
                        ConditionStatus::False,
                        "Resizing",
                        format!(
                            "Failed to update the size for the custom resource ({name}): ({e})"
                        ),
                    ),
                )
                .await?;
                return Err(e.into());
            }
            return Ok(Requeue::Immediate);
        }

        debug!("StatefulSet {}/{} matches desired state", namespace, name);
        self.record_condition(
            &mut hana,
            Condition::new(
                TYPE_AVAILABLE,
                ConditionStatus::True,
                "Reconciling",
                format!(
                    "StatefulSet for custom resource ({name}) with {} replicas created successfully",
                    statefulset::DESIRED_REPLICAS
                ),
            ),
        )
        .await?;
        Ok(Requeue::None)
    }

    /// Upserts a condition and persists the status when it changed.
    ///
    /// An unchanged condition is a no-op write: no timestamp churn, no API
    /// call. The held copy is stale after a successful write; callers must
    /// re-fetch before writing the same object again.
    pub(crate) async fn record_condition(
        &self,
        hana: &mut HanaExpress,
        condition: Condition,
    ) -> Result<(), ControllerError> {
        let status = hana.status.get_or_insert_with(Default::default);
        if status.upsert_condition(condition) {
            self.cluster.update_hana_express_status(hana).await?;
        }
        Ok(())
    }

    /// Re-reads the resource after a write.
    ///
    /// Disappearing between a successful write and the re-read is fatal for
    /// this pass; the next trigger starts over from the top.
    pub(crate) async fn refetch(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<HanaExpress, ControllerError> {
        self.cluster
            .get_hana_express(name, namespace)
            .await?
            .ok_or_else(|| {
                ControllerError::Cluster(ClusterError::NotFound(format!(
                    "HanaExpress {namespace}/{name} disappeared after write"
                )))
            })
    }
}
