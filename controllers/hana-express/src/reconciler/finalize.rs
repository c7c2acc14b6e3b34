//! Finalizer lifecycle
//!
//! The finalizer token keeps the API server from completing a delete until
//! cleanup notification has happened. Attachment is idempotent; removal
//! happens exactly once, after the cleanup event is published and the
//! Degraded condition confirms completion. Once removed the marker is never
//! re-attached: attachment is guarded by the deletion timestamp.

use super::{HANA_EXPRESS_FINALIZER, Reconciler, TYPE_DEGRADED};
use crate::error::ControllerError;
use crds::{Condition, ConditionStatus, HanaExpress};
use tracing::{info, warn};

/// Whether the resource carries the controller's finalizer token.
pub(crate) fn has_finalizer(hana: &HanaExpress) -> bool {
    hana.metadata
        .finalizers
        .as_ref()
        .is_some_and(|tokens| tokens.iter().any(|t| t == HANA_EXPRESS_FINALIZER))
}

impl Reconciler {
    /// Attaches the finalizer token and persists the resource.
    ///
    /// The caller holds a stale copy afterwards and must re-fetch before
    /// any further write.
    pub(crate) async fn attach_finalizer(
        &self,
        hana: &HanaExpress,
    ) -> Result<(), ControllerError> {
        info!(
            "Adding finalizer for HanaExpress {}/{}",
            hana.metadata.namespace.as_deref().unwrap_or("default"),
            hana.metadata.name.as_deref().unwrap_or("")
        );

        let mut updated = hana.clone();
        updated
            .metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(HANA_EXPRESS_FINALIZER.to_string());
        self.cluster.update_hana_express(&updated).await?;
        Ok(())
    }

    /// Drives a deletion-requested resource through cleanup to removal.
    ///
    /// Two-phase: announce finalization (Degraded/Unknown) and publish the
    /// cleanup event, then confirm (Degraded/True) and clear the marker.
    /// Every persisted write is followed by a re-fetch, so an abandoned
    /// pass resumes cleanly from the top on the next trigger.
    pub(crate) async fn finalize(
        &self,
        name: &str,
        namespace: &str,
        hana: &mut HanaExpress,
    ) -> Result<(), ControllerError> {
        info!(
            "Performing finalizer operations for HanaExpress {}/{} before delete",
            namespace, name
        );

        self.record_condition(
            hana,
            Condition::new(
                TYPE_DEGRADED,
                ConditionStatus::Unknown,
                "Finalizing",
                format!("Performing finalizer operations for the custom resource: {name}"),
            ),
        )
        .await?;

        // Cleanup notification is fire-and-forget; the StatefulSet itself is
        // garbage-collected through its owner reference, not deleted here.
        if let Err(e) = self
            .cluster
            .publish_event(
                hana,
                "Warning",
                "Deleting",
                &format!("Custom Resource {name} is being deleted from the namespace {namespace}"),
            )
            .await
        {
            warn!(
                "Failed to publish deletion event for HanaExpress {}/{}: {}",
                namespace, name, e
            );
        }

        *hana = self.refetch(name, namespace).await?;
        self.record_condition(
            hana,
            Condition::new(
                TYPE_DEGRADED,
                ConditionStatus::True,
                "Finalizing",
                format!(
                    "Finalizer operations for custom resource {name} were successfully accomplished"
                ),
            ),
        )
        .await?;

        *hana = self.refetch(name, namespace).await?;
        info!(
            "Removing finalizer for HanaExpress {}/{} after successful cleanup",
            namespace, name
        );
        if let Some(tokens) = hana.metadata.finalizers.as_mut() {
            tokens.retain(|t| t != HANA_EXPRESS_FINALIZER);
        }
        self.cluster.update_hana_express(hana).await?;
        Ok(())
    }
}
