//! HanaExpress CRD
//!
//! Declares a single-instance SAP HANA Express database. The controller
//! materializes it as a StatefulSet with one replica and a persistent
//! data volume.

use crate::conditions::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "db.sap-redhat.io",
    version = "v1alpha1",
    kind = "HanaExpress",
    namespaced,
    status = "HanaExpressStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct HanaExpressSpec {
    /// Size of the persistent volume attached to the database StatefulSet.
    /// Expected to be a binary quantity in gibibytes, e.g. "10Gi".
    pub pvc_size: String,

    /// Secret reference holding the initial database credentials.
    pub credential: Credential,
}

/// Reference to the Kubernetes secret used to initialize the database users.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Name of the secret in the resource's namespace
    pub name: String,

    /// The key of the secret to select from. Must be a valid secret key.
    pub key: String,
}

/// Observed state of a HanaExpress instance.
///
/// The controller is the only writer; conditions are unique per type and
/// follow the usual True/False/Unknown convention.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HanaExpressStatus {
    /// Status conditions, at most one entry per condition type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
