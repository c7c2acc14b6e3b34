//! Main controller wiring.
//!
//! Connects the Kubernetes client, the cluster access layer, the
//! configuration resolver, and the reconciler, then hands them to the
//! watcher.

use crate::config::EnvConfig;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use cluster_client::{ClusterError, KubeClusterClient};
use crds::HanaExpress;
use k8s_openapi::api::apps::v1::StatefulSet;
use kube::{Api, Client};
use tracing::info;

/// Main controller for HanaExpress resources.
pub struct Controller {
    watcher: Watcher,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(namespace: Option<String>) -> Result<Self, ControllerError> {
        info!("Initializing HanaExpress controller");

        let kube_client = Client::try_default()
            .await
            .map_err(|e| ControllerError::Cluster(ClusterError::Api(e.to_string())))?;

        let ns = namespace.as_deref().unwrap_or("default");
        let hana_api: Api<HanaExpress> = Api::namespaced(kube_client.clone(), ns);
        let stateful_set_api: Api<StatefulSet> = Api::namespaced(kube_client.clone(), ns);

        let reconciler = Reconciler::new(KubeClusterClient::new(kube_client), EnvConfig);
        let watcher = Watcher::new(hana_api, stateful_set_api, reconciler);

        Ok(Self { watcher })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("HanaExpress controller running");
        self.watcher.run().await
    }
}
