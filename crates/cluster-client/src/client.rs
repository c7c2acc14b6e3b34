//! kube-backed ClusterClient implementation

use crate::cluster_trait::ClusterClient;
use crate::error::ClusterError;
use chrono::Utc;
use crds::HanaExpress;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Event, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::api::{Api, PostParams};
use kube::{Client, Resource};

/// Cluster access backed by the Kubernetes API server.
///
/// Scoped `Api` handles are created per call; the underlying `Client` is
/// cheap to clone and holds the connection pool.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Creates a new client from an established kube connection.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn hana_api(&self, namespace: &str) -> Api<HanaExpress> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn stateful_set_api(&self, namespace: &str) -> Api<StatefulSet> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn named(hana: &HanaExpress) -> Result<(&str, &str), ClusterError> {
        let name = hana
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| ClusterError::Api("HanaExpress has no name".to_string()))?;
        let namespace = hana.metadata.namespace.as_deref().unwrap_or("default");
        Ok((name, namespace))
    }
}

#[async_trait::async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_hana_express(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<HanaExpress>, ClusterError> {
        Ok(self.hana_api(namespace).get_opt(name).await?)
    }

    async fn update_hana_express(&self, hana: &HanaExpress) -> Result<(), ClusterError> {
        let (name, namespace) = Self::named(hana)?;
        self.hana_api(namespace)
            .replace(name, &PostParams::default(), hana)
            .await?;
        Ok(())
    }

    async fn update_hana_express_status(&self, hana: &HanaExpress) -> Result<(), ClusterError> {
        let (name, namespace) = Self::named(hana)?;
        let body = serde_json::to_vec(hana).map_err(|e| ClusterError::Api(e.to_string()))?;
        self.hana_api(namespace)
            .replace_status(name, &PostParams::default(), body)
            .await?;
        Ok(())
    }

    async fn get_stateful_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<StatefulSet>, ClusterError> {
        Ok(self.stateful_set_api(namespace).get_opt(name).await?)
    }

    async fn create_stateful_set(&self, sts: &StatefulSet) -> Result<(), ClusterError> {
        let namespace = sts.metadata.namespace.as_deref().unwrap_or("default");
        self.stateful_set_api(namespace)
            .create(&PostParams::default(), sts)
            .await?;
        Ok(())
    }

    async fn update_stateful_set(&self, sts: &StatefulSet) -> Result<(), ClusterError> {
        let name = sts
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| ClusterError::Api("StatefulSet has no name".to_string()))?;
        let namespace = sts.metadata.namespace.as_deref().unwrap_or("default");
        self.stateful_set_api(namespace)
            .replace(name, &PostParams::default(), sts)
            .await?;
        Ok(())
    }

    async fn publish_event(
        &self,
        hana: &HanaExpress,
        event_type: &str,
        reason: &str,
        message: &str,
    ) -> Result<(), ClusterError> {
        let (name, namespace) = Self::named(hana)?;
        let now = Time(Utc::now());

        let event = Event {
            metadata: ObjectMeta {
                namespace: Some(namespace.to_string()),
                // Server-side suffix keeps repeated events from colliding
                generate_name: Some(format!("{name}.")),
                ..Default::default()
            },
            involved_object: ObjectReference {
                api_version: Some(HanaExpress::api_version(&()).to_string()),
                kind: Some(HanaExpress::kind(&()).to_string()),
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                uid: hana.metadata.uid.clone(),
                ..Default::default()
            },
            type_: Some(event_type.to_string()),
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            count: Some(1),
            first_timestamp: Some(now.clone()),
            last_timestamp: Some(now),
            reporting_component: Some("hana-express-controller".to_string()),
            ..Default::default()
        };

        let events: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        events.create(&PostParams::default(), &event).await?;
        Ok(())
    }
}
