//! Mock ClusterClient for unit testing
//!
//! In-memory implementation of [`ClusterClient`] that behaves like the API
//! server where the reconciler can tell the difference:
//!
//! - every successful write bumps the object's `resource_version`, and a
//!   write carrying a stale version is rejected with
//!   [`ClusterError::Conflict`];
//! - main-resource writes leave the status subresource untouched and
//!   status writes leave spec/metadata untouched;
//! - an object whose deletion timestamp is set is garbage-collected as
//!   soon as a write leaves its finalizer list empty.

use crate::cluster_trait::ClusterClient;
use crate::error::ClusterError;
use chrono::Utc;
use crds::HanaExpress;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Event captured by [`MockClusterClient::publish_event`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    /// Name of the resource the event is attributed to
    pub name: String,
    /// Namespace of the resource
    pub namespace: String,
    /// Event type ("Normal" or "Warning")
    pub event_type: String,
    /// CamelCase reason
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

/// Mock cluster for testing
///
/// Stores resources in memory; test setup goes through the `insert_*` and
/// `mark_for_deletion` helpers, assertions through the accessor methods.
#[derive(Clone, Default)]
pub struct MockClusterClient {
    hana: Arc<Mutex<HashMap<(String, String), HanaExpress>>>,
    stateful_sets: Arc<Mutex<HashMap<(String, String), StatefulSet>>>,
    events: Arc<Mutex<Vec<PublishedEvent>>>,
    removed: Arc<Mutex<Vec<HanaExpress>>>,
    stateful_set_writes: Arc<Mutex<usize>>,
    next_version: Arc<Mutex<u64>>,
}

fn key_of(metadata: &ObjectMeta) -> (String, String) {
    (
        metadata.namespace.clone().unwrap_or_else(|| "default".to_string()),
        metadata.name.clone().unwrap_or_default(),
    )
}

impl MockClusterClient {
    /// Creates an empty mock cluster
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_version(&self) -> String {
        let mut version = self.next_version.lock().unwrap();
        *version += 1;
        version.to_string()
    }

    /// Add a HanaExpress to the store, assigning its first resource version
    pub fn insert_hana_express(&self, mut hana: HanaExpress) {
        hana.metadata.resource_version = Some(self.bump_version());
        self.hana.lock().unwrap().insert(key_of(&hana.metadata), hana);
    }

    /// Add a StatefulSet to the store (for test setup)
    pub fn insert_stateful_set(&self, mut sts: StatefulSet) {
        sts.metadata.resource_version = Some(self.bump_version());
        self.stateful_sets
            .lock()
            .unwrap()
            .insert(key_of(&sts.metadata), sts);
    }

    /// Set the deletion timestamp, as the API server does on delete while
    /// finalizers are pending
    pub fn mark_for_deletion(&self, name: &str, namespace: &str) {
        let version = self.bump_version();
        let mut store = self.hana.lock().unwrap();
        if let Some(hana) = store.get_mut(&(namespace.to_string(), name.to_string())) {
            hana.metadata.deletion_timestamp = Some(Time(Utc::now()));
            hana.metadata.resource_version = Some(version);
        }
    }

    /// Current stored copy of a HanaExpress
    pub fn hana_express(&self, name: &str, namespace: &str) -> Option<HanaExpress> {
        self.hana
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Current stored copy of a StatefulSet
    pub fn stateful_set(&self, name: &str, namespace: &str) -> Option<StatefulSet> {
        self.stateful_sets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Events published so far
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Objects garbage-collected after their finalizers were cleared,
    /// in their final persisted state
    pub fn removed(&self) -> Vec<HanaExpress> {
        self.removed.lock().unwrap().clone()
    }

    /// Number of StatefulSet create/update calls observed
    pub fn stateful_set_writes(&self) -> usize {
        *self.stateful_set_writes.lock().unwrap()
    }

    fn check_version(stored: &ObjectMeta, incoming: &ObjectMeta) -> Result<(), ClusterError> {
        if stored.resource_version != incoming.resource_version {
            return Err(ClusterError::Conflict(format!(
                "object has been modified: held version {:?}, current {:?}",
                incoming.resource_version, stored.resource_version
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ClusterClient for MockClusterClient {
    async fn get_hana_express(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<HanaExpress>, ClusterError> {
        Ok(self.hana_express(name, namespace))
    }

    async fn update_hana_express(&self, hana: &HanaExpress) -> Result<(), ClusterError> {
        let key = key_of(&hana.metadata);
        let mut store = self.hana.lock().unwrap();
        let Some(stored) = store.get(&key) else {
            return Err(ClusterError::NotFound(format!("HanaExpress {}/{}", key.0, key.1)));
        };
        Self::check_version(&stored.metadata, &hana.metadata)?;

        let mut updated = hana.clone();
        // Main-resource writes cannot touch the status subresource
        updated.status = stored.status.clone();
        updated.metadata.resource_version = Some(self.bump_version());

        let finalized = updated.metadata.deletion_timestamp.is_some()
            && updated.metadata.finalizers.as_ref().is_none_or(Vec::is_empty);
        if finalized {
            store.remove(&key);
            self.removed.lock().unwrap().push(updated);
        } else {
            store.insert(key, updated);
        }
        Ok(())
    }

    async fn update_hana_express_status(&self, hana: &HanaExpress) -> Result<(), ClusterError> {
        let key = key_of(&hana.metadata);
        let mut store = self.hana.lock().unwrap();
        let Some(stored) = store.get_mut(&key) else {
            return Err(ClusterError::NotFound(format!("HanaExpress {}/{}", key.0, key.1)));
        };
        Self::check_version(&stored.metadata, &hana.metadata)?;

        stored.status = hana.status.clone();
        stored.metadata.resource_version = Some(self.bump_version());
        Ok(())
    }

    async fn get_stateful_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<StatefulSet>, ClusterError> {
        Ok(self.stateful_set(name, namespace))
    }

    async fn create_stateful_set(&self, sts: &StatefulSet) -> Result<(), ClusterError> {
        let key = key_of(&sts.metadata);
        let mut store = self.stateful_sets.lock().unwrap();
        if store.contains_key(&key) {
            return Err(ClusterError::Api(format!(
                "statefulsets \"{}\" already exists",
                key.1
            )));
        }
        let mut created = sts.clone();
        created.metadata.resource_version = Some(self.bump_version());
        store.insert(key, created);
        *self.stateful_set_writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn update_stateful_set(&self, sts: &StatefulSet) -> Result<(), ClusterError> {
        let key = key_of(&sts.metadata);
        let mut store = self.stateful_sets.lock().unwrap();
        if !store.contains_key(&key) {
            return Err(ClusterError::NotFound(format!("StatefulSet {}/{}", key.0, key.1)));
        }
        let mut updated = sts.clone();
        updated.metadata.resource_version = Some(self.bump_version());
        store.insert(key, updated);
        *self.stateful_set_writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn publish_event(
        &self,
        hana: &HanaExpress,
        event_type: &str,
        reason: &str,
        message: &str,
    ) -> Result<(), ClusterError> {
        let (namespace, name) = key_of(&hana.metadata);
        self.events.lock().unwrap().push(PublishedEvent {
            name,
            namespace,
            event_type: event_type.to_string(),
            reason: reason.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
