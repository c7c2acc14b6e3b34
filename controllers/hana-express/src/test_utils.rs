//! Test utilities for unit testing the reconciler
//!
//! Helpers for creating test resources and configuration sources.

use crate::config::ConfigResolver;
use crate::reconciler::statefulset::IMAGE_CONFIG_KEY;
use crds::{Credential, HanaExpress, HanaExpressSpec};
use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::HashMap;

/// Configuration source backed by an in-memory map
pub struct MapConfig(HashMap<String, String>);

impl ConfigResolver for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Configuration with or without the operand image key set
pub fn map_config(image: Option<&str>) -> MapConfig {
    let mut values = HashMap::new();
    if let Some(image) = image {
        values.insert(IMAGE_CONFIG_KEY.to_string(), image.to_string());
    }
    MapConfig(values)
}

/// Helper to create a test HanaExpress resource
pub fn create_test_hana_express(name: &str, namespace: &str, pvc_size: &str) -> HanaExpress {
    HanaExpress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some("8f1c2a4e-6a52-4f2b-9c0d-test".to_string()),
            ..Default::default()
        },
        spec: HanaExpressSpec {
            pvc_size: pvc_size.to_string(),
            credential: Credential {
                name: "hana-credentials".to_string(),
                key: "hxepasswd.json".to_string(),
            },
        },
        status: None,
    }
}

/// Helper to create a bare StatefulSet with the given replica count
pub fn create_test_stateful_set(name: &str, namespace: &str, replicas: i32) -> StatefulSet {
    StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(replicas),
            ..Default::default()
        }),
        ..Default::default()
    }
}
