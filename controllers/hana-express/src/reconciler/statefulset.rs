//! Desired-state builder
//!
//! Maps a HanaExpress resource to the full StatefulSet it should run as.
//! The mapping is deterministic: identical spec and configuration produce a
//! value-equal StatefulSet, so the reconcile loop can diff reliably. The
//! only external input is the operand image, resolved through the injected
//! configuration lookup.

use crate::config::ConfigResolver;
use crate::error::ControllerError;
use crds::HanaExpress;
use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PersistentVolumeClaim, PersistentVolumeClaimSpec, PodSpec,
    PodTemplateSpec, Probe, SecretVolumeSource, SecurityContext, TCPSocketAction, Volume,
    VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::Resource;
use std::collections::BTreeMap;

/// Configuration key holding the operand image reference
pub const IMAGE_CONFIG_KEY: &str = "HANAEXPRESS_IMAGE";

/// Single-instance database: replica count is fixed, not configurable
pub const DESIRED_REPLICAS: i32 = 1;

/// Image used to fix data-volume ownership before the database starts
const INIT_IMAGE: &str = "registry.access.redhat.com/ubi8/ubi:8.5-239.1651231664";

const DATA_VOLUME: &str = "data";
const DATA_MOUNT_PATH: &str = "/hana/mounts";
const CREDENTIAL_VOLUME: &str = "hxepasswd";
const CREDENTIAL_MOUNT_PATH: &str = "/tmp/mounts";

// The HANA Express image runs as this fixed non-root user/group
const HANA_UID: i64 = 12000;
const HANA_GID: i64 = 79;

// SQL system DB, SQL tenant DB, instance agent, lifecycle manager
const PORTS: [i32; 4] = [39017, 39041, 59031, 8090];
/// Primary SQL port, probed for readiness
const SQL_PORT: i32 = 39017;

/// Resolves the operand image from configuration.
pub fn resolve_image(config: &dyn ConfigResolver) -> Result<String, ControllerError> {
    config.get(IMAGE_CONFIG_KEY).ok_or_else(|| {
        ControllerError::ConfigurationMissing(format!(
            "unable to find {IMAGE_CONFIG_KEY} with the operand image"
        ))
    })
}

/// Selector labels for the resources owned by an instance.
///
/// The version label carries the image tag (text after the last `:`). An
/// image reference without a tag yields an empty version label; the label
/// is informational, so that is accepted rather than rejected.
pub fn labels_for(name: &str, image: &str) -> BTreeMap<String, String> {
    let tag = image.rsplit_once(':').map(|(_, tag)| tag).unwrap_or_default();
    BTreeMap::from([
        ("app.kubernetes.io/name".to_string(), "HanaExpress".to_string()),
        ("app.kubernetes.io/instance".to_string(), name.to_string()),
        ("app.kubernetes.io/version".to_string(), tag.to_string()),
        (
            "app.kubernetes.io/part-of".to_string(),
            "hanaexpress-operator".to_string(),
        ),
        (
            "app.kubernetes.io/created-by".to_string(),
            "controller-manager".to_string(),
        ),
    ])
}

fn volume_mounts() -> Vec<VolumeMount> {
    vec![
        VolumeMount {
            name: CREDENTIAL_VOLUME.to_string(),
            mount_path: CREDENTIAL_MOUNT_PATH.to_string(),
            ..Default::default()
        },
        VolumeMount {
            name: DATA_VOLUME.to_string(),
            mount_path: DATA_MOUNT_PATH.to_string(),
            ..Default::default()
        },
    ]
}

fn owner_reference(hana: &HanaExpress, name: &str) -> OwnerReference {
    OwnerReference {
        api_version: HanaExpress::api_version(&()).to_string(),
        kind: HanaExpress::kind(&()).to_string(),
        name: name.to_string(),
        uid: hana.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Builds the StatefulSet a HanaExpress resource should run as.
///
/// Fails with [`ControllerError::ConfigurationMissing`] when the operand
/// image cannot be resolved. Performs no I/O beyond the configuration
/// lookup and never mutates shared state.
pub fn build_stateful_set(
    hana: &HanaExpress,
    config: &dyn ConfigResolver,
) -> Result<StatefulSet, ControllerError> {
    let name = hana
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| ControllerError::InvalidResource("HanaExpress missing name".to_string()))?;
    let namespace = hana.metadata.namespace.as_deref().unwrap_or("default");

    let image = resolve_image(config)?;
    let labels = labels_for(name, &image);

    // Copies the credential file into the data volume and hands ownership
    // to the database user before the main container starts.
    let init_container = Container {
        name: "set-data-dir-ownership".to_string(),
        image: Some(INIT_IMAGE.to_string()),
        command: Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            format!(
                "cp {CREDENTIAL_MOUNT_PATH}/* {DATA_MOUNT_PATH} && chown -R {HANA_UID}:{HANA_GID} {DATA_MOUNT_PATH}"
            ),
        ]),
        volume_mounts: Some(volume_mounts()),
        ..Default::default()
    };

    let database_container = Container {
        name: "hana-express".to_string(),
        image: Some(image),
        image_pull_policy: Some("IfNotPresent".to_string()),
        command: Some(vec![
            "/run_hana".to_string(),
            "--passwords-url".to_string(),
            format!("file://{DATA_MOUNT_PATH}/hxepasswd.json"),
            "--agree-to-sap-license".to_string(),
        ]),
        ports: Some(
            PORTS
                .iter()
                .map(|&port| ContainerPort {
                    container_port: port,
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                })
                .collect(),
        ),
        // The image does not declare a numeric user; force the fixed
        // non-root identity so restricted namespaces admit the pod.
        security_context: Some(SecurityContext {
            run_as_non_root: Some(true),
            run_as_user: Some(HANA_UID),
            run_as_group: Some(HANA_GID),
            ..Default::default()
        }),
        volume_mounts: Some(volume_mounts()),
        readiness_probe: Some(Probe {
            tcp_socket: Some(TCPSocketAction {
                port: IntOrString::Int(SQL_PORT),
                ..Default::default()
            }),
            initial_delay_seconds: Some(10),
            period_seconds: Some(5),
            ..Default::default()
        }),
        ..Default::default()
    };

    let data_claim = PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(DATA_VOLUME.to_string()),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(hana.spec.pvc_size.clone()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };

    let credential_volume = Volume {
        name: CREDENTIAL_VOLUME.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(hana.spec.credential.name.clone()),
            default_mode: Some(0o511),
            ..Default::default()
        }),
        ..Default::default()
    };

    Ok(StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            owner_references: Some(vec![owner_reference(hana, name)]),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(DESIRED_REPLICAS),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    init_containers: Some(vec![init_container]),
                    containers: vec![database_container],
                    volumes: Some(vec![credential_volume]),
                    ..Default::default()
                }),
            },
            volume_claim_templates: Some(vec![data_claim]),
            ..Default::default()
        }),
        ..Default::default()
    })
}
