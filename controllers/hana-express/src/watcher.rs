//! Kubernetes resource watcher.
//!
//! Runs the reconcile loop through `kube_runtime::Controller`, which
//! handles watch reconnection, per-key serialization of reconciles, and
//! requeue scheduling. Failed reconciles retry with per-resource Fibonacci
//! backoff; a successful pass resets the resource's backoff state.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use crate::reconciler::{Reconciler, Requeue};
use crds::HanaExpress;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use kube::{Api, ResourceExt};
use kube_runtime::{
    Controller,
    controller::{Action, Config as ControllerConfig},
    watcher,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Watches HanaExpress resources and their owned StatefulSets.
pub struct Watcher {
    hana_api: Api<HanaExpress>,
    stateful_set_api: Api<StatefulSet>,
    context: Arc<Context>,
}

/// Shared state handed to every reconcile invocation.
struct Context {
    reconciler: Reconciler,
    backoff: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl Context {
    fn next_backoff(&self, key: &str) -> Duration {
        match self.backoff.lock() {
            Ok(mut states) => states
                .entry(key.to_string())
                .or_insert_with(FibonacciBackoff::default_policy)
                .next_delay(),
            Err(e) => {
                warn!("Failed to lock backoff state: {}, using default delay", e);
                Duration::from_secs(60)
            }
        }
    }

    fn reset_backoff(&self, key: &str) {
        if let Ok(mut states) = self.backoff.lock() {
            if let Some(state) = states.get_mut(key) {
                state.reset();
            }
        }
    }
}

async fn reconcile(obj: Arc<HanaExpress>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let name = obj
        .metadata
        .name
        .clone()
        .ok_or_else(|| ControllerError::InvalidResource("HanaExpress missing name".to_string()))?;
    let namespace = obj
        .metadata
        .namespace
        .clone()
        .unwrap_or_else(|| "default".to_string());
    debug!("Reconciling HanaExpress {}/{}", namespace, name);

    let requeue = ctx.reconciler.reconcile(&name, &namespace).await?;
    ctx.reset_backoff(&format!("{namespace}/{name}"));

    Ok(match requeue {
        Requeue::None => Action::await_change(),
        Requeue::Immediate => Action::requeue(Duration::ZERO),
        Requeue::After(delay) => Action::requeue(delay),
    })
}

fn error_policy(obj: Arc<HanaExpress>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    error!(
        "Reconciliation error for HanaExpress {}/{}: {}",
        namespace, name, error
    );

    let delay = ctx.next_backoff(&format!("{namespace}/{name}"));
    debug!(
        "Retrying HanaExpress {}/{} in {}s",
        namespace,
        name,
        delay.as_secs()
    );
    Action::requeue(delay)
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        hana_api: Api<HanaExpress>,
        stateful_set_api: Api<StatefulSet>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            hana_api,
            stateful_set_api,
            context: Arc::new(Context {
                reconciler,
                backoff: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Runs the watch loop until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        tracing::info!("Starting HanaExpress watcher");

        // Debounce batches bursts of watch events; concurrency bounds the
        // number of in-flight reconciles across distinct resources (each
        // key is still serialized by the Controller).
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(1))
            .concurrency(4);

        Controller::new(self.hana_api, watcher::Config::default())
            .owns(self.stateful_set_api, watcher::Config::default())
            .with_config(controller_config)
            .run(reconcile, error_policy, self.context)
            .for_each(|result| async move {
                if let Err(e) = result {
                    error!("Controller error: {:?}", e);
                }
            })
            .await;

        Ok(())
    }
}
