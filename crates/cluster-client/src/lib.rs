//! Kubernetes access layer for the HANA Express operator
//!
//! Wraps every cluster interaction the reconciler needs behind the
//! [`ClusterClient`] trait: reading and writing the HanaExpress custom
//! resource (main resource and status subresource independently), reading,
//! creating and updating the owned StatefulSet, and publishing events.
//!
//! Writes to the custom resource are version-checked replacements, so a
//! caller that holds a stale copy gets a conflict instead of silently
//! clobbering a newer revision.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClient, KubeClusterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kube = kube::Client::try_default().await?;
//! let cluster = KubeClusterClient::new(kube);
//!
//! if let Some(instance) = cluster.get_hana_express("hana-sample", "default").await? {
//!     println!("found {:?}", instance.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[cfg(feature = "test-util")]
pub mod mock;
#[path = "trait.rs"]
pub mod cluster_trait;

pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClient;
pub use error::ClusterError;
#[cfg(feature = "test-util")]
pub use mock::{MockClusterClient, PublishedEvent};
