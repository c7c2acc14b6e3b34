//! HanaExpress CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the HANA Express operator.

pub mod conditions;
pub mod hana_express;

pub use conditions::*;
pub use hana_express::*;
