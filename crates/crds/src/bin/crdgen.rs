//! Prints the HanaExpress CRD manifest as YAML.
//!
//! Usage: `cargo run --bin crdgen > config/crd/hanaexpress.yaml`

use kube::CustomResourceExt;

fn main() {
    let crd = crds::HanaExpress::crd();
    let yaml = serde_yaml::to_string(&crd).expect("serialize CRD");
    println!("{yaml}");
}
