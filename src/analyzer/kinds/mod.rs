//! Built-in per-kind analyzers.
//!
//! Each analyzer lists objects of one kind through the run context and hands
//! them to a pure `diagnose` function, which is where the rules live.

pub mod cronjob;
pub mod deployment;
pub mod hpa;
pub mod ingress;
pub mod netpol;
pub mod node;
pub mod pdb;
pub mod pod;
pub mod pvc;
pub mod replicaset;
pub mod selector;
pub mod service;
pub mod statefulset;

use kube::{Resource, ResourceExt};

/// `namespace/name` of a namespaced object.
pub(crate) fn object_id<K: Resource>(object: &K) -> String {
    crate::analyzer::types::namespaced_name(object.namespace().as_deref(), &object.name_any())
}

#[cfg(test)]
pub(crate) fn from_yaml<T: serde::de::DeserializeOwned>(yaml: &str) -> T {
    serde_yaml::from_str(yaml).expect("valid test fixture")
}
