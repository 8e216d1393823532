//! Owner-chain resolution.
//!
//! Walks `metadata.ownerReferences` upward until it reaches an object whose
//! owners are not recognized controllers, and reports that object as the
//! parent. The walk is best effort: an owner that cannot be fetched makes the
//! resolver fall back to the original object's own name.

use crate::analyzer::context::AnalyzerError;
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Client;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind};
use log::{debug, warn};
use std::collections::HashSet;

/// Controller kinds followed by default.
pub const DEFAULT_CONTROLLER_KINDS: &[&str] = &[
    "ReplicaSet",
    "Deployment",
    "StatefulSet",
    "DaemonSet",
    "Ingress",
    "Job",
    "CronJob",
];

/// Upper bound on the number of owners followed in one walk.
pub const DEFAULT_MAX_HOPS: usize = 16;

/// Fetches the owner references of an owning object.
#[async_trait]
pub trait OwnerLookup: Send + Sync {
    /// Returns `Ok(None)` when the owner does not exist.
    async fn owner_references(
        &self,
        owner: &OwnerReference,
        namespace: &str,
    ) -> Result<Option<Vec<OwnerReference>>, AnalyzerError>;
}

#[async_trait]
impl OwnerLookup for Client {
    async fn owner_references(
        &self,
        owner: &OwnerReference,
        namespace: &str,
    ) -> Result<Option<Vec<OwnerReference>>, AnalyzerError> {
        let (group, version) = match owner.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", owner.api_version.as_str()),
        };
        let gvk = GroupVersionKind::gvk(group, version, &owner.kind);
        let resource = ApiResource::from_gvk(&gvk);
        let api: Api<DynamicObject> = if namespace.is_empty() {
            Api::all_with(self.clone(), &resource)
        } else {
            Api::namespaced_with(self.clone(), namespace, &resource)
        };
        let object = api.get_opt(&owner.name).await?;
        Ok(object.map(|o| o.metadata.owner_references.unwrap_or_default()))
    }
}

/// Outcome of an owner walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    /// `Kind/name` of the topmost owner, or the object's own name.
    pub identity: String,
    /// Whether a recognized owner was found.
    pub had_owner: bool,
}

impl Parent {
    fn own(name: &str) -> Self {
        Self {
            identity: name.to_string(),
            had_owner: false,
        }
    }
}

/// Configurable owner-chain walker.
pub struct OwnerResolver<'a, L: OwnerLookup + ?Sized> {
    lookup: &'a L,
    kinds: Vec<String>,
    max_hops: usize,
}

impl<'a, L: OwnerLookup + ?Sized> OwnerResolver<'a, L> {
    /// Resolver following [`DEFAULT_CONTROLLER_KINDS`].
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            kinds: DEFAULT_CONTROLLER_KINDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    /// Follow an additional owner kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Change the hop bound. Zero disables the walk entirely.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    fn recognized<'r>(&self, refs: &'r [OwnerReference]) -> Option<&'r OwnerReference> {
        refs.iter().find(|r| self.kinds.iter().any(|k| *k == r.kind))
    }

    /// Walk from `owner_refs` to the topmost recognized owner.
    pub async fn resolve(
        &self,
        owner_refs: &[OwnerReference],
        namespace: &str,
        own_name: &str,
    ) -> Parent {
        let mut current: Vec<OwnerReference> = owner_refs.to_vec();
        let mut top: Option<String> = None;
        let mut visited: HashSet<(String, String)> = HashSet::new();

        let mut hops = 0;
        while let Some(owner) = self.recognized(&current) {
            if hops == self.max_hops {
                if let Some(top) = &top {
                    warn!(
                        "Owner chain of {} exceeds {} hops; stopping at {}",
                        own_name, self.max_hops, top
                    );
                }
                break;
            }
            if !visited.insert((owner.kind.clone(), owner.name.clone())) {
                warn!(
                    "Owner cycle detected at {}/{} while resolving {}",
                    owner.kind, owner.name, own_name
                );
                break;
            }
            hops += 1;

            match self.lookup.owner_references(owner, namespace).await {
                Ok(Some(next)) => {
                    top = Some(format!("{}/{}", owner.kind, owner.name));
                    current = next;
                }
                Ok(None) => {
                    debug!(
                        "Owner {}/{} of {} not found; using the object itself",
                        owner.kind, owner.name, own_name
                    );
                    return Parent::own(own_name);
                }
                Err(e) => {
                    debug!(
                        "Failed to fetch owner {}/{} of {}: {}",
                        owner.kind, owner.name, own_name, e
                    );
                    return Parent::own(own_name);
                }
            }
        }

        match top {
            Some(identity) => Parent {
                identity,
                had_owner: true,
            },
            None => Parent::own(own_name),
        }
    }
}

/// Resolve the parent of an object using the default controller kinds.
pub async fn resolve_parent<L: OwnerLookup + ?Sized>(lookup: &L, meta: &ObjectMeta) -> Parent {
    let name = meta.name.as_deref().unwrap_or_default();
    let namespace = meta.namespace.as_deref().unwrap_or_default();
    let refs = meta.owner_references.as_deref().unwrap_or_default();
    OwnerResolver::new(lookup).resolve(refs, namespace, name).await
}
