use crate::SizedIndex;
use ahash::AHashMap as HashMap;
use k8s_openapi::{
    api::{apps::v1::ReplicaSet, core::v1::Pod},
    apimachinery::pkg::apis::meta::v1::OwnerReference,
};
use kube::ResourceExt;
use kubert::index::IndexNamespacedResource;
use nginx_gateway_controller_core::{OwnerRef, PodOwners};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

pub type SharedIndex = Arc<RwLock<OwnersIndex>>;

/// Holds the owner references of NGINX pods and of all ReplicaSets.
#[derive(Debug, Default)]
pub struct OwnersIndex {
    pods: ByNamespace,
    replica_sets: ByNamespace,
}

/// Owner references by namespace, then by resource name.
#[derive(Debug, Default)]
struct ByNamespace(HashMap<String, HashMap<String, Vec<OwnerRef>>>);

// === impl OwnersIndex ===

impl OwnersIndex {
    pub fn shared() -> SharedIndex {
        Arc::new(RwLock::new(Self::default()))
    }

    /// Returns every indexed pod with the given name, in any namespace.
    pub fn pods_named(&self, name: &str) -> Vec<PodOwners> {
        self.pods
            .0
            .iter()
            .filter_map(|(namespace, pods)| {
                let owners = pods.get(name)?;
                Some(PodOwners {
                    namespace: namespace.clone(),
                    name: name.to_string(),
                    owners: owners.clone(),
                })
            })
            .collect()
    }

    pub fn replica_set(&self, namespace: &str, name: &str) -> Option<Vec<OwnerRef>> {
        self.replica_sets.get(namespace, name).cloned()
    }
}

impl IndexNamespacedResource<Pod> for OwnersIndex {
    fn apply(&mut self, pod: Pod) {
        let Some(namespace) = pod.namespace() else {
            warn!(pod = %pod.name_any(), "Ignoring pod without a namespace");
            return;
        };
        let owners = owner_refs(pod.owner_references());
        self.pods.insert(namespace, pod.name_unchecked(), owners);
    }

    fn delete(&mut self, namespace: String, name: String) {
        self.pods.remove(namespace, &name);
    }
}

impl IndexNamespacedResource<ReplicaSet> for OwnersIndex {
    fn apply(&mut self, rs: ReplicaSet) {
        let Some(namespace) = rs.namespace() else {
            warn!(replicaset = %rs.name_any(), "Ignoring ReplicaSet without a namespace");
            return;
        };
        let owners = owner_refs(rs.owner_references());
        self.replica_sets.insert(namespace, rs.name_unchecked(), owners);
    }

    fn delete(&mut self, namespace: String, name: String) {
        self.replica_sets.remove(namespace, &name);
    }
}

impl SizedIndex<Pod> for OwnersIndex {
    fn size(&self) -> usize {
        self.pods.len()
    }
}

impl SizedIndex<ReplicaSet> for OwnersIndex {
    fn size(&self) -> usize {
        self.replica_sets.len()
    }
}

fn owner_refs(refs: &[OwnerReference]) -> Vec<OwnerRef> {
    refs.iter()
        .map(|r| OwnerRef {
            kind: r.kind.clone(),
            name: r.name.clone(),
        })
        .collect()
}

// === impl ByNamespace ===

impl ByNamespace {
    fn get(&self, namespace: &str, name: &str) -> Option<&Vec<OwnerRef>> {
        self.0.get(namespace)?.get(name)
    }

    fn insert(&mut self, namespace: String, name: String, owners: Vec<OwnerRef>) {
        self.0.entry(namespace).or_default().insert(name, owners);
    }

    fn remove(&mut self, namespace: String, name: &str) {
        if let Some(by_name) = self.0.get_mut(&namespace) {
            by_name.remove(name);
            if by_name.is_empty() {
                self.0.remove(&namespace);
            }
        }
    }

    fn len(&self) -> usize {
        self.0.values().map(|by_name| by_name.len()).sum()
    }
}
