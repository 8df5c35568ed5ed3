//! Test doubles for the Kubernetes lookups made while admitting agents.

use nginx_gateway_controller_core::{DiscoverOwners, OwnerRef, PodOwners};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct Owners {
    pods: Mutex<Vec<PodOwners>>,
    replica_sets: Mutex<HashMap<(String, String), Vec<OwnerRef>>>,
}

pub(crate) fn owner(kind: &str, name: &str) -> OwnerRef {
    OwnerRef {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

// === impl Owners ===

impl Owners {
    pub(crate) fn with_pod(self, namespace: &str, name: &str, owners: Vec<OwnerRef>) -> Self {
        self.pods.lock().push(PodOwners {
            namespace: namespace.to_string(),
            name: name.to_string(),
            owners,
        });
        self
    }

    pub(crate) fn with_replica_set(self, namespace: &str, name: &str, owners: Vec<OwnerRef>) -> Self {
        self.add_replica_set(namespace, name, owners);
        self
    }

    pub(crate) fn add_replica_set(&self, namespace: &str, name: &str, owners: Vec<OwnerRef>) {
        self.replica_sets
            .lock()
            .insert((namespace.to_string(), name.to_string()), owners);
    }
}

#[async_trait::async_trait]
impl DiscoverOwners for Owners {
    async fn list_pods(&self, name: &str) -> anyhow::Result<Vec<PodOwners>> {
        Ok(self
            .pods
            .lock()
            .iter()
            .filter(|p| p.name == name)
            .cloned()
            .collect())
    }

    async fn get_replica_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<Option<Vec<OwnerRef>>> {
        Ok(self
            .replica_sets
            .lock()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}
