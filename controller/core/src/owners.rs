/// A reference to the controller of a Kubernetes object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
}

/// A pod and the objects that own it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodOwners {
    pub namespace: String,
    pub name: String,
    pub owners: Vec<OwnerRef>,
}

/// Looks up the Kubernetes objects that own NGINX pods.
#[async_trait::async_trait]
pub trait DiscoverOwners: Send + Sync {
    /// Lists all pods with the given name, across namespaces.
    async fn list_pods(&self, name: &str) -> anyhow::Result<Vec<PodOwners>>;

    /// Returns the owners of a ReplicaSet, or `None` if the ReplicaSet is not
    /// (yet) known.
    async fn get_replica_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<Option<Vec<OwnerRef>>>;
}
