#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use nginx_gateway_controller_core as core;
pub use nginx_gateway_controller_grpc as grpc;
pub use nginx_gateway_controller_k8s_index as index;

mod args;
mod metrics;
mod status;
mod tls;

pub use self::args::Args;

/// Resolves pod owners against the owners index.
#[derive(Clone, Debug)]
struct OwnersDiscover(index::owners::SharedIndex);

impl OwnersDiscover {
    pub fn new(index: index::owners::SharedIndex) -> Self {
        Self(index)
    }
}

#[async_trait::async_trait]
impl core::DiscoverOwners for OwnersDiscover {
    async fn list_pods(&self, name: &str) -> anyhow::Result<Vec<core::PodOwners>> {
        Ok(self.0.read().pods_named(name))
    }

    async fn get_replica_set(
        &self,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<Option<Vec<core::OwnerRef>>> {
        Ok(self.0.read().replica_set(namespace, name))
    }
}
