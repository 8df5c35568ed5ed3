//! Resolves the Deployment or DaemonSet that owns an NGINX pod.

use nginx_gateway_controller_core::{DiscoverOwners, OwnerRef, ResourceId};
use tokio::time;
use tracing::debug;

const REPLICA_SET_POLL_INTERVAL: time::Duration = time::Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum OwnerError {
    #[error("failed to list pods: {0}")]
    ListPods(#[source] anyhow::Error),

    #[error("no pods found with name {0}")]
    PodNotFound(String),

    #[error("should only be one pod with name {0}")]
    AmbiguousPod(String),

    #[error("expected one owner reference of the nginx Pod, got {0}")]
    PodOwners(usize),

    #[error("expected pod owner reference to be ReplicaSet or DaemonSet, got {0}")]
    UnsupportedOwner(String),

    #[error("failed to get nginx Pod's ReplicaSet: {0}")]
    ReplicaSet(#[source] anyhow::Error),

    #[error("expected one owner reference of the nginx ReplicaSet, got {0}")]
    ReplicaSetOwners(usize),
}

/// Finds the resource that groups `pod_name` with the other pods of its NGINX
/// fleet.
///
/// Pods owned by a ReplicaSet are grouped by the ReplicaSet's owner. The
/// ReplicaSet may not have been observed yet when its pods start, so it is
/// polled for until `timeout` elapses.
pub async fn resolve_parent(
    discover: &dyn DiscoverOwners,
    pod_name: &str,
    timeout: time::Duration,
) -> Result<ResourceId, OwnerError> {
    let mut pods = discover
        .list_pods(pod_name)
        .await
        .map_err(OwnerError::ListPods)?;
    let pod = match pods.len() {
        0 => return Err(OwnerError::PodNotFound(pod_name.to_string())),
        1 => pods.remove(0),
        _ => return Err(OwnerError::AmbiguousPod(pod_name.to_string())),
    };

    let owner = single_owner(pod.owners).map_err(OwnerError::PodOwners)?;
    match owner.kind.as_str() {
        "DaemonSet" => Ok(ResourceId::new(pod.namespace, owner.name)),
        "ReplicaSet" => {
            let owners = poll_replica_set(discover, &pod.namespace, &owner.name, timeout).await?;
            let owner = single_owner(owners).map_err(OwnerError::ReplicaSetOwners)?;
            Ok(ResourceId::new(pod.namespace, owner.name))
        }
        _ => Err(OwnerError::UnsupportedOwner(owner.kind)),
    }
}

fn single_owner(mut owners: Vec<OwnerRef>) -> Result<OwnerRef, usize> {
    if owners.len() != 1 {
        return Err(owners.len());
    }
    Ok(owners.remove(0))
}

async fn poll_replica_set(
    discover: &dyn DiscoverOwners,
    namespace: &str,
    name: &str,
    timeout: time::Duration,
) -> Result<Vec<OwnerRef>, OwnerError> {
    let deadline = time::Instant::now() + timeout;
    let mut interval = time::interval(REPLICA_SET_POLL_INTERVAL);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    let mut last_error = None;
    loop {
        tokio::select! {
            _ = time::sleep_until(deadline) => {
                let error = last_error.unwrap_or_else(|| {
                    anyhow::anyhow!("timed out waiting for ReplicaSet {namespace}/{name}")
                });
                return Err(OwnerError::ReplicaSet(error));
            }
            _ = interval.tick() => {}
        }

        match discover.get_replica_set(namespace, name).await {
            Ok(Some(owners)) => return Ok(owners),
            Ok(None) => debug!(%namespace, %name, "ReplicaSet not found"),
            Err(error) => {
                debug!(%namespace, %name, %error, "Failed to get ReplicaSet");
                last_error = Some(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{owner, Owners};

    const TIMEOUT: time::Duration = time::Duration::from_secs(30);

    #[tokio::test]
    async fn daemon_set_owner() {
        let owners = Owners::default().with_pod("ns", "ngx-1", vec![owner("DaemonSet", "ds-1")]);
        let parent = resolve_parent(&owners, "ngx-1", TIMEOUT).await.unwrap();
        assert_eq!(parent, ResourceId::new("ns", "ds-1"));
    }

    #[tokio::test]
    async fn replica_set_owner() {
        let owners = Owners::default()
            .with_pod("ns", "ngx-1", vec![owner("ReplicaSet", "rs-1")])
            .with_replica_set("ns", "rs-1", vec![owner("Deployment", "dep-1")]);
        let parent = resolve_parent(&owners, "ngx-1", TIMEOUT).await.unwrap();
        assert_eq!(parent, ResourceId::new("ns", "dep-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn replica_set_observed_late() {
        let owners = std::sync::Arc::new(
            Owners::default().with_pod("ns", "ngx-1", vec![owner("ReplicaSet", "rs-1")]),
        );

        let resolve = tokio::spawn({
            let owners = owners.clone();
            async move { resolve_parent(&*owners, "ngx-1", TIMEOUT).await }
        });
        time::sleep(time::Duration::from_secs(3)).await;
        assert!(!resolve.is_finished());

        owners.add_replica_set("ns", "rs-1", vec![owner("Deployment", "dep-1")]);
        let parent = resolve.await.unwrap().unwrap();
        assert_eq!(parent, ResourceId::new("ns", "dep-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn replica_set_timeout() {
        let owners = Owners::default().with_pod("ns", "ngx-1", vec![owner("ReplicaSet", "rs-1")]);
        let error = resolve_parent(&owners, "ngx-1", TIMEOUT).await.unwrap_err();
        assert!(matches!(error, OwnerError::ReplicaSet(_)));
        assert_eq!(
            error.to_string(),
            "failed to get nginx Pod's ReplicaSet: timed out waiting for ReplicaSet ns/rs-1"
        );
    }

    #[tokio::test]
    async fn pod_lookup_errors() {
        let owners = Owners::default()
            .with_pod("ns-0", "ngx-1", vec![owner("DaemonSet", "ds-1")])
            .with_pod("ns-1", "ngx-1", vec![owner("DaemonSet", "ds-1")]);
        assert!(matches!(
            resolve_parent(&owners, "ngx-2", TIMEOUT).await,
            Err(OwnerError::PodNotFound(_))
        ));
        assert!(matches!(
            resolve_parent(&owners, "ngx-1", TIMEOUT).await,
            Err(OwnerError::AmbiguousPod(_))
        ));
    }

    #[tokio::test]
    async fn owner_reference_errors() {
        let owners = Owners::default()
            .with_pod(
                "ns",
                "two-owners",
                vec![owner("DaemonSet", "ds-1"), owner("DaemonSet", "ds-2")],
            )
            .with_pod("ns", "no-owners", vec![])
            .with_pod("ns", "stateful", vec![owner("StatefulSet", "sts-1")])
            .with_pod("ns", "orphaned-rs", vec![owner("ReplicaSet", "rs-1")])
            .with_replica_set("ns", "rs-1", vec![]);

        let error = resolve_parent(&owners, "two-owners", TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "expected one owner reference of the nginx Pod, got 2"
        );
        assert!(matches!(
            resolve_parent(&owners, "no-owners", TIMEOUT).await,
            Err(OwnerError::PodOwners(0))
        ));

        let error = resolve_parent(&owners, "stateful", TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "expected pod owner reference to be ReplicaSet or DaemonSet, got StatefulSet"
        );

        assert!(matches!(
            resolve_parent(&owners, "orphaned-rs", TIMEOUT).await,
            Err(OwnerError::ReplicaSetOwners(0))
        ));
    }
}
