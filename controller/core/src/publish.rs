use crate::{
    BroadcastMessage, Deployment, File, NginxPlusAction, QueueObject, ResourceId,
    SharedDeployments, StatusQueue, UpdateType,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A change to the desired configuration of a deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigUpdate {
    Apply {
        deployment: ResourceId,
        files: Vec<File>,
        nginx_plus_actions: Vec<NginxPlusAction>,
    },
    Remove(ResourceId),
}

/// Applies configuration updates to deployments and pushes them to the
/// deployments' agents.
#[derive(Clone, Debug)]
pub struct Publisher {
    deployments: SharedDeployments,
    statuses: StatusQueue,
}

// === impl Publisher ===

impl Publisher {
    pub fn new(deployments: SharedDeployments, statuses: StatusQueue) -> Self {
        Self {
            deployments,
            statuses,
        }
    }

    /// Processes updates until the sender is dropped.
    pub async fn run(self, mut updates: tokio::sync::mpsc::UnboundedReceiver<ConfigUpdate>) {
        while let Some(update) = updates.recv().await {
            self.apply(update).await;
        }
        debug!("Configuration updates closed");
    }

    pub async fn apply(&self, update: ConfigUpdate) {
        match update {
            ConfigUpdate::Apply {
                deployment,
                files,
                nginx_plus_actions,
            } => {
                self.update_files(&deployment, files).await;
                self.update_nginx_plus_actions(&deployment, nginx_plus_actions)
                    .await;
            }
            ConfigUpdate::Remove(deployment) => {
                info!(%deployment, "Removing deployment");
                self.deployments.remove(&deployment);
            }
        }
    }

    /// Replaces a deployment's files and, if they changed, waits for every
    /// connected agent to respond to the new configuration.
    ///
    /// Returns true if the configuration changed.
    pub async fn update_files(&self, id: &ResourceId, files: Vec<File>) -> bool {
        let deployment = self.deployments.get_or_store(id);
        let _lock = deployment.lock_files().await;

        let Some(msg) = deployment.set_files(files) else {
            debug!(deployment = %id, "Configuration unchanged");
            return false;
        };
        if let BroadcastMessage::ConfigApply { config_version, .. } = &msg {
            info!(deployment = %id, %config_version, "Publishing configuration");
        }
        self.broadcast(id, &deployment, msg).await;
        true
    }

    /// Replaces a deployment's NGINX Plus actions and sends each of them to the
    /// connected agents.
    pub async fn update_nginx_plus_actions(&self, id: &ResourceId, actions: Vec<NginxPlusAction>) {
        let Some(deployment) = self.deployments.get(id) else {
            return;
        };
        let _lock = deployment.lock_files().await;

        if deployment.nginx_plus_actions() == actions {
            return;
        }
        deployment.set_nginx_plus_actions(actions.clone());
        for action in actions {
            debug!(deployment = %id, upstream = action.upstream(), "Publishing NGINX Plus action");
            self.broadcast(id, &deployment, BroadcastMessage::ApiRequest(action))
                .await;
        }
    }

    async fn broadcast(&self, id: &ResourceId, deployment: &Arc<Deployment>, msg: BroadcastMessage) {
        if !deployment.broadcaster().send(msg).await {
            // No agents are connected; they'll receive the configuration when
            // they subscribe.
            return;
        }
        self.statuses.enqueue(QueueObject {
            deployment: id.clone(),
            error: deployment.configuration_status(),
            update_type: UpdateType::All,
        });
    }
}
