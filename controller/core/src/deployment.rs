use crate::{
    files, BroadcastMessage, Broadcaster, File, FileMeta, NginxPlusAction, ResourceId, StatusError,
};
use ahash::AHashMap as HashMap;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::{collections::BTreeMap, sync::Arc};

pub type SharedDeployments = Arc<DeploymentStore>;

/// The NGINX pods backing a single Deployment or DaemonSet, along with the
/// configuration all of them should be running.
#[derive(Debug, Default)]
pub struct Deployment {
    /// Held for the duration of a configuration transaction with agents, so
    /// that at most one apply round trip is outstanding per deployment.
    file_lock: tokio::sync::Mutex<()>,
    state: RwLock<State>,
    pod_statuses: Mutex<BTreeMap<String, StatusError>>,
    broadcaster: Broadcaster,
}

#[derive(Debug, Default)]
struct State {
    files: Vec<File>,
    config_version: String,
    nginx_plus_actions: Vec<NginxPlusAction>,
}

/// Indexes deployments by the resource that owns their pods.
#[derive(Debug, Default)]
pub struct DeploymentStore {
    deployments: RwLock<HashMap<ResourceId, Arc<Deployment>>>,
}

// === impl Deployment ===

impl Deployment {
    /// Acquires the lock that serializes configuration transactions.
    pub async fn lock_files(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.file_lock.lock().await
    }

    /// Returns the current file overviews and their config version.
    pub fn file_overviews(&self) -> (Vec<FileMeta>, String) {
        let state = self.state.read();
        let files = state.files.iter().map(|f| f.meta.clone()).collect();
        (files, state.config_version.clone())
    }

    pub fn nginx_plus_actions(&self) -> Vec<NginxPlusAction> {
        self.state.read().nginx_plus_actions.clone()
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Records the outcome of the last configuration transaction for a pod.
    /// `None` clears a previously recorded error.
    pub fn set_pod_error_status(&self, pod: &str, error: Option<StatusError>) {
        let mut statuses = self.pod_statuses.lock();
        match error {
            Some(error) => {
                statuses.insert(pod.to_string(), error);
            }
            None => {
                statuses.remove(pod);
            }
        }
    }

    pub fn remove_pod_status(&self, pod: &str) {
        self.pod_statuses.lock().remove(pod);
    }

    /// Joins the errors of all pods, ordered by pod name.
    pub fn configuration_status(&self) -> Option<StatusError> {
        StatusError::join(self.pod_statuses.lock().values().cloned())
    }

    /// Replaces the deployment's files.
    ///
    /// Returns the message to broadcast to agents, or `None` if the files
    /// describe the configuration that is already current.
    pub fn set_files(&self, files: Vec<File>) -> Option<BroadcastMessage> {
        let config_version = files::config_version(files.iter().map(|f| &f.meta));
        let mut state = self.state.write();
        if state.config_version == config_version {
            return None;
        }

        let metas = files.iter().map(|f| f.meta.clone()).collect();
        state.files = files;
        state.config_version = config_version.clone();
        Some(BroadcastMessage::ConfigApply {
            files: metas,
            config_version,
        })
    }

    pub fn set_nginx_plus_actions(&self, actions: Vec<NginxPlusAction>) {
        self.state.write().nginx_plus_actions = actions;
    }

    /// Returns the contents of the named file if its hash matches.
    pub fn file(&self, name: &str, hash: &str) -> Option<Bytes> {
        self.state
            .read()
            .files
            .iter()
            .find(|f| f.meta.name == name && f.meta.hash == hash)
            .map(|f| f.contents.clone())
    }
}

// === impl DeploymentStore ===

impl DeploymentStore {
    pub fn shared() -> SharedDeployments {
        Arc::new(Self::default())
    }

    pub fn get(&self, id: &ResourceId) -> Option<Arc<Deployment>> {
        self.deployments.read().get(id).cloned()
    }

    pub fn get_or_store(&self, id: &ResourceId) -> Arc<Deployment> {
        if let Some(deployment) = self.get(id) {
            return deployment;
        }
        self.deployments
            .write()
            .entry(id.clone())
            .or_default()
            .clone()
    }

    /// Removes a deployment and ends all of its subscriptions.
    pub fn remove(&self, id: &ResourceId) {
        if let Some(deployment) = self.deployments.write().remove(id) {
            deployment.broadcaster.close();
        }
    }

    pub fn len(&self) -> usize {
        self.deployments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.read().is_empty()
    }
}
