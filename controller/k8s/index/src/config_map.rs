//! Sources deployment configuration from ConfigMaps.
//!
//! A ConfigMap labelled with the deployment label contributes files to the
//! named deployment in the ConfigMap's namespace. Each data key is a file
//! placed under the directory named by the config-path annotation. The
//! `upstreams.json` key is not a file: it lists upstream servers that are
//! pushed to NGINX Plus through its API.

use crate::SizedIndex;
use ahash::AHashMap as HashMap;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use kubert::index::IndexNamespacedResource;
use nginx_gateway_controller_core::{ConfigUpdate, File, NginxPlusAction, ResourceId, UpstreamServer};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const DEPLOYMENT_LABEL: &str = "gateway.nginx.org/deployment";
pub const CONFIG_PATH_ANNOTATION: &str = "gateway.nginx.org/config-path";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nginx/conf.d";

const UPSTREAMS_KEY: &str = "upstreams.json";

pub type SharedIndex = Arc<RwLock<ConfigMapIndex>>;

#[derive(Debug)]
pub struct ConfigMapIndex {
    label: String,
    updates: mpsc::UnboundedSender<ConfigUpdate>,

    /// The configuration contributed by each ConfigMap, by deployment. Sources
    /// are ordered by ConfigMap name so that a deployment's files are in a
    /// stable order.
    deployments: HashMap<ResourceId, BTreeMap<String, Source>>,

    /// The deployment each indexed ConfigMap contributes to.
    config_maps: HashMap<ResourceId, ResourceId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Source {
    files: Vec<File>,
    actions: Vec<NginxPlusAction>,
}

/// The `upstreams.json` document: upstream names mapped to `address:port`
/// servers.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Upstreams {
    #[serde(default)]
    http: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    stream: BTreeMap<String, Vec<String>>,
}

// === impl ConfigMapIndex ===

impl ConfigMapIndex {
    pub fn new(label: impl Into<String>, updates: mpsc::UnboundedSender<ConfigUpdate>) -> Self {
        Self {
            label: label.into(),
            updates,
            deployments: HashMap::default(),
            config_maps: HashMap::default(),
        }
    }

    pub fn shared(label: impl Into<String>, updates: mpsc::UnboundedSender<ConfigUpdate>) -> SharedIndex {
        Arc::new(RwLock::new(Self::new(label, updates)))
    }

    /// The number of deployments that have configuration.
    pub fn deployments_len(&self) -> usize {
        self.deployments.len()
    }

    fn remove_source(&mut self, deployment: &ResourceId, config_map: &str) {
        let Some(sources) = self.deployments.get_mut(deployment) else {
            return;
        };
        if sources.remove(config_map).is_none() {
            return;
        }

        if sources.is_empty() {
            self.deployments.remove(deployment);
            info!(%deployment, "Deployment has no configuration");
            self.send(ConfigUpdate::Remove(deployment.clone()));
        } else {
            self.publish(deployment);
        }
    }

    fn publish(&self, deployment: &ResourceId) {
        let Some(sources) = self.deployments.get(deployment) else {
            return;
        };
        let files = sources
            .values()
            .flat_map(|s| s.files.iter().cloned())
            .collect::<Vec<_>>();
        let nginx_plus_actions = sources
            .values()
            .flat_map(|s| s.actions.iter().cloned())
            .collect::<Vec<_>>();
        debug!(%deployment, files = files.len(), actions = nginx_plus_actions.len(), "Configuration updated");
        self.send(ConfigUpdate::Apply {
            deployment: deployment.clone(),
            files,
            nginx_plus_actions,
        });
    }

    fn send(&self, update: ConfigUpdate) {
        if self.updates.send(update).is_err() {
            warn!("Configuration publisher closed; dropping update");
        }
    }
}

impl IndexNamespacedResource<ConfigMap> for ConfigMapIndex {
    fn apply(&mut self, cm: ConfigMap) {
        let Some(namespace) = cm.namespace() else {
            warn!(configmap = %cm.name_any(), "Ignoring ConfigMap without a namespace");
            return;
        };
        let name = cm.name_unchecked();
        let id = ResourceId::new(namespace.clone(), name.clone());

        let deployment = match cm.labels().get(&self.label) {
            Some(deployment) if !deployment.is_empty() => {
                ResourceId::new(namespace, deployment.clone())
            }
            _ => {
                debug!(configmap = %id, label = %self.label, "ConfigMap is not labelled with a deployment");
                self.delete(id.namespace, id.name);
                return;
            }
        };

        if let Some(prev) = self.config_maps.insert(id, deployment.clone()) {
            if prev != deployment {
                info!(configmap = %name, from = %prev, to = %deployment, "ConfigMap moved to another deployment");
                self.remove_source(&prev, &name);
            }
        }

        let source = Source::from_config_map(&cm);
        let sources = self.deployments.entry(deployment.clone()).or_default();
        if sources.get(&name) == Some(&source) {
            return;
        }
        sources.insert(name, source);
        self.publish(&deployment);
    }

    fn delete(&mut self, namespace: String, name: String) {
        let id = ResourceId::new(namespace, name);
        if let Some(deployment) = self.config_maps.remove(&id) {
            self.remove_source(&deployment, &id.name);
        }
    }
}

impl SizedIndex<ConfigMap> for ConfigMapIndex {
    fn size(&self) -> usize {
        self.config_maps.len()
    }
}

// === impl Source ===

impl Source {
    fn from_config_map(cm: &ConfigMap) -> Self {
        let dir = cm
            .annotations()
            .get(CONFIG_PATH_ANNOTATION)
            .map(String::as_str)
            .filter(|path| !path.is_empty())
            .unwrap_or(DEFAULT_CONFIG_PATH)
            .trim_end_matches('/');

        let mut files = Vec::new();
        let mut actions = Vec::new();
        for (key, value) in cm.data.iter().flatten() {
            if key == UPSTREAMS_KEY {
                match serde_json::from_str::<Upstreams>(value) {
                    Ok(upstreams) => actions = upstreams.into_actions(),
                    Err(error) => {
                        warn!(configmap = %cm.name_any(), %error, "Ignoring invalid upstreams.json");
                    }
                }
                continue;
            }
            files.push(File::new(format!("{dir}/{key}"), value.clone()));
        }
        for (key, value) in cm.binary_data.iter().flatten() {
            files.push(File::new(format!("{dir}/{key}"), value.0.clone()));
        }

        Self { files, actions }
    }
}

// === impl Upstreams ===

impl Upstreams {
    fn into_actions(self) -> Vec<NginxPlusAction> {
        let servers = |addrs: Vec<String>| -> Vec<UpstreamServer> {
            addrs
                .into_iter()
                .map(|address| UpstreamServer { address })
                .collect()
        };
        let http = self
            .http
            .into_iter()
            .map(|(upstream, addrs)| NginxPlusAction::UpdateHttpUpstreamServers {
                upstream,
                servers: servers(addrs),
            });
        let stream = self
            .stream
            .into_iter()
            .map(|(upstream, addrs)| NginxPlusAction::UpdateStreamServers {
                upstream,
                servers: servers(addrs),
            });
        http.chain(stream).collect()
    }
}
