//! Agent-facing TLS credentials.

use anyhow::{Context, Result};
use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};
use tokio::{sync::watch, time};
use tokio_util::sync::CancellationToken;
use tonic::transport::{Certificate, Identity, Server, ServerTlsConfig};
use tracing::{debug, info};

/// The files holding the gRPC server's TLS credentials.
#[derive(Clone, Debug)]
pub(crate) struct TlsPaths {
    pub(crate) cert: PathBuf,
    pub(crate) key: PathBuf,

    /// When set, agents must present a certificate signed by this CA.
    pub(crate) ca: Option<PathBuf>,
}

// === impl TlsPaths ===

impl TlsPaths {
    /// Builds a server that serves the credentials currently on disk.
    pub(crate) async fn server(&self) -> Result<Server> {
        let config = self.load().await?;
        Server::builder()
            .tls_config(config)
            .context("invalid TLS credentials")
    }

    /// Reads the credentials from disk.
    async fn load(&self) -> Result<ServerTlsConfig> {
        let cert = read(&self.cert).await?;
        let key = read(&self.key).await?;
        let mut config = ServerTlsConfig::new().identity(Identity::from_pem(cert, key));
        if let Some(ca) = &self.ca {
            config = config.client_ca_root(Certificate::from_pem(read(ca).await?));
        }
        Ok(config)
    }

    fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.cert, &self.key].into_iter().chain(self.ca.as_ref())
    }

    async fn modified(&self) -> Vec<Option<SystemTime>> {
        let mut modified = Vec::new();
        for path in self.paths() {
            let mtime = tokio::fs::metadata(path)
                .await
                .and_then(|m| m.modified())
                .ok();
            modified.push(mtime);
        }
        modified
    }

    /// Polls the credential files, signaling `reset` whenever any of them
    /// changes, until `shutdown` is canceled.
    pub(crate) async fn watch(
        self,
        interval: time::Duration,
        reset: watch::Sender<()>,
        shutdown: CancellationToken,
    ) {
        let mut last = self.modified().await;
        let mut interval = time::interval(interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = interval.tick() => {}
            }

            let modified = self.modified().await;
            if modified == last {
                continue;
            }
            info!(cert = %self.cert.display(), "TLS credentials changed");
            last = modified;
            reset.send_replace(());
        }
    }
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    debug!(path = %path.display(), "Reading TLS credentials");
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}
