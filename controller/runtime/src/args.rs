use crate::{
    core, grpc, index, metrics, status::StatusReporter, tls::TlsPaths, OwnersDiscover,
};
use anyhow::{bail, Result};
use clap::Parser;
use futures::prelude::*;
use k8s_openapi::api::{
    apps::v1::ReplicaSet,
    core::v1::{ConfigMap, Pod},
};
use kube::runtime::watcher;
use prometheus_client::registry::Registry;
use std::{net::SocketAddr, path::PathBuf};
use tokio::{
    sync::{mpsc, watch},
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tonic::{service::interceptor::InterceptedService, transport::Server};
use tracing::{error, info, info_span, instrument, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "nginx-gateway-controller",
    about = "Manages the configuration of NGINX agents"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "nginx_gateway=info,warn",
        env = "NGINX_GATEWAY_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    #[clap(long, default_value = "0.0.0.0:8443")]
    grpc_addr: SocketAddr,

    /// Serves agents over TLS with this PEM-encoded certificate.
    #[clap(long, requires = "agent_tls_key")]
    agent_tls_cert: Option<PathBuf>,

    #[clap(long, requires = "agent_tls_cert")]
    agent_tls_key: Option<PathBuf>,

    /// Requires agents to present a certificate signed by this CA.
    #[clap(long, requires = "agent_tls_cert")]
    agent_tls_ca: Option<PathBuf>,

    /// How often the TLS credential files are checked for changes.
    #[clap(long, default_value = "10")]
    tls_poll_interval_secs: u64,

    /// How long a subscribing agent may take to report its NGINX instance.
    #[clap(long, default_value = "30")]
    connection_timeout_secs: u64,

    #[clap(long, default_value = "30")]
    pod_owner_timeout_secs: u64,

    /// Selects the NGINX pods whose agents may connect. All pods are watched
    /// when unset.
    #[clap(long)]
    pod_label_selector: Option<String>,

    /// The label naming the deployment a ConfigMap configures.
    #[clap(long, default_value = index::config_map::DEPLOYMENT_LABEL)]
    config_map_label: String,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            grpc_addr,
            agent_tls_cert,
            agent_tls_key,
            agent_tls_ca,
            tls_poll_interval_secs,
            connection_timeout_secs,
            pod_owner_timeout_secs,
            pod_label_selector,
            config_map_label,
        } = self;

        let tls = match (agent_tls_cert, agent_tls_key) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert,
                key,
                ca: agent_tls_ca,
            }),
            (None, None) => None,
            _ => bail!("--agent-tls-cert and --agent-tls-key must be set together"),
        };

        // Shared state between the indexes, the publisher and the agents'
        // subscriptions.
        let connections = core::ConnectionsTracker::shared();
        let deployments = core::DeploymentStore::shared();
        let (statuses, status_rx) = core::StatusQueue::channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let owners_index = index::OwnersIndex::shared();
        let config_map_index = index::ConfigMapIndex::shared(config_map_label.clone(), updates_tx);

        let mut prom = <Registry>::default();
        let grpc_metrics =
            grpc::GrpcServerMetricsFamily::register(prom.sub_registry_with_prefix("grpc_server"));
        let index_metrics = index::IndexMetrics::register(prom.sub_registry_with_prefix("index"));
        let status_reporter = StatusReporter::register(prom.sub_registry_with_prefix("status"));
        metrics::register(
            prom.sub_registry_with_prefix("nginx"),
            connections.clone(),
            deployments.clone(),
        );
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        // Spawn resource watches.

        let mut pods_config = watcher::Config::default();
        if let Some(selector) = &pod_label_selector {
            pods_config = pods_config.labels(selector);
        }
        let pods = runtime.watch_all::<Pod>(pods_config);
        tokio::spawn(
            kubert::index::namespaced(index::IndexMetrics::instrument(&index_metrics, owners_index.clone()), pods)
                .instrument(info_span!("pods")),
        );

        let replica_sets = runtime.watch_all::<ReplicaSet>(watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(index::IndexMetrics::instrument(&index_metrics, owners_index.clone()), replica_sets)
                .instrument(info_span!("replicasets")),
        );

        let config_maps =
            runtime.watch_all::<ConfigMap>(watcher::Config::default().labels(&config_map_label));
        tokio::spawn(
            kubert::index::namespaced(index::IndexMetrics::instrument(&index_metrics, config_map_index), config_maps)
                .instrument(info_span!("configmaps")),
        );

        // Push configuration changes to agents and report their outcome.
        tokio::spawn(
            core::Publisher::new(deployments.clone(), statuses.clone())
                .run(updates_rx)
                .instrument(info_span!("publisher")),
        );
        tokio::spawn(
            status_reporter
                .run(status_rx)
                .instrument(info_span!("status")),
        );

        // Agents' subscriptions are reset (and the server restarted) whenever
        // the TLS credentials change.
        let shutdown = CancellationToken::new();
        let (reset_tx, reset_rx) = watch::channel(());
        if let Some(tls) = tls.clone() {
            tokio::spawn(
                tls.watch(
                    Duration::from_secs(tls_poll_interval_secs),
                    reset_tx,
                    shutdown.clone(),
                )
                .instrument(info_span!("tls")),
            );
        }

        let command = grpc::CommandServer::new(
            OwnersDiscover::new(owners_index),
            connections.clone(),
            deployments.clone(),
            statuses,
            shutdown.clone(),
            &grpc_metrics,
        )
        .with_reset(reset_rx.clone())
        .with_timeouts(grpc::Timeouts {
            connection: Duration::from_secs(connection_timeout_secs),
            pod_owner: Duration::from_secs(pod_owner_timeout_secs),
        });
        let files = grpc::FileServer::new(connections, deployments, &grpc_metrics);

        // Run the gRPC server, serving agents from the shared state.
        let mut server = tokio::spawn(grpc(
            grpc_addr,
            tls,
            command,
            files,
            reset_rx,
            shutdown,
            runtime.shutdown_handle(),
        ));

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting. Agents can't be served if the gRPC server fails, so exit with its
        // error.
        let run = runtime.run();
        tokio::pin!(run);
        tokio::select! {
            res = &mut run => {
                if res.is_err() {
                    bail!("Aborted");
                }
            }
            res = &mut server => {
                if let Err(error) = res? {
                    error!(%error, "Agent gRPC server failed");
                    return Err(error.context("agent gRPC server failed"));
                }
                if run.await.is_err() {
                    bail!("Aborted");
                }
            }
        }

        Ok(())
    }
}

#[instrument(skip_all, fields(port = %addr.port()))]
async fn grpc(
    addr: SocketAddr,
    tls: Option<TlsPaths>,
    command: grpc::CommandServer<OwnersDiscover>,
    files: grpc::FileServer,
    mut reload: watch::Receiver<()>,
    shutdown: CancellationToken,
    drain: drain::Watch,
) -> Result<()> {
    let command_svc = InterceptedService::new(command.svc(), grpc::interceptor);
    let file_svc = InterceptedService::new(files.svc(), grpc::interceptor);
    let _ = reload.borrow_and_update();

    let mut server = match &tls {
        Some(tls) => tls.server().await?,
        None => Server::builder(),
    };

    loop {
        let (close_tx, close_rx) = tokio::sync::oneshot::channel();
        tokio::pin! {
            let srv = server
                .add_service(command_svc.clone())
                .add_service(file_svc.clone())
                .serve_with_shutdown(addr, close_rx.map(|_| {}));
        }

        info!(%addr, tls = tls.is_some(), "Agent gRPC server listening");
        server = loop {
            tokio::select! {
                res = (&mut srv) => return res.map_err(Into::into),
                handle = drain.clone().signaled() => {
                    // Subscriptions end before the server stops accepting requests.
                    shutdown.cancel();
                    let _ = close_tx.send(());
                    return handle.release_after(srv).await.map_err(Into::into);
                }
                Ok(()) = reload.changed() => {
                    let Some(tls) = &tls else { continue };
                    // Credentials may be caught mid-rotation; keep serving with
                    // the previous ones until the next change.
                    match tls.server().await {
                        Ok(server) => break server,
                        Err(error) => error!(%error, "Failed to reload TLS credentials"),
                    }
                }
            }
        };

        info!("Restarting agent gRPC server with new TLS credentials");
        let _ = close_tx.send(());
        srv.await?;
    }
}
