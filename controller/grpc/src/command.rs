use crate::{
    metrics::{GrpcServerMetricsFamily, GrpcServerRpcMetrics},
    owner,
    peer::PeerInfo,
};
use futures::prelude::*;
use nginx_agent_api::v1::{
    self as proto,
    command_service_server::{CommandService, CommandServiceServer},
};
use nginx_gateway_controller_core::{
    Connection, DiscoverOwners, SharedConnections, SharedDeployments, StatusQueue,
};
use tokio::{
    sync::{mpsc, watch},
    time,
};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, field, info, info_span, Instrument};

mod subscribe;

#[cfg(test)]
mod tests;

use self::subscribe::Subscription;

const SERVICE: &str = "nginx.agent.v1.CommandService";

/// Serves the agent's `CommandService`: admits agent connections and drives
/// each agent's subscription.
#[derive(Debug)]
pub struct CommandServer<T> {
    discover: T,
    connections: SharedConnections,
    deployments: SharedDeployments,
    statuses: StatusQueue,
    reset: watch::Receiver<()>,
    shutdown: CancellationToken,
    timeouts: Timeouts,
    metrics: CommandMetrics,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Bounds how long a subscription waits for its agent to report an NGINX
    /// instance and for the agent's deployment to be known.
    pub connection: time::Duration,

    /// Bounds how long connection admission waits for a pod's ReplicaSet.
    pub pod_owner: time::Duration,
}

#[derive(Clone, Debug)]
struct CommandMetrics {
    create_connection: GrpcServerRpcMetrics,
    update_data_plane_status: GrpcServerRpcMetrics,
    update_data_plane_health: GrpcServerRpcMetrics,
    subscribe: GrpcServerRpcMetrics,
}

type ResponseStream = ReceiverStream<Result<proto::ManagementPlaneRequest, tonic::Status>>;

// === impl CommandServer ===

impl<T> CommandServer<T>
where
    T: DiscoverOwners + 'static,
{
    pub fn new(
        discover: T,
        connections: SharedConnections,
        deployments: SharedDeployments,
        statuses: StatusQueue,
        shutdown: CancellationToken,
        metrics: &GrpcServerMetricsFamily,
    ) -> Self {
        // Without a reset sender, subscriptions are never reset.
        let (_, reset) = watch::channel(());
        Self {
            discover,
            connections,
            deployments,
            statuses,
            reset,
            shutdown,
            timeouts: Timeouts::default(),
            metrics: CommandMetrics::new(metrics),
        }
    }

    /// Ends all subscriptions with `Unavailable` whenever `reset` changes, so
    /// that agents reconnect (e.g. with new TLS credentials).
    pub fn with_reset(mut self, reset: watch::Receiver<()>) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn svc(self) -> CommandServiceServer<Self> {
        CommandServiceServer::new(self)
    }

    async fn connect(
        &self,
        req: tonic::Request<proto::CreateConnectionRequest>,
    ) -> Result<tonic::Response<proto::CreateConnectionResponse>, tonic::Status> {
        let peer = PeerInfo::from_request(&req);
        let resource = req
            .into_inner()
            .resource
            .ok_or_else(|| tonic::Status::invalid_argument("empty connection request"))?;
        let peer = peer?;

        let pod_name = resource.container_hostname().unwrap_or_default();
        let instance_id = proto::nginx_instance_id(&resource.instances);
        let parent = owner::resolve_parent(&self.discover, pod_name, self.timeouts.pod_owner)
            .await
            .map_err(|error| {
                error!(%error, pod = %pod_name, "Failed to get pod owner");
                tonic::Status::internal(format!("error getting pod owner {error}"))
            })?;

        info!(peer = %peer.ip, pod = %pod_name, %parent, %instance_id, "Creating connection");
        self.connections.track(
            peer.key(),
            Connection {
                pod_name: pod_name.to_string(),
                instance_id: instance_id.to_string(),
                parent,
            },
        );

        Ok(tonic::Response::new(proto::CreateConnectionResponse {
            response: Some(proto::CommandResponse::ok()),
        }))
    }

    fn update_status(
        &self,
        req: tonic::Request<proto::UpdateDataPlaneStatusRequest>,
    ) -> Result<tonic::Response<proto::UpdateDataPlaneStatusResponse>, tonic::Status> {
        let peer = PeerInfo::from_request(&req);
        let resource = req.into_inner().resource.ok_or_else(|| {
            tonic::Status::invalid_argument("empty UpdateDataPlaneStatus request")
        })?;
        let peer = peer?;

        let instance_id = proto::nginx_instance_id(&resource.instances);
        if instance_id.is_empty() {
            return Err(tonic::Status::invalid_argument(
                "request does not contain nginx instanceID",
            ));
        }

        self.connections.set_instance_id(&peer.key(), instance_id);
        Ok(tonic::Response::new(proto::UpdateDataPlaneStatusResponse {}))
    }

    /// Runs the subscription protocol for an agent's stream of responses,
    /// returning the stream of requests to send to the agent.
    pub fn subscribe_stream<S>(&self, peer: PeerInfo, inbound: S) -> ResponseStream
    where
        S: Stream<Item = Result<proto::DataPlaneResponse, tonic::Status>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let ctx = self.shutdown.child_token();

        // The subscription's context ends when the agent goes away.
        tokio::spawn({
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move {
                tokio::select! {
                    _ = tx.closed() => ctx.cancel(),
                    _ = ctx.cancelled() => {}
                }
            }
        });

        let span = info_span!("subscribe", peer = %peer.ip, pod = field::Empty);
        let sub = Subscription {
            peer,
            connections: self.connections.clone(),
            deployments: self.deployments.clone(),
            statuses: self.statuses.clone(),
            reset: self.reset.clone(),
            connection_timeout: self.timeouts.connection,
            shutdown: self.shutdown.clone(),
            ctx,
            observer: self.metrics.subscribe.start_stream(),
        };
        tokio::spawn(
            async move {
                let messenger = span.in_scope(|| {
                    crate::Messenger::spawn(inbound, tx, sub.ctx.clone())
                });
                sub.run(messenger).instrument(span).await
            },
        );

        ReceiverStream::new(rx)
    }
}

#[async_trait::async_trait]
impl<T> CommandService for CommandServer<T>
where
    T: DiscoverOwners + 'static,
{
    async fn create_connection(
        &self,
        req: tonic::Request<proto::CreateConnectionRequest>,
    ) -> Result<tonic::Response<proto::CreateConnectionResponse>, tonic::Status> {
        let metrics = self.metrics.create_connection.start();
        metrics.observe(self.connect(req).await)
    }

    async fn update_data_plane_status(
        &self,
        req: tonic::Request<proto::UpdateDataPlaneStatusRequest>,
    ) -> Result<tonic::Response<proto::UpdateDataPlaneStatusResponse>, tonic::Status> {
        let metrics = self.metrics.update_data_plane_status.start();
        metrics.observe(self.update_status(req))
    }

    async fn update_data_plane_health(
        &self,
        _req: tonic::Request<proto::UpdateDataPlaneHealthRequest>,
    ) -> Result<tonic::Response<proto::UpdateDataPlaneHealthResponse>, tonic::Status> {
        let metrics = self.metrics.update_data_plane_health.start();
        metrics.observe(Ok(tonic::Response::new(
            proto::UpdateDataPlaneHealthResponse {},
        )))
    }

    type SubscribeStream = ResponseStream;

    async fn subscribe(
        &self,
        req: tonic::Request<tonic::Streaming<proto::DataPlaneResponse>>,
    ) -> Result<tonic::Response<ResponseStream>, tonic::Status> {
        let peer = PeerInfo::from_request(&req)?;
        Ok(tonic::Response::new(
            self.subscribe_stream(peer, req.into_inner()),
        ))
    }
}

// === impl Timeouts ===

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connection: time::Duration::from_secs(30),
            pod_owner: time::Duration::from_secs(30),
        }
    }
}

// === impl CommandMetrics ===

impl CommandMetrics {
    fn new(family: &GrpcServerMetricsFamily) -> Self {
        Self {
            create_connection: family.unary_rpc(SERVICE, "CreateConnection"),
            update_data_plane_status: family.unary_rpc(SERVICE, "UpdateDataPlaneStatus"),
            update_data_plane_health: family.unary_rpc(SERVICE, "UpdateDataPlaneHealth"),
            subscribe: family.bidi_stream_rpc(SERVICE, "Subscribe"),
        }
    }
}
