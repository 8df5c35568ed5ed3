use super::*;
use crate::fake::{owner, Owners};
use nginx_agent_api::v1::{management_plane_request::Request, CommandResponse, DataPlaneResponse};
use nginx_gateway_controller_core::{
    ConnectionsTracker, DeploymentStore, File, NginxPlusAction, Publisher, QueueObject, ResourceId,
    StatusError, UpdateType, UpstreamServer,
};
use prometheus_client::registry::Registry;

struct Harness {
    server: CommandServer<Owners>,
    connections: SharedConnections,
    deployments: SharedDeployments,
    statuses: StatusQueue,
    status_rx: mpsc::UnboundedReceiver<QueueObject>,
    reset: watch::Sender<()>,
}

struct Agent {
    tx: mpsc::Sender<Result<proto::DataPlaneResponse, tonic::Status>>,
    rx: ResponseStream,
}

const PEER: &str = "10.0.0.1";

fn peer() -> PeerInfo {
    PeerInfo {
        ip: [10, 0, 0, 1].into(),
    }
}

fn parent() -> ResourceId {
    ResourceId::new("ns", "dep-1")
}

fn harness() -> Harness {
    let owners = Owners::default()
        .with_pod("ns", "ngx-1", vec![owner("ReplicaSet", "rs-1")])
        .with_replica_set("ns", "rs-1", vec![owner("Deployment", "dep-1")])
        .with_pod("ns", "ngx-ds", vec![owner("DaemonSet", "ds-1")])
        .with_pod(
            "ns",
            "ngx-2",
            vec![owner("ReplicaSet", "rs-1"), owner("ReplicaSet", "rs-2")],
        );
    let connections = ConnectionsTracker::shared();
    let deployments = DeploymentStore::shared();
    let (statuses, status_rx) = StatusQueue::channel();
    let (reset, reset_rx) = watch::channel(());
    let metrics = GrpcServerMetricsFamily::register(&mut Registry::default());
    let server = CommandServer::new(
        owners,
        connections.clone(),
        deployments.clone(),
        statuses.clone(),
        CancellationToken::new(),
        &metrics,
    )
    .with_reset(reset_rx);
    Harness {
        server,
        connections,
        deployments,
        statuses,
        status_rx,
        reset,
    }
}

fn request<T>(msg: T) -> tonic::Request<T> {
    let mut req = tonic::Request::new(msg);
    req.extensions_mut().insert(peer());
    req
}

fn resource(pod: &str, instance_id: Option<&str>) -> proto::Resource {
    proto::Resource {
        resource_id: "resource-1".to_string(),
        instances: instance_id
            .map(|id| proto::Instance {
                instance_meta: Some(proto::InstanceMeta {
                    instance_id: id.to_string(),
                    instance_type: proto::InstanceType::Nginx.into(),
                    version: "1.27.4".to_string(),
                }),
            })
            .into_iter()
            .collect(),
        info: Some(proto::resource::Info::ContainerInfo(proto::ContainerInfo {
            container_id: "container-1".to_string(),
            hostname: pod.to_string(),
        })),
    }
}

fn ok() -> CommandResponse {
    CommandResponse::ok()
}

fn failed(error: &str) -> CommandResponse {
    CommandResponse::error("config apply failed", error)
}

fn nginx_conf(contents: &'static str) -> File {
    File::new("/etc/nginx/nginx.conf", contents)
}

fn http_upstream(name: &str) -> NginxPlusAction {
    NginxPlusAction::UpdateHttpUpstreamServers {
        upstream: name.to_string(),
        servers: vec![UpstreamServer {
            address: "10.0.1.1:8080".to_string(),
        }],
    }
}

// === impl Harness ===

impl Harness {
    async fn connect(&self, pod: &str) {
        self.server
            .create_connection(request(proto::CreateConnectionRequest {
                resource: Some(resource(pod, None)),
                ..Default::default()
            }))
            .await
            .expect("connection must be created");
    }

    async fn register(&self, instance_id: &str) {
        self.server
            .update_data_plane_status(request(proto::UpdateDataPlaneStatusRequest {
                resource: Some(resource("ngx-1", Some(instance_id))),
                ..Default::default()
            }))
            .await
            .expect("status must be updated");
    }

    /// Connects and registers the agent in pod `ngx-1`.
    async fn ready(&self) {
        self.connect("ngx-1").await;
        self.register("nginx-1").await;
    }

    fn subscribe(&self) -> Agent {
        let (tx, rx) = mpsc::channel(1);
        let rx = self.server.subscribe_stream(peer(), ReceiverStream::new(rx));
        Agent { tx, rx }
    }

    fn publisher(&self) -> Publisher {
        Publisher::new(self.deployments.clone(), self.statuses.clone())
    }
}

// === impl Agent ===

impl Agent {
    async fn recv(&mut self) -> Request {
        match self.rx.next().await {
            Some(Ok(req)) => req.request.expect("request must be set"),
            res => panic!("expected a request, got {res:?}"),
        }
    }

    async fn recv_status(&mut self) -> tonic::Status {
        match self.rx.next().await {
            Some(Err(status)) => status,
            res => panic!("expected the stream to end with a status, got {res:?}"),
        }
    }

    async fn respond(&self, rsp: CommandResponse) {
        self.tx
            .send(Ok(DataPlaneResponse {
                command_response: Some(rsp),
                instance_id: "nginx-1".to_string(),
                ..Default::default()
            }))
            .await
            .expect("subscription must be reading");
    }
}

fn config_version(req: &Request) -> String {
    match req {
        Request::ConfigApplyRequest(apply) => apply
            .overview
            .as_ref()
            .and_then(|o| o.config_version.as_ref())
            .map(|v| v.version.clone())
            .expect("config version must be set"),
        req => panic!("expected a config apply request, got {req:?}"),
    }
}

#[tokio::test]
async fn create_connection_requires_resource() {
    let h = harness();
    let status = h
        .server
        .create_connection(request(proto::CreateConnectionRequest::default()))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
    assert!(h.connections.is_empty());
}

#[tokio::test]
async fn create_connection_requires_peer() {
    let h = harness();
    let status = h
        .server
        .create_connection(tonic::Request::new(proto::CreateConnectionRequest {
            resource: Some(resource("ngx-1", None)),
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::Unauthenticated);
    assert_eq!(status.message(), "invalid connection");
    assert!(h.connections.is_empty());
}

#[tokio::test]
async fn create_connection_replica_set() {
    let h = harness();
    let rsp = h
        .server
        .create_connection(request(proto::CreateConnectionRequest {
            resource: Some(resource("ngx-1", None)),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(rsp.response.unwrap().is_ok());

    let conn = h.connections.get_connection(PEER);
    assert_eq!(
        conn,
        Connection {
            pod_name: "ngx-1".to_string(),
            instance_id: String::new(),
            parent: parent(),
        }
    );
    assert!(!conn.is_ready());
}

#[tokio::test]
async fn create_connection_daemon_set() {
    let h = harness();
    h.connect("ngx-ds").await;
    assert_eq!(
        h.connections.get_connection(PEER).parent,
        ResourceId::new("ns", "ds-1")
    );
}

#[tokio::test]
async fn create_connection_with_instance() {
    let h = harness();
    h.server
        .create_connection(request(proto::CreateConnectionRequest {
            resource: Some(resource("ngx-1", Some("nginx-1"))),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert!(h.connections.get_connection(PEER).is_ready());
}

#[tokio::test]
async fn create_connection_owner_errors() {
    let h = harness();
    for pod in ["ngx-2", "unknown"] {
        let status = h
            .server
            .create_connection(request(proto::CreateConnectionRequest {
                resource: Some(resource(pod, None)),
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert!(
            status.message().starts_with("error getting pod owner"),
            "{}",
            status.message()
        );
    }
    assert!(h.connections.is_empty());
}

#[tokio::test]
async fn update_data_plane_status() {
    let h = harness();
    h.connect("ngx-1").await;

    h.register("abc").await;
    let conn = h.connections.get_connection(PEER);
    assert_eq!(conn.instance_id, "abc");
    assert!(conn.is_ready());

    // Repeated updates are harmless.
    h.register("abc").await;
    assert_eq!(h.connections.get_connection(PEER), conn);
}

#[tokio::test]
async fn update_data_plane_status_requires_nginx_instance() {
    let h = harness();
    h.connect("ngx-1").await;

    let status = h
        .server
        .update_data_plane_status(request(proto::UpdateDataPlaneStatusRequest {
            resource: Some(resource("ngx-1", None)),
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
    assert_eq!(status.message(), "request does not contain nginx instanceID");
    assert!(!h.connections.get_connection(PEER).is_ready());

    let status = h
        .server
        .update_data_plane_status(request(proto::UpdateDataPlaneStatusRequest::default()))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
}

#[tokio::test]
async fn update_data_plane_status_untracked() {
    let h = harness();
    h.register("abc").await;
    assert!(h.connections.is_empty());
}

#[tokio::test]
async fn update_data_plane_health() {
    let h = harness();
    let rsp = h
        .server
        .update_data_plane_health(request(proto::UpdateDataPlaneHealthRequest::default()))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(rsp, proto::UpdateDataPlaneHealthResponse {});
}

#[tokio::test(start_paused = true)]
async fn subscribe_times_out_without_deployment() {
    let h = harness();
    h.ready().await;

    let mut agent = h.subscribe();
    let status = agent.recv_status().await;
    assert_eq!(status.code(), tonic::Code::DeadlineExceeded);
    assert_eq!(
        status.message(),
        "timed out waiting for nginx deployment to be added to store"
    );
    assert!(h.connections.is_empty());
}

#[tokio::test(start_paused = true)]
async fn subscribe_times_out_without_registration() {
    let h = harness();
    h.connect("ngx-1").await;
    h.deployments.get_or_store(&parent());

    let mut agent = h.subscribe();
    let status = agent.recv_status().await;
    assert_eq!(status.code(), tonic::Code::DeadlineExceeded);
    assert_eq!(
        status.message(),
        "timed out waiting for agent to register nginx"
    );
}

#[tokio::test(start_paused = true)]
async fn subscribe_waits_for_registration() {
    let h = harness();
    h.connect("ngx-1").await;
    h.deployments
        .get_or_store(&parent())
        .set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    time::sleep(time::Duration::from_secs(10)).await;
    h.register("nginx-1").await;

    assert!(matches!(agent.recv().await, Request::ConfigApplyRequest(_)));
}

#[tokio::test(start_paused = true)]
async fn initial_config_applied() {
    let mut h = harness();
    h.ready().await;
    let deployment = h.deployments.get_or_store(&parent());
    deployment.set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    let req = agent.recv().await;
    assert_eq!(config_version(&req), deployment.file_overviews().1);
    match &req {
        Request::ConfigApplyRequest(apply) => {
            let overview = apply.overview.as_ref().unwrap();
            assert_eq!(overview.files.len(), 1);
            assert_eq!(
                overview.config_version.as_ref().unwrap().instance_id,
                "nginx-1"
            );
        }
        req => panic!("unexpected request {req:?}"),
    }
    agent.respond(ok()).await;

    assert_eq!(
        h.status_rx.recv().await,
        Some(QueueObject {
            deployment: parent(),
            error: None,
            update_type: UpdateType::All,
        })
    );
    time::sleep(time::Duration::from_secs(1)).await;
    assert!(h.status_rx.try_recv().is_err(), "only one status is enqueued");
    assert_eq!(deployment.broadcaster().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn initial_config_apply_error_is_reported() {
    let mut h = harness();
    h.ready().await;
    let deployment = h.deployments.get_or_store(&parent());
    deployment.set_files(vec![nginx_conf("events {}")]);
    deployment.set_pod_error_status("ngx-0", Some(StatusError::new("ngx-0 failed")));

    let mut agent = h.subscribe();
    agent.recv().await;
    agent.respond(failed("bad directive")).await;

    let status = h.status_rx.recv().await.unwrap();
    assert_eq!(
        status.error.unwrap().messages(),
        [
            "ngx-0 failed",
            "msg: config apply failed; error: bad directive"
        ]
    );

    // Apply errors do not end the subscription.
    let publisher = h.publisher();
    let publish = tokio::spawn(async move {
        publisher
            .update_files(&parent(), vec![nginx_conf("events { }")])
            .await
    });
    assert!(matches!(agent.recv().await, Request::ConfigApplyRequest(_)));
    agent.respond(ok()).await;
    assert!(publish.await.unwrap());

    let status = h.status_rx.recv().await.unwrap();
    assert_eq!(status.error.unwrap().messages(), ["ngx-0 failed"]);
}

#[tokio::test(start_paused = true)]
async fn initial_nginx_plus_actions() {
    let mut h = harness();
    h.ready().await;
    let deployment = h.deployments.get_or_store(&parent());
    deployment.set_files(vec![nginx_conf("events {}")]);
    deployment.set_nginx_plus_actions(vec![http_upstream("web"), http_upstream("api")]);

    let mut agent = h.subscribe();
    assert!(matches!(agent.recv().await, Request::ConfigApplyRequest(_)));
    agent.respond(ok()).await;

    for upstream in ["web", "api"] {
        match agent.recv().await {
            Request::ActionRequest(req) => {
                assert_eq!(req.instance_id, "nginx-1");
                let Some(proto::api_action_request::Action::NginxPlusAction(action)) = req.action
                else {
                    panic!("expected an NGINX Plus action");
                };
                let Some(proto::nginx_plus_action::Action::UpdateHttpUpstreamServers(update)) =
                    action.action
                else {
                    panic!("expected an HTTP upstream update");
                };
                assert_eq!(update.http_upstream_name, upstream);
            }
            req => panic!("unexpected request {req:?}"),
        }
        agent.respond(ok()).await;
    }

    assert_eq!(h.status_rx.recv().await.unwrap().error, None);
}

#[tokio::test(start_paused = true)]
async fn initial_nginx_plus_action_retries_exhausted() {
    let mut h = harness();
    h.ready().await;
    let deployment = h.deployments.get_or_store(&parent());
    deployment.set_files(vec![nginx_conf("events {}")]);
    deployment.set_nginx_plus_actions(vec![http_upstream("web")]);

    let mut agent = h.subscribe();
    assert!(matches!(agent.recv().await, Request::ConfigApplyRequest(_)));
    agent.respond(ok()).await;

    // Every attempt fails, until the action's budget is spent.
    let mut attempts = 0;
    let status = loop {
        tokio::select! {
            status = h.status_rx.recv() => break status.unwrap(),
            req = agent.recv() => {
                assert!(matches!(req, Request::ActionRequest(_)));
                attempts += 1;
                agent.respond(failed("upstream not found")).await;
            }
        }
    };
    assert!(attempts > 1, "the action must be retried");
    let error = status.error.expect("the action's errors must be reported");
    assert_eq!(error.messages().len(), attempts);
    assert_eq!(
        error.messages()[0],
        "msg: config apply failed; error: upstream not found"
    );
}

#[tokio::test(start_paused = true)]
async fn broadcast_waits_for_agent_response() {
    let mut h = harness();
    h.ready().await;
    h.deployments
        .get_or_store(&parent())
        .set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    agent.recv().await;
    agent.respond(ok()).await;
    h.status_rx.recv().await.unwrap();

    let publisher = h.publisher();
    let publish = tokio::spawn(async move {
        publisher
            .update_files(&parent(), vec![nginx_conf("events { }")])
            .await
    });
    let req = agent.recv().await;
    assert!(matches!(req, Request::ConfigApplyRequest(_)));

    time::sleep(time::Duration::from_secs(1)).await;
    assert!(!publish.is_finished(), "publisher must wait for the agent");

    agent.respond(failed("bad directive")).await;
    assert!(publish.await.unwrap());
    let status = h.status_rx.recv().await.unwrap();
    assert_eq!(
        status.error.unwrap().to_string(),
        "msg: config apply failed; error: bad directive"
    );
}

#[tokio::test(start_paused = true)]
async fn rollback_notifications_are_ignored() {
    let mut h = harness();
    h.ready().await;
    let deployment = h.deployments.get_or_store(&parent());
    deployment.set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    agent.recv().await;
    agent.respond(ok()).await;
    h.status_rx.recv().await.unwrap();

    let publisher = h.publisher();
    let publish = tokio::spawn(async move {
        publisher
            .update_files(&parent(), vec![nginx_conf("events { }")])
            .await
    });
    agent.recv().await;

    agent
        .respond(CommandResponse::error("Rollback successful", ""))
        .await;
    agent
        .respond(CommandResponse::error("ROLLBACK FAILED", "reload failed"))
        .await;
    time::sleep(time::Duration::from_secs(1)).await;
    assert!(!publish.is_finished());
    assert_eq!(deployment.configuration_status(), None);

    agent.respond(ok()).await;
    assert!(publish.await.unwrap());
    assert_eq!(h.status_rx.recv().await.unwrap().error, None);
}

#[tokio::test(start_paused = true)]
async fn broadcast_nginx_plus_action() {
    let mut h = harness();
    h.ready().await;
    h.deployments
        .get_or_store(&parent())
        .set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    agent.recv().await;
    agent.respond(ok()).await;
    h.status_rx.recv().await.unwrap();

    let publisher = h.publisher();
    let publish = tokio::spawn(async move {
        publisher
            .update_nginx_plus_actions(&parent(), vec![http_upstream("web")])
            .await
    });
    assert!(matches!(agent.recv().await, Request::ActionRequest(_)));
    agent.respond(ok()).await;
    publish.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reset_ends_subscription() {
    let mut h = harness();
    h.ready().await;
    h.deployments
        .get_or_store(&parent())
        .set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    agent.recv().await;
    agent.respond(ok()).await;
    h.status_rx.recv().await.unwrap();

    h.reset.send(()).unwrap();
    let status = agent.recv_status().await;
    assert_eq!(status.code(), tonic::Code::Unavailable);
    assert_eq!(status.message(), "TLS files updated");
    assert!(h.connections.is_empty());
}

#[tokio::test(start_paused = true)]
async fn deployment_removal_ends_subscription() {
    let mut h = harness();
    h.ready().await;
    h.deployments
        .get_or_store(&parent())
        .set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    agent.recv().await;
    agent.respond(ok()).await;
    h.status_rx.recv().await.unwrap();

    h.deployments.remove(&parent());
    let status = agent.recv_status().await;
    assert_eq!(status.code(), tonic::Code::Unavailable);
}

#[tokio::test(start_paused = true)]
async fn deployment_removed_during_initial_config() {
    let mut h = harness();
    h.ready().await;
    h.deployments
        .get_or_store(&parent())
        .set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    assert!(matches!(agent.recv().await, Request::ConfigApplyRequest(_)));
    h.deployments.remove(&parent());
    agent.respond(ok()).await;
    assert_eq!(h.status_rx.recv().await.unwrap().error, None);

    let status = agent.recv_status().await;
    assert_eq!(status.code(), tonic::Code::Unavailable);
    assert_eq!(status.message(), "nginx deployment removed");
    assert!(h.connections.is_empty());

    // A re-created deployment has no stale subscribers.
    let deployment = h.deployments.get_or_store(&parent());
    assert!(deployment.broadcaster().is_empty());
}

#[tokio::test(start_paused = true)]
async fn agent_disconnect_ends_subscription() {
    let mut h = harness();
    h.ready().await;
    let deployment = h.deployments.get_or_store(&parent());
    deployment.set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    agent.recv().await;
    agent.respond(ok()).await;
    h.status_rx.recv().await.unwrap();

    let Agent { tx, mut rx } = agent;
    drop(tx);
    match rx.next().await {
        Some(Err(status)) => assert_eq!(status.code(), tonic::Code::Aborted),
        res => panic!("unexpected result {res:?}"),
    }
    assert!(h.connections.is_empty());
    assert!(deployment.broadcaster().is_empty());
}

#[tokio::test(start_paused = true)]
async fn agent_stream_closed_during_initial_config() {
    let mut h = harness();
    h.ready().await;
    let deployment = h.deployments.get_or_store(&parent());
    deployment.set_files(vec![nginx_conf("events {}")]);

    let mut agent = h.subscribe();
    agent.recv().await;
    let Agent { tx, mut rx } = agent;
    drop(tx);

    match rx.next().await {
        Some(Err(status)) => assert_eq!(status.code(), tonic::Code::Aborted),
        res => panic!("unexpected result {res:?}"),
    }
    let status = h.status_rx.recv().await.unwrap();
    assert_eq!(
        status.error.unwrap().to_string(),
        "agent closed the stream"
    );
    assert_eq!(deployment.configuration_status(), None);
    assert!(h.connections.is_empty());
}

#[tokio::test(start_paused = true)]
async fn server_shutdown_cancels_subscriptions() {
    let h = harness();
    h.ready().await;
    let shutdown = h.server.shutdown.clone();

    let mut agent = h.subscribe();
    shutdown.cancel();
    let status = agent.recv_status().await;
    assert_eq!(status.code(), tonic::Code::Cancelled);
    assert_eq!(status.message(), "server shutting down");
}

