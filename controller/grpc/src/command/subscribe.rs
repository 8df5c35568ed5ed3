//! The per-agent subscription protocol.
//!
//! A subscription moves through three phases before it terminates:
//!
//! 1. It waits for the agent to report its NGINX instance and for the agent's
//!    deployment to be known.
//! 2. Holding the deployment's file lock, it sends the deployment's current
//!    configuration (and any pending NGINX Plus actions) and waits for the
//!    agent to respond. The outcome is reported to the status queue.
//! 3. It relays the deployment's broadcasts to the agent and acknowledges
//!    each one to the publisher once the agent has responded.
//!
//! Failures are classified as either connection errors, which end the
//! subscription, or apply errors, which are reported as the pod's status.

use crate::{
    convert,
    messenger::{Messenger, MessengerError, SendError},
    metrics::ResponseObserver,
    peer::PeerInfo,
};
use nginx_agent_api::v1::{CommandResponse, DataPlaneResponse};
use nginx_gateway_controller_core::{
    BroadcastMessage, Connection, Deployment, NginxPlusAction, QueueObject, SharedConnections,
    SharedDeployments, StatusError, StatusQueue, SubscriberChannels, UpdateType,
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    time,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Span};

const READINESS_POLL_INTERVAL: time::Duration = time::Duration::from_secs(1);
const ACTION_RETRY_INTERVAL: time::Duration = time::Duration::from_millis(500);
const ACTION_TIMEOUT: time::Duration = time::Duration::from_secs(5);

#[derive(Debug)]
pub(super) struct Subscription {
    pub(super) peer: PeerInfo,
    pub(super) connections: SharedConnections,
    pub(super) deployments: SharedDeployments,
    pub(super) statuses: StatusQueue,
    pub(super) reset: watch::Receiver<()>,
    pub(super) connection_timeout: time::Duration,
    pub(super) shutdown: CancellationToken,

    /// Canceled when the agent goes away or the server shuts down.
    pub(super) ctx: CancellationToken,
    pub(super) observer: ResponseObserver,
}

#[derive(Debug, thiserror::Error)]
pub(super) enum ReadinessError {
    #[error("timed out waiting for agent to register nginx")]
    AgentNotRegistered,

    #[error("timed out waiting for nginx deployment to be added to store")]
    DeploymentNotFound,
}

// === impl Subscription ===

impl Subscription {
    pub(super) async fn run(self, mut messenger: Messenger) {
        let _cancel = self.ctx.clone().drop_guard();

        let status = self.subscribe(&mut messenger).await;
        self.connections.remove_connection(&self.peer.key());

        if status.code() == tonic::Code::Cancelled {
            debug!(message = status.message(), "Subscription canceled");
        } else {
            info!(code = ?status.code(), message = status.message(), "Subscription ended");
        }
        messenger.finish(status.clone()).await;
        self.observer.end(status.code());
    }

    /// Runs the protocol until it terminates, returning the status that ends
    /// the stream.
    async fn subscribe(&self, messenger: &mut Messenger) -> tonic::Status {
        let (conn, deployment) = match self.wait_for_connection().await {
            Ok(ready) => ready,
            Err(status) => {
                error!(message = status.message(), "Agent connection is not ready");
                return status;
            }
        };
        Span::current().record("pod", conn.pod_name.as_str());

        let status = self.sync(&conn, &deployment, messenger).await;
        deployment.remove_pod_status(&conn.pod_name);
        status
    }

    /// Waits for the agent to report its NGINX instance and for its deployment
    /// to be added to the store.
    async fn wait_for_connection(&self) -> Result<(Connection, Arc<Deployment>), tonic::Status> {
        let key = self.peer.key();
        let deadline = time::sleep(self.connection_timeout);
        tokio::pin!(deadline);
        let mut interval = time::interval(READINESS_POLL_INTERVAL);

        let mut pending = ReadinessError::AgentNotRegistered;
        loop {
            tokio::select! {
                _ = self.ctx.cancelled() => return Err(self.cancelled()),
                _ = &mut deadline => return Err(tonic::Status::deadline_exceeded(pending.to_string())),
                _ = interval.tick() => {}
            }

            let conn = self.connections.get_connection(&key);
            if !conn.is_ready() {
                pending = ReadinessError::AgentNotRegistered;
                continue;
            }
            match self.deployments.get(&conn.parent) {
                Some(deployment) => return Ok((conn, deployment)),
                None => pending = ReadinessError::DeploymentNotFound,
            }
        }
    }

    async fn sync(
        &self,
        conn: &Connection,
        deployment: &Deployment,
        messenger: &mut Messenger,
    ) -> tonic::Status {
        let mut channels = {
            let _lock = tokio::select! {
                _ = self.ctx.cancelled() => return self.cancelled(),
                lock = deployment.lock_files() => lock,
            };
            if let Err(status) = self.apply_initial_config(conn, deployment, messenger).await {
                return status;
            }

            // Subscribe before releasing the lock so that no publish can be
            // missed.
            deployment.broadcaster().subscribe()
        };

        let status = self
            .relay_broadcasts(conn, deployment, messenger, &mut channels)
            .await;
        deployment.broadcaster().cancel_subscription(channels.id);
        status
    }

    /// Sends the deployment's current configuration and NGINX Plus actions to
    /// the agent. Must be called with the deployment's file lock held.
    ///
    /// Apply errors are reported to the status queue. Connection errors are
    /// recorded as the pod's status and returned.
    async fn apply_initial_config(
        &self,
        conn: &Connection,
        deployment: &Deployment,
        messenger: &mut Messenger,
    ) -> Result<(), tonic::Status> {
        let (files, config_version) = deployment.file_overviews();
        info!(%config_version, files = files.len(), "Sending initial configuration");
        let req = convert::config_apply_request(&files, config_version, &conn.instance_id);
        if let Err(error) = messenger.send(&self.ctx, req).await {
            return Err(self.send_failed(conn, deployment, error));
        }
        self.observer.msg_sent();

        let mut errors = Vec::new();
        if let Some(error) = self.recv_initial_response(conn, deployment, messenger).await? {
            errors.push(error);
        }

        for action in deployment.nginx_plus_actions() {
            if let Some(error) = self
                .apply_nginx_plus_action(&action, conn, deployment, messenger)
                .await?
            {
                errors.push(error);
            }
        }

        let error = StatusError::join(errors);
        match &error {
            Some(error) => warn!(%error, "Agent failed to apply initial configuration"),
            None => info!("Agent applied initial configuration"),
        }
        self.set_status_and_enqueue(conn, deployment, error);
        Ok(())
    }

    /// Sends an NGINX Plus action to the agent, retrying while the agent
    /// reports errors until the action's time budget is spent.
    ///
    /// Returns the accumulated apply errors if the action never succeeded.
    async fn apply_nginx_plus_action(
        &self,
        action: &NginxPlusAction,
        conn: &Connection,
        deployment: &Deployment,
        messenger: &mut Messenger,
    ) -> Result<Option<StatusError>, tonic::Status> {
        let deadline = time::Instant::now() + ACTION_TIMEOUT;
        let mut errors = Vec::new();
        loop {
            let req = convert::api_action_request(action, &conn.instance_id);
            if let Err(error) = messenger.send(&self.ctx, req).await {
                return Err(self.send_failed(conn, deployment, error));
            }
            self.observer.msg_sent();

            let applied = time::timeout_at(
                deadline,
                self.recv_initial_response(conn, deployment, messenger),
            )
            .await;
            match applied {
                Ok(res) => match res? {
                    None => return Ok(None),
                    Some(error) => {
                        debug!(%error, upstream = action.upstream(), "Agent failed to apply NGINX Plus action");
                        errors.push(error);
                    }
                },
                // The agent's response is still outstanding, so the stream can
                // no longer be used.
                Err(_) => {
                    let status = tonic::Status::deadline_exceeded(format!(
                        "timed out waiting for agent to apply NGINX Plus action for upstream {}",
                        action.upstream()
                    ));
                    error!(message = status.message(), "Agent did not respond");
                    self.set_status_and_enqueue(conn, deployment, Some(StatusError::new(status.message())));
                    return Err(status);
                }
            }

            let next = time::Instant::now() + ACTION_RETRY_INTERVAL;
            if next >= deadline {
                return Ok(StatusError::join(errors));
            }
            tokio::select! {
                _ = self.ctx.cancelled() => return Err(self.cancelled()),
                _ = time::sleep_until(next) => {}
            }
        }
    }

    /// Waits for the agent's response to a request sent while applying the
    /// initial configuration.
    ///
    /// Returns the agent's apply error, if any. A connection error is returned
    /// as the `Err` status.
    pub(super) async fn wait_for_initial_config_apply(
        &self,
        messenger: &mut Messenger,
    ) -> Result<Option<StatusError>, tonic::Status> {
        tokio::select! {
            biased;
            _ = self.ctx.cancelled() => Err(self.cancelled()),
            res = messenger.recv() => match res {
                Ok(msg) => {
                    self.observer.msg_received();
                    Ok(apply_error(msg))
                }
                Err(error) => Err(messenger_status(error)),
            },
        }
    }

    /// Waits for the agent's response during the initial transaction. A
    /// connection error is recorded as the pod's status before it is returned.
    async fn recv_initial_response(
        &self,
        conn: &Connection,
        deployment: &Deployment,
        messenger: &mut Messenger,
    ) -> Result<Option<StatusError>, tonic::Status> {
        self.wait_for_initial_config_apply(messenger)
            .await
            .map_err(|status| {
                if status.code() != tonic::Code::Cancelled {
                    error!(message = status.message(), "Agent stream failed");
                    self.set_status_and_enqueue(conn, deployment, Some(StatusError::new(status.message())));
                }
                status
            })
    }

    /// Relays the deployment's broadcasts to the agent until the subscription
    /// ends.
    async fn relay_broadcasts(
        &self,
        conn: &Connection,
        deployment: &Deployment,
        messenger: &mut Messenger,
        channels: &mut SubscriberChannels,
    ) -> tonic::Status {
        let mut reset = self.reset.clone();
        let _ = reset.borrow_and_update();
        let mut reset_open = true;

        loop {
            tokio::select! {
                _ = self.ctx.cancelled() => {
                    // Don't hold up shutdown on a publisher that isn't waiting.
                    let _ = channels.response.try_send(());
                    return self.cancelled();
                }

                res = reset.changed(), if reset_open => match res {
                    Ok(()) => {
                        info!("Resetting subscription");
                        return tonic::Status::unavailable("TLS files updated");
                    }
                    Err(_) => reset_open = false,
                },

                msg = channels.listen.recv() => {
                    let Some(msg) = msg else {
                        info!(parent = %conn.parent, "Deployment removed");
                        return tonic::Status::unavailable("nginx deployment removed");
                    };
                    let req = match msg {
                        BroadcastMessage::ConfigApply { files, config_version } => {
                            info!(%config_version, files = files.len(), "Sending configuration");
                            convert::config_apply_request(&files, config_version, &conn.instance_id)
                        }
                        BroadcastMessage::ApiRequest(action) => {
                            info!(upstream = action.upstream(), "Sending NGINX Plus action");
                            convert::api_action_request(&action, &conn.instance_id)
                        }
                    };
                    if let Err(error) = messenger.send(&self.ctx, req).await {
                        error!(%error, "Failed to send request to agent");
                        deployment.set_pod_error_status(&conn.pod_name, Some(StatusError::new(&error)));
                        // The publisher is waiting on this subscriber's response.
                        self.ack(&channels.response).await;
                        return send_status(error, self.cancelled());
                    }
                    self.observer.msg_sent();
                }

                res = messenger.recv() => {
                    let msg = match res {
                        Ok(msg) => msg,
                        Err(error) => {
                            error!(%error, "Agent stream failed");
                            deployment.set_pod_error_status(&conn.pod_name, Some(StatusError::new(&error)));
                            let _ = channels.response.try_send(());
                            return messenger_status(error);
                        }
                    };
                    self.observer.msg_received();

                    let rsp = msg.command_response.unwrap_or_default();
                    if rsp.is_ok() {
                        debug!("Agent applied request");
                        deployment.set_pod_error_status(&conn.pod_name, None);
                    } else if is_rollback_notification(&rsp.message) {
                        // Rollbacks are reported out of band and don't answer a
                        // pending request.
                        debug!(message = %rsp.message, "Ignoring rollback notification");
                        continue;
                    } else {
                        let error = command_error(&rsp);
                        warn!(%error, "Agent failed to apply request");
                        deployment.set_pod_error_status(&conn.pod_name, Some(error));
                    }
                    self.ack(&channels.response).await;
                }
            }
        }
    }

    /// Releases a publisher waiting for this subscriber's response.
    async fn ack(&self, response: &mpsc::Sender<()>) {
        tokio::select! {
            _ = self.ctx.cancelled() => {}
            _ = response.send(()) => {}
        }
    }

    /// Records a failure to send the agent a request during the initial
    /// transaction and reports it to the status queue.
    fn send_failed(&self, conn: &Connection, deployment: &Deployment, error: SendError) -> tonic::Status {
        if let SendError::Cancelled = error {
            return self.cancelled();
        }
        error!(%error, "Failed to send request to agent");
        self.set_status_and_enqueue(conn, deployment, Some(StatusError::new(&error)));
        send_status(error, self.cancelled())
    }

    /// Records this pod's status and enqueues the deployment's aggregate
    /// status, which includes the other pods' errors.
    fn set_status_and_enqueue(
        &self,
        conn: &Connection,
        deployment: &Deployment,
        error: Option<StatusError>,
    ) {
        deployment.set_pod_error_status(&conn.pod_name, error);
        self.statuses.enqueue(QueueObject {
            deployment: conn.parent.clone(),
            error: deployment.configuration_status(),
            update_type: UpdateType::All,
        });
    }

    fn cancelled(&self) -> tonic::Status {
        if self.shutdown.is_cancelled() {
            return tonic::Status::cancelled("server shutting down");
        }
        tonic::Status::cancelled("agent disconnected")
    }
}

fn apply_error(msg: DataPlaneResponse) -> Option<StatusError> {
    let rsp = msg.command_response.unwrap_or_default();
    if rsp.is_ok() {
        return None;
    }
    Some(command_error(&rsp))
}

fn command_error(rsp: &CommandResponse) -> StatusError {
    StatusError::new(format!("msg: {}; error: {}", rsp.message, rsp.error))
}

fn is_rollback_notification(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("rollback successful") || message.contains("rollback failed")
}

fn messenger_status(error: MessengerError) -> tonic::Status {
    match error {
        MessengerError::Eof => tonic::Status::aborted(error.to_string()),
        MessengerError::Stream(_) => tonic::Status::internal(error.to_string()),
    }
}

fn send_status(error: SendError, cancelled: tonic::Status) -> tonic::Status {
    match error {
        SendError::Cancelled => cancelled,
        SendError::Closed => tonic::Status::internal(error.to_string()),
    }
}
