//! Adapts an agent's bidirectional stream into channels that can be selected
//! over alongside other events.

use futures::prelude::*;
use nginx_agent_api::v1::{DataPlaneResponse, ManagementPlaneRequest};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{trace, Instrument};

pub(crate) type Outgoing = mpsc::Sender<Result<ManagementPlaneRequest, tonic::Status>>;

/// Reads an agent's responses on a background task and writes requests to
/// the agent.
#[derive(Debug)]
pub struct Messenger {
    outgoing: Outgoing,
    messages: mpsc::Receiver<DataPlaneResponse>,
    errors: mpsc::Receiver<MessengerError>,
}

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("failed to read from agent stream: {0}")]
    Stream(#[source] tonic::Status),

    #[error("agent closed the stream")]
    Eof,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("agent stream closed")]
    Closed,

    #[error("context canceled")]
    Cancelled,
}

// === impl Messenger ===

impl Messenger {
    /// Starts reading `inbound` until it ends, fails, or `ctx` is canceled.
    pub fn spawn<S>(inbound: S, outgoing: Outgoing, ctx: CancellationToken) -> Self
    where
        S: Stream<Item = Result<DataPlaneResponse, tonic::Status>> + Send + 'static,
    {
        let (msg_tx, messages) = mpsc::channel(1);
        let (err_tx, errors) = mpsc::channel(1);
        tokio::spawn(read(inbound, msg_tx, err_tx, ctx).in_current_span());
        Self {
            outgoing,
            messages,
            errors,
        }
    }

    /// Writes a request to the agent.
    pub async fn send(
        &self,
        ctx: &CancellationToken,
        req: ManagementPlaneRequest,
    ) -> Result<(), SendError> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(SendError::Cancelled),
            res = self.outgoing.send(Ok(req)) => res.map_err(|_| SendError::Closed),
        }
    }

    /// Receives the next event from the agent: either a response or the error
    /// that ended the stream.
    ///
    /// Responses read before a stream error are always returned before the
    /// error.
    pub async fn recv(&mut self) -> Result<DataPlaneResponse, MessengerError> {
        tokio::select! {
            biased;
            Some(msg) = self.messages.recv() => Ok(msg),
            Some(error) = self.errors.recv() => Err(error),
            else => Err(MessengerError::Eof),
        }
    }

    /// Ends the stream with the given status.
    pub(crate) async fn finish(&self, status: tonic::Status) {
        let _ = self.outgoing.send(Err(status)).await;
    }
}

async fn read<S>(
    inbound: S,
    messages: mpsc::Sender<DataPlaneResponse>,
    errors: mpsc::Sender<MessengerError>,
    ctx: CancellationToken,
) where
    S: Stream<Item = Result<DataPlaneResponse, tonic::Status>>,
{
    tokio::pin!(inbound);
    loop {
        let next = tokio::select! {
            _ = ctx.cancelled() => return,
            next = inbound.next() => next,
        };

        let error = match next {
            Some(Ok(msg)) => {
                trace!(?msg.instance_id, "Received response");
                tokio::select! {
                    _ = ctx.cancelled() => return,
                    res = messages.send(msg) => {
                        if res.is_err() {
                            return;
                        }
                    }
                }
                continue;
            }
            Some(Err(status)) => MessengerError::Stream(status),
            None => MessengerError::Eof,
        };

        tokio::select! {
            _ = ctx.cancelled() => {}
            _ = errors.send(error) => {}
        }
        return;
    }
}
