use crate::ResourceId;
use tokio::sync::mpsc;

/// One or more configuration errors reported for a deployment's pods.
///
/// Joining errors keeps each message; the joined error renders one message per
/// line.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join("\n"))]
pub struct StatusError {
    messages: Vec<String>,
}

/// Describes which parts of a deployment's status should be rewritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateType {
    /// Rewrite every status that depends on the deployment's configuration.
    All,
}

/// A unit of work for the status pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueObject {
    pub deployment: ResourceId,
    pub error: Option<StatusError>,
    pub update_type: UpdateType,
}

/// Hands status updates to the status pipeline without blocking.
#[derive(Clone, Debug)]
pub struct StatusQueue {
    tx: mpsc::UnboundedSender<QueueObject>,
}

// === impl StatusError ===

impl StatusError {
    pub fn new(message: impl ToString) -> Self {
        Self {
            messages: vec![message.to_string()],
        }
    }

    /// Joins errors into a single error, or returns `None` if there are none.
    pub fn join(errors: impl IntoIterator<Item = StatusError>) -> Option<Self> {
        let messages = errors
            .into_iter()
            .flat_map(|e| e.messages)
            .collect::<Vec<_>>();
        if messages.is_empty() {
            return None;
        }
        Some(Self { messages })
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

// === impl StatusQueue ===

impl StatusQueue {
    pub fn new(tx: mpsc::UnboundedSender<QueueObject>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<QueueObject>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn enqueue(&self, obj: QueueObject) {
        if let Err(error) = self.tx.send(obj) {
            tracing::error!(deployment = %error.0.deployment, "Status queue closed; dropping update");
        }
    }
}
