use crate::core::QueueObject;
use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeLabelValue},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Consumes the status queue, reporting the outcome of each deployment's
/// configuration.
#[derive(Clone, Debug)]
pub(crate) struct StatusReporter {
    updates: Family<StatusLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct StatusLabels {
    outcome: Outcome,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
enum Outcome {
    Configured,
    Failed,
}

// === impl StatusReporter ===

impl StatusReporter {
    pub(crate) fn register(reg: &mut Registry) -> Self {
        let updates = Family::default();
        reg.register(
            "updates",
            "Count of deployment status updates by outcome",
            updates.clone(),
        );
        Self { updates }
    }

    pub(crate) async fn run(self, mut queue: mpsc::UnboundedReceiver<QueueObject>) {
        while let Some(obj) = queue.recv().await {
            self.report(obj);
        }
        debug!("Status queue closed");
    }

    fn report(&self, obj: QueueObject) {
        let QueueObject {
            deployment,
            error,
            update_type,
        } = obj;
        let outcome = match error {
            None => {
                info!(%deployment, ?update_type, "Deployment configured");
                Outcome::Configured
            }
            Some(error) => {
                warn!(%deployment, ?update_type, %error, "Deployment configuration failed");
                Outcome::Failed
            }
        };
        self.updates.get_or_create(&StatusLabels { outcome }).inc();
    }
}
