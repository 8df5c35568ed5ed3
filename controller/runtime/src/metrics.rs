use crate::core::{SharedConnections, SharedDeployments};
use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeMetric},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};

#[derive(Debug)]
struct Instrumented {
    connections: SharedConnections,
    deployments: SharedDeployments,
}

pub(crate) fn register(
    reg: &mut Registry,
    connections: SharedConnections,
    deployments: SharedDeployments,
) {
    reg.register_collector(Box::new(Instrumented {
        connections,
        deployments,
    }));
}

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let connections = ConstGauge::new(self.connections.len() as i64);
        let connections_encoder = encoder.encode_descriptor(
            "agent_connections",
            "The number of tracked agent connections",
            None,
            MetricType::Gauge,
        )?;
        connections.encode(connections_encoder)?;

        let ready = ConstGauge::new(self.connections.ready_len() as i64);
        let ready_encoder = encoder.encode_descriptor(
            "agent_connections_ready",
            "The number of agent connections that have reported an NGINX instance",
            None,
            MetricType::Gauge,
        )?;
        ready.encode(ready_encoder)?;

        let deployments = ConstGauge::new(self.deployments.len() as i64);
        let deployments_encoder = encoder.encode_descriptor(
            "deployments",
            "The number of NGINX deployments in the store",
            None,
            MetricType::Gauge,
        )?;
        deployments.encode(deployments_encoder)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Connection, ConnectionsTracker, DeploymentStore, ResourceId};
    use prometheus_client::encoding::text::encode;

    #[test]
    fn reports_store_sizes() {
        let connections = ConnectionsTracker::shared();
        let deployments = DeploymentStore::shared();
        let mut reg = Registry::default();
        register(
            reg.sub_registry_with_prefix("nginx"),
            connections.clone(),
            deployments.clone(),
        );

        let parent = ResourceId::new("ns", "ngx");
        connections.track(
            "10.0.0.1",
            Connection {
                pod_name: "ngx-1".to_string(),
                instance_id: String::new(),
                parent: parent.clone(),
            },
        );
        connections.track(
            "10.0.0.2",
            Connection {
                pod_name: "ngx-2".to_string(),
                instance_id: "nginx-2".to_string(),
                parent: parent.clone(),
            },
        );
        deployments.get_or_store(&parent);

        let mut out = String::new();
        encode(&mut out, &reg).unwrap();
        assert!(out.contains("nginx_agent_connections 2"), "{out}");
        assert!(out.contains("nginx_agent_connections_ready 1"), "{out}");
        assert!(out.contains("nginx_deployments 1"), "{out}");
    }
}
