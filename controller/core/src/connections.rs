use crate::ResourceId;
use ahash::AHashMap as HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// An agent connection, keyed in the [`ConnectionsTracker`] by the agent's
/// peer address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Connection {
    /// The name of the NGINX pod the agent runs in.
    pub pod_name: String,

    /// The ID of the NGINX instance managed by the agent. Empty until the
    /// agent has discovered (and reported) its NGINX instance.
    pub instance_id: String,

    /// The Deployment or DaemonSet that owns the pod.
    pub parent: ResourceId,
}

pub type SharedConnections = Arc<ConnectionsTracker>;

/// Tracks agent connections by peer address.
///
/// A peer has an entry from the time it creates a connection until its
/// subscription ends. An agent that re-dials from the same address replaces
/// its prior entry.
#[derive(Debug, Default)]
pub struct ConnectionsTracker {
    connections: RwLock<HashMap<String, Connection>>,
}

// === impl Connection ===

impl Connection {
    /// Indicates whether the agent has reported its NGINX instance.
    pub fn is_ready(&self) -> bool {
        !self.instance_id.is_empty()
    }
}

// === impl ConnectionsTracker ===

impl ConnectionsTracker {
    pub fn shared() -> SharedConnections {
        Arc::new(Self::default())
    }

    pub fn track(&self, key: impl Into<String>, conn: Connection) {
        self.connections.write().insert(key.into(), conn);
    }

    /// Returns the connection for `key`, or the empty connection if the key is
    /// not tracked.
    pub fn get_connection(&self, key: &str) -> Connection {
        self.connections.read().get(key).cloned().unwrap_or_default()
    }

    /// Records the NGINX instance of a tracked connection. Untracked keys are
    /// ignored.
    pub fn set_instance_id(&self, key: &str, instance_id: impl Into<String>) {
        if let Some(conn) = self.connections.write().get_mut(key) {
            conn.instance_id = instance_id.into();
        }
    }

    pub fn remove_connection(&self, key: &str) {
        self.connections.write().remove(key);
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// The number of tracked connections whose agent has reported an NGINX
    /// instance.
    pub fn ready_len(&self) -> usize {
        self.connections
            .read()
            .values()
            .filter(|c| c.is_ready())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(pod: &str, instance_id: &str) -> Connection {
        Connection {
            pod_name: pod.to_string(),
            instance_id: instance_id.to_string(),
            parent: ResourceId::new("ns-0", "nginx"),
        }
    }

    #[test]
    fn ready_requires_instance_id() {
        assert!(!Connection::default().is_ready());
        assert!(!conn("pod-0", "").is_ready());
        assert!(conn("pod-0", "nginx-1").is_ready());
    }

    #[test]
    fn track_get_remove() {
        let tracker = ConnectionsTracker::default();
        assert_eq!(tracker.get_connection("10.0.0.1"), Connection::default());

        tracker.track("10.0.0.1", conn("pod-0", ""));
        assert_eq!(tracker.get_connection("10.0.0.1"), conn("pod-0", ""));
        assert_eq!(tracker.len(), 1);

        tracker.remove_connection("10.0.0.1");
        assert_eq!(tracker.get_connection("10.0.0.1"), Connection::default());
        assert!(tracker.is_empty());

        // Removing an untracked key is a no-op.
        tracker.remove_connection("10.0.0.1");
        assert!(tracker.is_empty());
    }

    #[test]
    fn redial_replaces_connection() {
        let tracker = ConnectionsTracker::default();
        tracker.track("10.0.0.1", conn("pod-0", "nginx-1"));
        tracker.track("10.0.0.1", conn("pod-1", ""));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get_connection("10.0.0.1"), conn("pod-1", ""));
    }

    #[test]
    fn set_instance_id() {
        let tracker = ConnectionsTracker::default();
        tracker.track("10.0.0.1", conn("pod-0", ""));
        assert_eq!(tracker.ready_len(), 0);

        tracker.set_instance_id("10.0.0.1", "nginx-1");
        assert!(tracker.get_connection("10.0.0.1").is_ready());
        assert_eq!(tracker.ready_len(), 1);

        // Repeating the update is harmless.
        tracker.set_instance_id("10.0.0.1", "nginx-1");
        assert_eq!(tracker.get_connection("10.0.0.1"), conn("pod-0", "nginx-1"));
    }

    #[test]
    fn set_instance_id_untracked() {
        let tracker = ConnectionsTracker::default();
        tracker.set_instance_id("10.0.0.1", "nginx-1");
        assert!(tracker.is_empty());
        assert_eq!(tracker.get_connection("10.0.0.1"), Connection::default());
    }
}
