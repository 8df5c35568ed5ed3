//! Shared state for the NGINX agent management plane.
//!
//! Agents dial the control plane and are tracked by their peer address in the
//! [`ConnectionsTracker`]. Each agent belongs to a logical fleet of NGINX pods
//! (a [`Deployment`], keyed by the owning Deployment or DaemonSet). A
//! deployment holds the files every pod in the fleet should be running and
//! fans configuration changes out to the subscribed agents with its
//! [`Broadcaster`]. Outcomes are reported to the status pipeline through the
//! [`StatusQueue`].
//!
//! ```text
//! [ agent ] -> [ Connection ] -> [ Deployment ] -> [ Broadcaster ] -> [ agent, agent, ... ]
//!                                      |
//!                                      v
//!                                [ StatusQueue ]
//! ```

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod broadcast;
mod connections;
pub mod deployment;
pub mod files;
mod nginx_plus;
mod owners;
mod publish;
mod resource_id;
pub mod status;

pub use self::{
    broadcast::{BroadcastMessage, Broadcaster, SubscriberChannels},
    connections::{Connection, ConnectionsTracker, SharedConnections},
    deployment::{Deployment, DeploymentStore, SharedDeployments},
    files::{File, FileMeta},
    nginx_plus::{NginxPlusAction, UpstreamServer},
    owners::{DiscoverOwners, OwnerRef, PodOwners},
    publish::{ConfigUpdate, Publisher},
    resource_id::ResourceId,
    status::{QueueObject, StatusError, StatusQueue, UpdateType},
};
