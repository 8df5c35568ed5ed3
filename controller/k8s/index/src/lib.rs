//! Kubernetes indexes for the NGINX agent control plane.
//!
//! - The [`OwnersIndex`] tracks the owner references of NGINX pods and their
//!   ReplicaSets so that connecting agents can be grouped by the Deployment or
//!   DaemonSet that runs them.
//! - The [`ConfigMapIndex`] turns labelled ConfigMaps into the files (and
//!   NGINX Plus upstream updates) of each deployment, emitting a
//!   [`ConfigUpdate`](nginx_gateway_controller_core::ConfigUpdate) whenever a
//!   deployment's configuration changes.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod config_map;
pub mod metrics;
pub mod owners;

pub use self::{
    config_map::ConfigMapIndex,
    metrics::{IndexMetrics, SizedIndex},
    owners::OwnersIndex,
};
