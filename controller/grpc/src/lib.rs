#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod command;
mod convert;
mod file;
mod messenger;
pub mod metrics;
mod owner;
mod peer;

#[cfg(test)]
mod fake;

pub use self::{
    command::{CommandServer, Timeouts},
    file::FileServer,
    messenger::{Messenger, MessengerError, SendError},
    metrics::GrpcServerMetricsFamily,
    owner::{resolve_parent, OwnerError},
    peer::{interceptor, PeerInfo},
};
