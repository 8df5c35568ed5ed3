//! Protobuf types and gRPC service glue for the management-plane API spoken
//! by the NGINX agent.
//!
//! The `.proto` sources live under `proto/`; the Rust bindings are checked in
//! under `src/gen/` so that consumers do not need `protoc` at build time.

#![allow(clippy::derive_partial_eq_without_eq, clippy::large_enum_variant)]
#![forbid(unsafe_code)]

pub mod v1 {
    include!("gen/nginx.agent.v1.rs");

    /// Returns the ID of the first NGINX (or NGINX Plus) instance in the list,
    /// or an empty string if the agent has not discovered one yet.
    pub fn nginx_instance_id(instances: &[Instance]) -> &str {
        instances
            .iter()
            .filter_map(|i| i.instance_meta.as_ref())
            .find(|meta| {
                matches!(
                    meta.instance_type(),
                    InstanceType::Nginx | InstanceType::NginxPlus
                )
            })
            .map(|meta| meta.instance_id.as_str())
            .unwrap_or_default()
    }

    impl CommandResponse {
        pub fn ok() -> Self {
            Self {
                status: command_response::CommandStatus::Ok.into(),
                ..Default::default()
            }
        }

        pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
            Self {
                status: command_response::CommandStatus::Error.into(),
                message: message.into(),
                error: error.into(),
            }
        }

        pub fn is_ok(&self) -> bool {
            self.status() == command_response::CommandStatus::Ok
        }
    }

    impl Resource {
        /// The hostname reported by a containerized agent (i.e. its pod name).
        pub fn container_hostname(&self) -> Option<&str> {
            match &self.info {
                Some(resource::Info::ContainerInfo(info)) => Some(info.hostname.as_str()),
                _ => None,
            }
        }
    }

}
