//! Builds the protobuf messages sent to agents.

use nginx_agent_api::v1 as proto;
use nginx_gateway_controller_core::{FileMeta, NginxPlusAction, UpstreamServer};
use std::time::SystemTime;

pub(crate) fn config_apply_request(
    files: &[FileMeta],
    config_version: String,
    instance_id: &str,
) -> proto::ManagementPlaneRequest {
    proto::ManagementPlaneRequest {
        message_meta: Some(message_meta()),
        request: Some(proto::management_plane_request::Request::ConfigApplyRequest(
            proto::ConfigApplyRequest {
                overview: Some(file_overview(files, config_version, instance_id)),
            },
        )),
    }
}

pub(crate) fn api_action_request(
    action: &NginxPlusAction,
    instance_id: &str,
) -> proto::ManagementPlaneRequest {
    proto::ManagementPlaneRequest {
        message_meta: Some(message_meta()),
        request: Some(proto::management_plane_request::Request::ActionRequest(
            proto::ApiActionRequest {
                instance_id: instance_id.to_string(),
                action: Some(proto::api_action_request::Action::NginxPlusAction(
                    nginx_plus_action(action),
                )),
            },
        )),
    }
}

pub(crate) fn file_overview(
    files: &[FileMeta],
    config_version: String,
    instance_id: &str,
) -> proto::FileOverview {
    proto::FileOverview {
        files: files
            .iter()
            .map(|meta| proto::File {
                file_meta: Some(file_meta(meta)),
            })
            .collect(),
        config_version: Some(proto::ConfigVersion {
            instance_id: instance_id.to_string(),
            version: config_version,
        }),
    }
}

pub(crate) fn file_meta(meta: &FileMeta) -> proto::FileMeta {
    proto::FileMeta {
        name: meta.name.clone(),
        hash: meta.hash.clone(),
        permissions: meta.permissions.clone(),
        size: meta.size,
    }
}

/// Message and correlation IDs are fresh for every message, including
/// retries.
fn message_meta() -> proto::MessageMeta {
    proto::MessageMeta {
        message_id: uuid::Uuid::new_v4().to_string(),
        correlation_id: uuid::Uuid::new_v4().to_string(),
        timestamp: Some(SystemTime::now().into()),
    }
}

fn nginx_plus_action(action: &NginxPlusAction) -> proto::NginxPlusAction {
    use proto::nginx_plus_action::Action;

    let action = match action {
        NginxPlusAction::UpdateHttpUpstreamServers { upstream, servers } => {
            Action::UpdateHttpUpstreamServers(proto::UpdateHttpUpstreamServers {
                http_upstream_name: upstream.clone(),
                servers: servers.iter().map(upstream_server).collect(),
            })
        }
        NginxPlusAction::UpdateStreamServers { upstream, servers } => {
            Action::UpdateStreamServers(proto::UpdateStreamServers {
                upstream_stream_name: upstream.clone(),
                servers: servers.iter().map(upstream_server).collect(),
            })
        }
    };
    proto::NginxPlusAction {
        action: Some(action),
    }
}

fn upstream_server(server: &UpstreamServer) -> prost_types::Struct {
    let server = prost_types::Value {
        kind: Some(prost_types::value::Kind::StringValue(server.address.clone())),
    };
    prost_types::Struct {
        fields: [("server".to_string(), server)].into_iter().collect(),
    }
}
