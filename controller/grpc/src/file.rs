use crate::{
    convert,
    metrics::{GrpcServerMetricsFamily, GrpcServerRpcMetrics},
    peer::PeerInfo,
};
use nginx_agent_api::v1::{
    self as proto,
    file_service_server::{FileService, FileServiceServer},
};
use nginx_gateway_controller_core::{Deployment, SharedConnections, SharedDeployments};
use std::sync::Arc;
use tracing::debug;

const SERVICE: &str = "nginx.agent.v1.FileService";

/// Serves the files of an agent's deployment.
///
/// Agents fetch file contents named by a `ConfigApplyRequest` from this
/// service. The data plane never pushes configuration, so updates from agents
/// are acknowledged and dropped.
#[derive(Clone, Debug)]
pub struct FileServer {
    connections: SharedConnections,
    deployments: SharedDeployments,
    metrics: FileMetrics,
}

#[derive(Clone, Debug)]
struct FileMetrics {
    get_overview: GrpcServerRpcMetrics,
    update_overview: GrpcServerRpcMetrics,
    get_file: GrpcServerRpcMetrics,
    update_file: GrpcServerRpcMetrics,
}

// === impl FileServer ===

impl FileServer {
    pub fn new(
        connections: SharedConnections,
        deployments: SharedDeployments,
        metrics: &GrpcServerMetricsFamily,
    ) -> Self {
        Self {
            connections,
            deployments,
            metrics: FileMetrics::new(metrics),
        }
    }

    pub fn svc(self) -> FileServiceServer<Self> {
        FileServiceServer::new(self)
    }

    fn deployment<T>(&self, req: &tonic::Request<T>) -> Result<Arc<Deployment>, tonic::Status> {
        let peer = PeerInfo::from_request(req)?;
        let conn = self.connections.get_connection(&peer.key());
        if conn.parent.name.is_empty() {
            return Err(tonic::Status::not_found("connection not found"));
        }
        self.deployments
            .get(&conn.parent)
            .ok_or_else(|| tonic::Status::not_found("deployment not found in store"))
    }

    fn file(
        &self,
        req: tonic::Request<proto::GetFileRequest>,
    ) -> Result<tonic::Response<proto::GetFileResponse>, tonic::Status> {
        let deployment = self.deployment(&req)?;
        let meta = req
            .into_inner()
            .file_meta
            .ok_or_else(|| tonic::Status::invalid_argument("request does not contain file metadata"))?;

        let contents = deployment
            .file(&meta.name, &meta.hash)
            .ok_or_else(|| tonic::Status::not_found("file not found"))?;
        debug!(name = %meta.name, size = contents.len(), "Serving file");
        Ok(tonic::Response::new(proto::GetFileResponse {
            contents: Some(proto::FileContents {
                contents: contents.to_vec(),
            }),
        }))
    }

    fn overview(
        &self,
        req: tonic::Request<proto::GetOverviewRequest>,
    ) -> Result<tonic::Response<proto::GetOverviewResponse>, tonic::Status> {
        let peer = PeerInfo::from_request(&req)?;
        let deployment = self.deployment(&req)?;
        let instance_id = self.connections.get_connection(&peer.key()).instance_id;
        let (files, config_version) = deployment.file_overviews();
        Ok(tonic::Response::new(proto::GetOverviewResponse {
            overview: Some(convert::file_overview(&files, config_version, &instance_id)),
        }))
    }
}

#[async_trait::async_trait]
impl FileService for FileServer {
    async fn get_overview(
        &self,
        req: tonic::Request<proto::GetOverviewRequest>,
    ) -> Result<tonic::Response<proto::GetOverviewResponse>, tonic::Status> {
        let metrics = self.metrics.get_overview.start();
        metrics.observe(self.overview(req))
    }

    async fn update_overview(
        &self,
        req: tonic::Request<proto::UpdateOverviewRequest>,
    ) -> Result<tonic::Response<proto::UpdateOverviewResponse>, tonic::Status> {
        let metrics = self.metrics.update_overview.start();
        let overview = req.into_inner().overview;
        metrics.observe(Ok(tonic::Response::new(proto::UpdateOverviewResponse {
            overview,
        })))
    }

    async fn get_file(
        &self,
        req: tonic::Request<proto::GetFileRequest>,
    ) -> Result<tonic::Response<proto::GetFileResponse>, tonic::Status> {
        let metrics = self.metrics.get_file.start();
        metrics.observe(self.file(req))
    }

    async fn update_file(
        &self,
        req: tonic::Request<proto::UpdateFileRequest>,
    ) -> Result<tonic::Response<proto::UpdateFileResponse>, tonic::Status> {
        let metrics = self.metrics.update_file.start();
        let file_meta = req.into_inner().file.and_then(|f| f.file_meta);
        metrics.observe(Ok(tonic::Response::new(proto::UpdateFileResponse {
            file_meta,
        })))
    }
}

// === impl FileMetrics ===

impl FileMetrics {
    fn new(family: &GrpcServerMetricsFamily) -> Self {
        Self {
            get_overview: family.unary_rpc(SERVICE, "GetOverview"),
            update_overview: family.unary_rpc(SERVICE, "UpdateOverview"),
            get_file: family.unary_rpc(SERVICE, "GetFile"),
            update_file: family.unary_rpc(SERVICE, "UpdateFile"),
        }
    }
}
