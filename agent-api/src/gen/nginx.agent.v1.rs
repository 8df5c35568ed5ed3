// This file mirrors the output of `tonic-build` for `proto/nginx/agent/v1/*.proto`.
// Keep it in sync with the protobuf definitions when they change.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MessageMeta {
    #[prost(string, tag = "1")]
    pub message_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub correlation_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub timestamp: ::core::option::Option<::prost_types::Timestamp>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandResponse {
    #[prost(enumeration = "command_response::CommandStatus", tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub error: ::prost::alloc::string::String,
}
/// Nested message and enum types in `CommandResponse`.
pub mod command_response {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum CommandStatus {
        Unspecified = 0,
        Ok = 1,
        Error = 2,
        InProgress = 3,
        Failure = 4,
    }
    impl CommandStatus {
        /// String value of the enum field names used in the ProtoBuf definition.
        pub fn as_str_name(&self) -> &'static str {
            match self {
                Self::Unspecified => "COMMAND_STATUS_UNSPECIFIED",
                Self::Ok => "COMMAND_STATUS_OK",
                Self::Error => "COMMAND_STATUS_ERROR",
                Self::InProgress => "COMMAND_STATUS_IN_PROGRESS",
                Self::Failure => "COMMAND_STATUS_FAILURE",
            }
        }
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileMeta {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub hash: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub permissions: ::prost::alloc::string::String,
    #[prost(int64, tag = "4")]
    pub size: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct File {
    #[prost(message, optional, tag = "1")]
    pub file_meta: ::core::option::Option<FileMeta>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigVersion {
    #[prost(string, tag = "1")]
    pub instance_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub version: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileOverview {
    #[prost(message, repeated, tag = "1")]
    pub files: ::prost::alloc::vec::Vec<File>,
    #[prost(message, optional, tag = "2")]
    pub config_version: ::core::option::Option<ConfigVersion>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileContents {
    #[prost(bytes = "vec", tag = "1")]
    pub contents: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetOverviewRequest {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(message, optional, tag = "2")]
    pub config_version: ::core::option::Option<ConfigVersion>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetOverviewResponse {
    #[prost(message, optional, tag = "1")]
    pub overview: ::core::option::Option<FileOverview>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateOverviewRequest {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(message, optional, tag = "2")]
    pub overview: ::core::option::Option<FileOverview>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateOverviewResponse {
    #[prost(message, optional, tag = "1")]
    pub overview: ::core::option::Option<FileOverview>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetFileRequest {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(message, optional, tag = "2")]
    pub file_meta: ::core::option::Option<FileMeta>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetFileResponse {
    #[prost(message, optional, tag = "1")]
    pub contents: ::core::option::Option<FileContents>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateFileRequest {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(message, optional, tag = "2")]
    pub file: ::core::option::Option<File>,
    #[prost(message, optional, tag = "3")]
    pub contents: ::core::option::Option<FileContents>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateFileResponse {
    #[prost(message, optional, tag = "1")]
    pub file_meta: ::core::option::Option<FileMeta>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InstanceMeta {
    #[prost(string, tag = "1")]
    pub instance_id: ::prost::alloc::string::String,
    #[prost(enumeration = "InstanceType", tag = "2")]
    pub instance_type: i32,
    #[prost(string, tag = "3")]
    pub version: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Instance {
    #[prost(message, optional, tag = "1")]
    pub instance_meta: ::core::option::Option<InstanceMeta>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HostInfo {
    #[prost(string, tag = "1")]
    pub host_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub hostname: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContainerInfo {
    #[prost(string, tag = "1")]
    pub container_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub hostname: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Resource {
    #[prost(string, tag = "1")]
    pub resource_id: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub instances: ::prost::alloc::vec::Vec<Instance>,
    #[prost(oneof = "resource::Info", tags = "3, 4")]
    pub info: ::core::option::Option<resource::Info>,
}
/// Nested message and enum types in `Resource`.
pub mod resource {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Info {
        #[prost(message, tag = "3")]
        HostInfo(super::HostInfo),
        #[prost(message, tag = "4")]
        ContainerInfo(super::ContainerInfo),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateConnectionRequest {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(message, optional, tag = "2")]
    pub resource: ::core::option::Option<Resource>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateConnectionResponse {
    #[prost(message, optional, tag = "1")]
    pub response: ::core::option::Option<CommandResponse>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateDataPlaneStatusRequest {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(message, optional, tag = "2")]
    pub resource: ::core::option::Option<Resource>,
}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct UpdateDataPlaneStatusResponse {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InstanceHealth {
    #[prost(string, tag = "1")]
    pub instance_id: ::prost::alloc::string::String,
    #[prost(enumeration = "instance_health::InstanceHealthStatus", tag = "2")]
    pub instance_health_status: i32,
    #[prost(string, tag = "3")]
    pub description: ::prost::alloc::string::String,
}
/// Nested message and enum types in `InstanceHealth`.
pub mod instance_health {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum InstanceHealthStatus {
        Unspecified = 0,
        Healthy = 1,
        Unhealthy = 2,
        Degraded = 3,
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateDataPlaneHealthRequest {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(message, repeated, tag = "2")]
    pub instance_healths: ::prost::alloc::vec::Vec<InstanceHealth>,
}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct UpdateDataPlaneHealthResponse {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DataPlaneResponse {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(message, optional, tag = "2")]
    pub command_response: ::core::option::Option<CommandResponse>,
    #[prost(string, tag = "3")]
    pub instance_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigApplyRequest {
    #[prost(message, optional, tag = "1")]
    pub overview: ::core::option::Option<FileOverview>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateHttpUpstreamServers {
    #[prost(string, tag = "1")]
    pub http_upstream_name: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub servers: ::prost::alloc::vec::Vec<::prost_types::Struct>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateStreamServers {
    #[prost(string, tag = "1")]
    pub upstream_stream_name: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub servers: ::prost::alloc::vec::Vec<::prost_types::Struct>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NginxPlusAction {
    #[prost(oneof = "nginx_plus_action::Action", tags = "1, 2")]
    pub action: ::core::option::Option<nginx_plus_action::Action>,
}
/// Nested message and enum types in `NGINXPlusAction`.
pub mod nginx_plus_action {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Action {
        #[prost(message, tag = "1")]
        UpdateHttpUpstreamServers(super::UpdateHttpUpstreamServers),
        #[prost(message, tag = "2")]
        UpdateStreamServers(super::UpdateStreamServers),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApiActionRequest {
    #[prost(string, tag = "1")]
    pub instance_id: ::prost::alloc::string::String,
    #[prost(oneof = "api_action_request::Action", tags = "2")]
    pub action: ::core::option::Option<api_action_request::Action>,
}
/// Nested message and enum types in `APIActionRequest`.
pub mod api_action_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Action {
        #[prost(message, tag = "2")]
        NginxPlusAction(super::NginxPlusAction),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManagementPlaneRequest {
    #[prost(message, optional, tag = "1")]
    pub message_meta: ::core::option::Option<MessageMeta>,
    #[prost(oneof = "management_plane_request::Request", tags = "5, 7")]
    pub request: ::core::option::Option<management_plane_request::Request>,
}
/// Nested message and enum types in `ManagementPlaneRequest`.
pub mod management_plane_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Request {
        #[prost(message, tag = "5")]
        ConfigApplyRequest(super::ConfigApplyRequest),
        #[prost(message, tag = "7")]
        ActionRequest(super::ApiActionRequest),
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum InstanceType {
    Unspecified = 0,
    Agent = 1,
    Nginx = 2,
    NginxPlus = 3,
    Unit = 4,
}
impl InstanceType {
    /// String value of the enum field names used in the ProtoBuf definition.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "INSTANCE_TYPE_UNSPECIFIED",
            Self::Agent => "INSTANCE_TYPE_AGENT",
            Self::Nginx => "INSTANCE_TYPE_NGINX",
            Self::NginxPlus => "INSTANCE_TYPE_NGINX_PLUS",
            Self::Unit => "INSTANCE_TYPE_UNIT",
        }
    }
}
/// Generated server implementations.
pub mod command_service_server {
    #![allow(
        unused_variables,
        dead_code,
        missing_docs,
        clippy::wildcard_imports,
        clippy::let_unit_value
    )]
    use tonic::codegen::*;
    /// Generated trait containing gRPC methods that should be implemented for use with CommandServiceServer.
    #[async_trait]
    pub trait CommandService: std::marker::Send + std::marker::Sync + 'static {
        /// Registers an agent with the management plane.
        async fn create_connection(
            &self,
            request: tonic::Request<super::CreateConnectionRequest>,
        ) -> std::result::Result<tonic::Response<super::CreateConnectionResponse>, tonic::Status>;
        /// Reports the data plane's resources (e.g. discovered NGINX instances).
        async fn update_data_plane_status(
            &self,
            request: tonic::Request<super::UpdateDataPlaneStatusRequest>,
        ) -> std::result::Result<
            tonic::Response<super::UpdateDataPlaneStatusResponse>,
            tonic::Status,
        >;
        /// Reports the health of the data plane's instances.
        async fn update_data_plane_health(
            &self,
            request: tonic::Request<super::UpdateDataPlaneHealthRequest>,
        ) -> std::result::Result<
            tonic::Response<super::UpdateDataPlaneHealthResponse>,
            tonic::Status,
        >;
        /// Server streaming response type for the Subscribe method.
        type SubscribeStream: tonic::codegen::tokio_stream::Stream<
                Item = std::result::Result<super::ManagementPlaneRequest, tonic::Status>,
            > + std::marker::Send
            + 'static;
        /// Long-lived stream over which the management plane pushes requests and
        /// the agent replies with the outcome of each.
        async fn subscribe(
            &self,
            request: tonic::Request<tonic::Streaming<super::DataPlaneResponse>>,
        ) -> std::result::Result<tonic::Response<Self::SubscribeStream>, tonic::Status>;
    }
    /// Management-plane service driven by the NGINX agent running next to each
    /// data-plane NGINX instance.
    #[derive(Debug)]
    pub struct CommandServiceServer<T> {
        inner: Arc<T>,
    }
    impl<T> CommandServiceServer<T> {
        pub fn new(inner: T) -> Self {
            Self::from_arc(Arc::new(inner))
        }
        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
        pub fn with_interceptor<F>(inner: T, interceptor: F) -> InterceptedService<Self, F>
        where
            F: tonic::service::Interceptor,
        {
            InterceptedService::new(Self::new(inner), interceptor)
        }
    }
    impl<T, B> tonic::codegen::Service<http::Request<B>> for CommandServiceServer<T>
    where
        T: CommandService,
        B: Body + std::marker::Send + 'static,
        B::Error: Into<StdError> + std::marker::Send + 'static,
    {
        type Response = http::Response<tonic::body::Body>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(
            &mut self,
            _cx: &mut Context<'_>,
        ) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/nginx.agent.v1.CommandService/CreateConnection" => {
                    #[allow(non_camel_case_types)]
                    struct CreateConnectionSvc<T: CommandService>(pub Arc<T>);
                    impl<T: CommandService>
                        tonic::server::UnaryService<super::CreateConnectionRequest>
                        for CreateConnectionSvc<T>
                    {
                        type Response = super::CreateConnectionResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::CreateConnectionRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move {
                                <T as CommandService>::create_connection(&inner, request).await
                            };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let method = CreateConnectionSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/nginx.agent.v1.CommandService/UpdateDataPlaneStatus" => {
                    #[allow(non_camel_case_types)]
                    struct UpdateDataPlaneStatusSvc<T: CommandService>(pub Arc<T>);
                    impl<T: CommandService>
                        tonic::server::UnaryService<super::UpdateDataPlaneStatusRequest>
                        for UpdateDataPlaneStatusSvc<T>
                    {
                        type Response = super::UpdateDataPlaneStatusResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::UpdateDataPlaneStatusRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move {
                                <T as CommandService>::update_data_plane_status(&inner, request)
                                    .await
                            };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let method = UpdateDataPlaneStatusSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/nginx.agent.v1.CommandService/UpdateDataPlaneHealth" => {
                    #[allow(non_camel_case_types)]
                    struct UpdateDataPlaneHealthSvc<T: CommandService>(pub Arc<T>);
                    impl<T: CommandService>
                        tonic::server::UnaryService<super::UpdateDataPlaneHealthRequest>
                        for UpdateDataPlaneHealthSvc<T>
                    {
                        type Response = super::UpdateDataPlaneHealthResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::UpdateDataPlaneHealthRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move {
                                <T as CommandService>::update_data_plane_health(&inner, request)
                                    .await
                            };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let method = UpdateDataPlaneHealthSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/nginx.agent.v1.CommandService/Subscribe" => {
                    #[allow(non_camel_case_types)]
                    struct SubscribeSvc<T: CommandService>(pub Arc<T>);
                    impl<T: CommandService>
                        tonic::server::StreamingService<super::DataPlaneResponse>
                        for SubscribeSvc<T>
                    {
                        type Response = super::ManagementPlaneRequest;
                        type ResponseStream = T::SubscribeStream;
                        type Future =
                            BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<tonic::Streaming<super::DataPlaneResponse>>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move {
                                <T as CommandService>::subscribe(&inner, request).await
                            };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let method = SubscribeSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.streaming(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    let mut response = http::Response::new(tonic::body::Body::default());
                    let headers = response.headers_mut();
                    headers.insert(
                        tonic::Status::GRPC_STATUS,
                        (tonic::Code::Unimplemented as i32).into(),
                    );
                    headers.insert(
                        http::header::CONTENT_TYPE,
                        tonic::metadata::GRPC_CONTENT_TYPE,
                    );
                    Ok(response)
                }),
            }
        }
    }
    impl<T> Clone for CommandServiceServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    /// Generated gRPC service name
    pub const SERVICE_NAME: &str = "nginx.agent.v1.CommandService";
    impl<T> tonic::server::NamedService for CommandServiceServer<T> {
        const NAME: &'static str = SERVICE_NAME;
    }
}
/// Generated server implementations.
pub mod file_service_server {
    #![allow(
        unused_variables,
        dead_code,
        missing_docs,
        clippy::wildcard_imports,
        clippy::let_unit_value
    )]
    use tonic::codegen::*;
    /// Generated trait containing gRPC methods that should be implemented for use with FileServiceServer.
    #[async_trait]
    pub trait FileService: std::marker::Send + std::marker::Sync + 'static {
        async fn get_overview(
            &self,
            request: tonic::Request<super::GetOverviewRequest>,
        ) -> std::result::Result<tonic::Response<super::GetOverviewResponse>, tonic::Status>;
        async fn update_overview(
            &self,
            request: tonic::Request<super::UpdateOverviewRequest>,
        ) -> std::result::Result<tonic::Response<super::UpdateOverviewResponse>, tonic::Status>;
        async fn get_file(
            &self,
            request: tonic::Request<super::GetFileRequest>,
        ) -> std::result::Result<tonic::Response<super::GetFileResponse>, tonic::Status>;
        async fn update_file(
            &self,
            request: tonic::Request<super::UpdateFileRequest>,
        ) -> std::result::Result<tonic::Response<super::UpdateFileResponse>, tonic::Status>;
    }
    /// Serves configuration file contents to agents.
    #[derive(Debug)]
    pub struct FileServiceServer<T> {
        inner: Arc<T>,
    }
    impl<T> FileServiceServer<T> {
        pub fn new(inner: T) -> Self {
            Self::from_arc(Arc::new(inner))
        }
        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
        pub fn with_interceptor<F>(inner: T, interceptor: F) -> InterceptedService<Self, F>
        where
            F: tonic::service::Interceptor,
        {
            InterceptedService::new(Self::new(inner), interceptor)
        }
    }
    impl<T, B> tonic::codegen::Service<http::Request<B>> for FileServiceServer<T>
    where
        T: FileService,
        B: Body + std::marker::Send + 'static,
        B::Error: Into<StdError> + std::marker::Send + 'static,
    {
        type Response = http::Response<tonic::body::Body>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(
            &mut self,
            _cx: &mut Context<'_>,
        ) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/nginx.agent.v1.FileService/GetOverview" => {
                    #[allow(non_camel_case_types)]
                    struct GetOverviewSvc<T: FileService>(pub Arc<T>);
                    impl<T: FileService> tonic::server::UnaryService<super::GetOverviewRequest>
                        for GetOverviewSvc<T>
                    {
                        type Response = super::GetOverviewResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::GetOverviewRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move {
                                <T as FileService>::get_overview(&inner, request).await
                            };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let method = GetOverviewSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/nginx.agent.v1.FileService/UpdateOverview" => {
                    #[allow(non_camel_case_types)]
                    struct UpdateOverviewSvc<T: FileService>(pub Arc<T>);
                    impl<T: FileService> tonic::server::UnaryService<super::UpdateOverviewRequest>
                        for UpdateOverviewSvc<T>
                    {
                        type Response = super::UpdateOverviewResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::UpdateOverviewRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move {
                                <T as FileService>::update_overview(&inner, request).await
                            };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let method = UpdateOverviewSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/nginx.agent.v1.FileService/GetFile" => {
                    #[allow(non_camel_case_types)]
                    struct GetFileSvc<T: FileService>(pub Arc<T>);
                    impl<T: FileService> tonic::server::UnaryService<super::GetFileRequest> for GetFileSvc<T> {
                        type Response = super::GetFileResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::GetFileRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut =
                                async move { <T as FileService>::get_file(&inner, request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let method = GetFileSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/nginx.agent.v1.FileService/UpdateFile" => {
                    #[allow(non_camel_case_types)]
                    struct UpdateFileSvc<T: FileService>(pub Arc<T>);
                    impl<T: FileService> tonic::server::UnaryService<super::UpdateFileRequest>
                        for UpdateFileSvc<T>
                    {
                        type Response = super::UpdateFileResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::UpdateFileRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move {
                                <T as FileService>::update_file(&inner, request).await
                            };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let method = UpdateFileSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    let mut response = http::Response::new(tonic::body::Body::default());
                    let headers = response.headers_mut();
                    headers.insert(
                        tonic::Status::GRPC_STATUS,
                        (tonic::Code::Unimplemented as i32).into(),
                    );
                    headers.insert(
                        http::header::CONTENT_TYPE,
                        tonic::metadata::GRPC_CONTENT_TYPE,
                    );
                    Ok(response)
                }),
            }
        }
    }
    impl<T> Clone for FileServiceServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    /// Generated gRPC service name
    pub const SERVICE_NAME: &str = "nginx.agent.v1.FileService";
    impl<T> tonic::server::NamedService for FileServiceServer<T> {
        const NAME: &'static str = SERVICE_NAME;
    }
}
