/// An NGINX Plus API call an agent should make against its NGINX instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NginxPlusAction {
    UpdateHttpUpstreamServers {
        upstream: String,
        servers: Vec<UpstreamServer>,
    },
    UpdateStreamServers {
        upstream: String,
        servers: Vec<UpstreamServer>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamServer {
    /// An `address:port` pair.
    pub address: String,
}

impl NginxPlusAction {
    pub fn upstream(&self) -> &str {
        match self {
            Self::UpdateHttpUpstreamServers { upstream, .. }
            | Self::UpdateStreamServers { upstream, .. } => upstream,
        }
    }
}
