use std::net::IpAddr;

/// The network identity of the agent on the other end of an RPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerInfo {
    pub ip: IpAddr,
}

// === impl PeerInfo ===

impl PeerInfo {
    /// The key under which the agent's connection is tracked.
    pub fn key(&self) -> String {
        self.ip.to_string()
    }

    pub(crate) fn from_request<T>(req: &tonic::Request<T>) -> Result<Self, tonic::Status> {
        req.extensions()
            .get::<Self>()
            .copied()
            .ok_or_else(invalid_connection)
    }
}

/// Attaches the transport's remote address to each request.
///
/// Requests whose transport did not record a remote address are rejected.
pub fn interceptor(mut req: tonic::Request<()>) -> Result<tonic::Request<()>, tonic::Status> {
    let addr = req.remote_addr().ok_or_else(invalid_connection)?;
    req.extensions_mut().insert(PeerInfo { ip: addr.ip() });
    Ok(req)
}

fn invalid_connection() -> tonic::Status {
    tonic::Status::unauthenticated("invalid connection")
}
