use prometheus_client::{
    encoding::{EncodeLabel, EncodeLabelSet, EncodeLabelValue, LabelSetEncoder, LabelValueEncoder},
    metrics::{counter::Counter, family::Family, histogram::Histogram},
    registry::{Registry, Unit},
};
use std::fmt::Write;
use tokio::time;

/// Server-side gRPC metrics, labelled by service, method and RPC type.
#[derive(Clone, Debug)]
pub struct GrpcServerMetricsFamily {
    started: Family<Labels, Counter>,
    handling: Family<Labels, Histogram>,
    handled: Family<CodeLabels, Counter>,
    msg_received: Family<Labels, Counter>,
    msg_sent: Family<Labels, Counter>,
}

/// The metrics of a single RPC method.
#[derive(Clone, Debug)]
pub(crate) struct GrpcServerRpcMetrics {
    started: Counter,
    msg_received: Counter,
    msg_sent: Counter,
    handling: Histogram,
    handled: Family<CodeLabels, Counter>,
    labels: Labels,
}

/// Tracks one call. Dropping it without calling [`ResponseObserver::end`]
/// records the call as OK.
#[derive(Debug)]
pub(crate) struct ResponseObserver {
    msg_received: Counter,
    msg_sent: Counter,
    handled: Option<Handled>,
}

#[derive(Debug)]
struct Handled {
    start: time::Instant,
    durations: Histogram,
    codes: Family<CodeLabels, Counter>,
    labels: Labels,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct Labels {
    grpc_service: &'static str,
    grpc_method: &'static str,
    grpc_type: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct CodeLabels {
    rpc: Labels,
    grpc_code: GrpcCode,
}

/// Encodes a status code the way gRPC names it, e.g. `DEADLINE_EXCEEDED`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
struct GrpcCode(tonic::Code);

// === impl GrpcServerMetricsFamily ===

impl GrpcServerMetricsFamily {
    pub fn register(reg: &mut Registry) -> Self {
        let started = counters(reg, "started", "Total number of RPCs started on the server");
        let msg_received = counters(
            reg,
            "msg_received",
            "Total number of RPC stream messages received on the server",
        );
        let msg_sent = counters(
            reg,
            "msg_sent",
            "Total number of gRPC stream messages sent by the server",
        );
        let handled = counters(
            reg,
            "handled",
            "Total number of RPCs completed on the server, regardless of success or failure",
        );

        // Agent subscriptions live as long as the agent's NGINX pod, so the
        // upper buckets are measured in hours.
        let handling = Family::<Labels, Histogram>::new_with_constructor(|| {
            Histogram::new([0.01, 0.1, 1.0, 300.0, 3600.0, 86400.0])
        });
        reg.register_with_unit(
            "handling",
            "Histogram of response latency (seconds) of gRPC that had been application-level handled by the server",
            Unit::Seconds,
            handling.clone(),
        );

        Self {
            started,
            handling,
            handled,
            msg_received,
            msg_sent,
        }
    }

    pub(crate) fn unary_rpc(&self, svc: &'static str, method: &'static str) -> GrpcServerRpcMetrics {
        self.rpc(Labels {
            grpc_service: svc,
            grpc_method: method,
            grpc_type: "unary",
        })
    }

    pub(crate) fn bidi_stream_rpc(
        &self,
        svc: &'static str,
        method: &'static str,
    ) -> GrpcServerRpcMetrics {
        self.rpc(Labels {
            grpc_service: svc,
            grpc_method: method,
            grpc_type: "bidi_stream",
        })
    }

    fn rpc(&self, labels: Labels) -> GrpcServerRpcMetrics {
        GrpcServerRpcMetrics {
            started: self.started.get_or_create(&labels).clone(),
            msg_received: self.msg_received.get_or_create(&labels).clone(),
            msg_sent: self.msg_sent.get_or_create(&labels).clone(),
            handling: self.handling.get_or_create(&labels).clone(),
            handled: self.handled.clone(),
            labels,
        }
    }
}

fn counters<L>(reg: &mut Registry, name: &str, help: &str) -> Family<L, Counter>
where
    L: EncodeLabelSet + Clone + std::hash::Hash + Eq + std::fmt::Debug + Send + Sync + 'static,
{
    let family = Family::default();
    reg.register(name, help, family.clone());
    family
}

// === impl GrpcServerRpcMetrics ===

impl GrpcServerRpcMetrics {
    /// Observes a unary RPC, which carries exactly one request message.
    pub(crate) fn start(&self) -> ResponseObserver {
        let rsp = self.start_stream();
        rsp.msg_received();
        rsp
    }

    /// Observes a streaming RPC. Received messages are recorded as they
    /// arrive.
    pub(crate) fn start_stream(&self) -> ResponseObserver {
        self.started.inc();
        // Export the OK series before any call completes.
        let _ = self.handled.get_or_create(&CodeLabels {
            rpc: self.labels.clone(),
            grpc_code: GrpcCode(tonic::Code::Ok),
        });

        ResponseObserver {
            msg_received: self.msg_received.clone(),
            msg_sent: self.msg_sent.clone(),
            handled: Some(Handled {
                start: time::Instant::now(),
                durations: self.handling.clone(),
                codes: self.handled.clone(),
                labels: self.labels.clone(),
            }),
        }
    }
}

// === impl ResponseObserver ===

impl ResponseObserver {
    pub(crate) fn msg_received(&self) {
        self.msg_received.inc();
    }

    pub(crate) fn msg_sent(&self) {
        self.msg_sent.inc();
    }

    pub(crate) fn end(mut self, code: tonic::Code) {
        if let Some(handled) = self.handled.take() {
            handled.record(code);
        }
    }

    /// Records the outcome of a unary RPC.
    pub(crate) fn observe<T>(
        self,
        res: Result<tonic::Response<T>, tonic::Status>,
    ) -> Result<tonic::Response<T>, tonic::Status> {
        match &res {
            Ok(_) => {
                self.msg_sent();
                self.end(tonic::Code::Ok);
            }
            Err(status) => self.end(status.code()),
        }
        res
    }
}

impl Drop for ResponseObserver {
    fn drop(&mut self) {
        if let Some(handled) = self.handled.take() {
            handled.record(tonic::Code::Ok);
        }
    }
}

// === impl Handled ===

impl Handled {
    fn record(self, code: tonic::Code) {
        self.durations.observe(self.start.elapsed().as_secs_f64());
        self.codes
            .get_or_create(&CodeLabels {
                rpc: self.labels,
                grpc_code: GrpcCode(code),
            })
            .inc();
    }
}

// === impl CodeLabels ===

// Equivalent to `#[derive(EncodeLabelSet)]` with `#[prometheus(flatten)] rpc`;
// prometheus-client-derive-encode 0.4 only supports flattening the last field.
impl EncodeLabelSet for CodeLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> std::fmt::Result {
        ("grpc_service", self.rpc.grpc_service).encode(encoder.encode_label())?;
        ("grpc_method", self.rpc.grpc_method).encode(encoder.encode_label())?;
        ("grpc_type", self.rpc.grpc_type).encode(encoder.encode_label())?;
        ("grpc_code", self.grpc_code).encode(encoder.encode_label())
    }
}

// === impl GrpcCode ===

impl EncodeLabelValue for GrpcCode {
    fn encode(&self, enc: &mut LabelValueEncoder<'_>) -> std::fmt::Result {
        if self.0 == tonic::Code::Ok {
            return enc.write_str("OK");
        }
        // `DeadlineExceeded` is encoded as `DEADLINE_EXCEEDED`.
        let name = format!("{:?}", self.0);
        for (i, c) in name.char_indices() {
            if i > 0 && c.is_ascii_uppercase() {
                enc.write_char('_')?;
            }
            enc.write_char(c.to_ascii_uppercase())?;
        }
        Ok(())
    }
}
