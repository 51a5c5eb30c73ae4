use core::fmt;

use log::error;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use super::errors::MetricsResult;
use crate::flow::{Flow, FlowError};

pub const FLOW_LABELS: [&str; 5] = ["direction", "private", "country", "asn", "asn_org"];

/// Sink for enriched flows. Never fails and never blocks the ingestion loop.
pub trait Observe: Sync + Send {
    fn observe(&self, flow: &Flow);

    fn reject(&self, error: &FlowError);
}

/// Cumulative counters attributed to the remote peer of each flow.
#[derive(Clone)]
pub struct FlowMetrics {
    registry: Registry,

    pub flow_bytes_total: IntCounterVec,
    pub flow_packets_total: IntCounterVec,
    pub flow_records_rejected_total: IntCounterVec,
}

impl fmt::Debug for FlowMetrics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FlowMetrics")
    }
}

impl FlowMetrics {
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        let flow_bytes_total = IntCounterVec::new(
            Opts::new("flow_bytes_total", "Flow Bytes."),
            &FLOW_LABELS,
        )?;
        registry.register(Box::new(flow_bytes_total.clone()))?;

        let flow_packets_total = IntCounterVec::new(
            Opts::new("flow_packets_total", "Flow Packets."),
            &FLOW_LABELS,
        )?;
        registry.register(Box::new(flow_packets_total.clone()))?;

        let flow_records_rejected_total = IntCounterVec::new(
            Opts::new(
                "flow_records_rejected_total",
                "Flow records discarded before aggregation.",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(flow_records_rejected_total.clone()))?;

        Ok(FlowMetrics {
            registry,
            flow_bytes_total,
            flow_packets_total,
            flow_records_rejected_total,
        })
    }

    /// Metrics in Prometheus text format
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            error!("unable to encode metrics: {}", e);
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Observe for FlowMetrics {
    fn observe(&self, flow: &Flow) {
        // unattributable traffic is not aggregated
        let remote = match flow.remote() {
            Some(peer) => peer,
            None => return,
        };

        let labels = [
            flow.direction.as_str(),
            flow.privacy.as_str(),
            remote.country.as_str(),
            remote.asn.as_str(),
            remote.asn_org.as_str(),
        ];

        self.flow_bytes_total
            .with_label_values(&labels)
            .inc_by(flow.bytes);
        self.flow_packets_total
            .with_label_values(&labels)
            .inc_by(flow.packets);
    }

    fn reject(&self, error: &FlowError) {
        self.flow_records_rejected_total
            .with_label_values(&[error.reason()])
            .inc();
    }
}
