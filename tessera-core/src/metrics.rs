//! Request metrics sink. Recording is best effort: implementations must not
//! block and must not fail the request they observe.

use crate::clustermap::DataNode;
use crate::operations::kind::PayloadKind;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

pub trait MetricsSink: Send + Sync {
    fn record_rate(&self, node: &DataNode, kind: PayloadKind);

    fn record_latency(&self, node: &DataNode, kind: PayloadKind, elapsed: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_rate(&self, _node: &DataNode, _kind: PayloadKind) {}

    fn record_latency(&self, _node: &DataNode, _kind: PayloadKind, _elapsed: Duration) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStats {
    pub requests: u64,
    pub completed: u64,
    pub total_latency: Duration,
    pub max_latency: Duration,
}

/// Per node and kind counters kept in process.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    stats: Mutex<HashMap<(String, PayloadKind), RequestStats>>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self, node: &DataNode, kind: PayloadKind) -> RequestStats {
        self.stats
            .lock()
            .get(&(node_key(node), kind))
            .copied()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<(String, PayloadKind, RequestStats)> {
        let mut entries: Vec<_> = self
            .stats
            .lock()
            .iter()
            .map(|((node, kind), stats)| (node.clone(), *kind, *stats))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_str().cmp(b.1.as_str())));
        entries
    }
}

impl MetricsSink for RequestMetrics {
    fn record_rate(&self, node: &DataNode, kind: PayloadKind) {
        let mut stats = self.stats.lock();
        stats.entry((node_key(node), kind)).or_default().requests += 1;
    }

    fn record_latency(&self, node: &DataNode, kind: PayloadKind, elapsed: Duration) {
        let mut stats = self.stats.lock();
        let entry = stats.entry((node_key(node), kind)).or_default();
        entry.completed += 1;
        entry.total_latency += elapsed;
        entry.max_latency = entry.max_latency.max(elapsed);
    }
}

fn node_key(node: &DataNode) -> String {
    format!("{}:{}", node.hostname(), node.port())
}
