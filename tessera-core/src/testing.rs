//! Shared fixtures for unit tests.

use crate::clustermap::resolver::VerbatimHostnameResolver;
use crate::clustermap::{
    DataNode, DataNodeLayout, DatacenterLayout, DiskLayout, HardwareLayout, HardwareState,
    HostnameResolver, NameService, PartitionEntry, PartitionLayout, ReplicaLayout,
    StaticClusterMap,
};
use crate::codec::{GetRequest, GetResponse, JsonWireCodec};
use crate::config::{
    ClusterMapConfig, HostnameResolution, OperationConfig, PortRange, ResourceStateConfig,
};
use crate::error::{ReplicaError, ServerErrorCode};
use crate::health::{ConsecutiveFailurePolicy, ResourceStatePolicy, ResourceStatePolicyFactory};
use crate::metrics::RequestMetrics;
use crate::operations::context::OperationContext;
use crate::operations::kind::BlobProperties;
use crate::transport::{Endpoint, Transport};
use crate::{Result, TesseraError};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::DateTime;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub const TEST_PORT: u16 = 6667;

pub fn cluster_map_config() -> ClusterMapConfig {
    ClusterMapConfig {
        resource_state: ResourceStateConfig {
            error_threshold: 3,
            success_threshold: 2,
        },
        port_range: PortRange::REGISTERED,
        hostname_resolution: HostnameResolution::Verbatim,
    }
}

pub fn operation_config() -> OperationConfig {
    OperationConfig {
        local_datacenter: "dc1".to_string(),
        request_timeout_ms: 1_000,
        operation_timeout_ms: 5_000,
        parallelism: 1,
        deprioritize_down_nodes: true,
        ssl_enabled_datacenters: Vec::new(),
    }
}

/// Resolver backed by a fixed table; names missing from it do not resolve.
pub struct FixedHostnameResolver {
    names: HashMap<String, String>,
}

impl FixedHostnameResolver {
    pub fn new<const N: usize>(names: [(&str, &str); N]) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|(name, canonical)| (name.to_string(), canonical.to_string()))
                .collect(),
        }
    }
}

impl HostnameResolver for FixedHostnameResolver {
    fn canonical_hostname(&self, hostname: &str) -> Result<String> {
        self.names
            .get(hostname)
            .cloned()
            .ok_or_else(|| TesseraError::Config(format!("unknown host {}", hostname)))
    }
}

/// Static hosts table: `runsc` is an alias of `localhost`, `node-7` a short
/// name of a node whose reverse record is `node-7.dc1.example`, and `orphan`
/// has no reverse record.
pub struct HostsNameService {
    hosts: Vec<(&'static str, IpAddr)>,
    reverse: Vec<(IpAddr, &'static str)>,
}

pub fn hosts_name_service() -> HostsNameService {
    let loopback = IpAddr::from([127, 0, 0, 1]);
    let node = IpAddr::from([10, 0, 0, 7]);
    HostsNameService {
        hosts: vec![
            ("localhost", loopback),
            ("runsc", loopback),
            ("node-7", node),
            ("node-7.dc1.example", node),
            ("orphan", IpAddr::from([10, 0, 0, 9])),
        ],
        reverse: vec![(loopback, "localhost"), (node, "Node-7.DC1.example.")],
    }
}

impl NameService for HostsNameService {
    fn lookup_host(&self, hostname: &str) -> io::Result<Vec<IpAddr>> {
        let addrs: Vec<_> = self
            .hosts
            .iter()
            .filter(|(name, _)| *name == hostname)
            .map(|(_, addr)| *addr)
            .collect();
        if addrs.is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "unknown host"));
        }
        Ok(addrs)
    }

    fn lookup_addr(&self, addr: &IpAddr) -> io::Result<String> {
        self.reverse
            .iter()
            .find(|(candidate, _)| candidate == addr)
            .map(|(_, name)| name.to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no reverse record"))
    }
}

fn disk(mount_path: &str, capacity_in_bytes: u64) -> DiskLayout {
    DiskLayout {
        mount_path: mount_path.to_string(),
        hardware_state: HardwareState::Available,
        capacity_in_bytes,
    }
}

fn node(hostname: &str, port: u16, disks: Vec<DiskLayout>) -> DataNodeLayout {
    DataNodeLayout {
        hostname: hostname.to_string(),
        port: port as u32,
        ssl_port: port as u32 + 1000,
        hardware_state: HardwareState::Available,
        disks,
    }
}

fn replica(hostname: &str, port: u16, mount_path: &str) -> ReplicaLayout {
    ReplicaLayout {
        hostname: hostname.to_string(),
        port: port as u32,
        mount_path: mount_path.to_string(),
    }
}

/// Two datacenters with two nodes each; node-4 listens on a second port.
pub fn hardware_layout() -> HardwareLayout {
    HardwareLayout {
        cluster_name: "test-cluster".to_string(),
        version: 1,
        datacenters: vec![
            DatacenterLayout {
                name: "dc1".to_string(),
                data_nodes: vec![
                    node(
                        "node-1.dc1",
                        TEST_PORT,
                        vec![disk("/mnt/d0", 1 << 30), disk("/mnt/d1", 1 << 30)],
                    ),
                    node("node-2.dc1", TEST_PORT, vec![disk("/mnt/d0", 2 << 30)]),
                ],
            },
            DatacenterLayout {
                name: "dc2".to_string(),
                data_nodes: vec![
                    node("node-3.dc2", TEST_PORT, vec![disk("/mnt/d0", 1 << 30)]),
                    node("node-4.dc2", 6668, vec![disk("/mnt/d0", 1 << 30)]),
                ],
            },
        ],
    }
}

pub fn partition_layout() -> PartitionLayout {
    PartitionLayout {
        cluster_name: "test-cluster".to_string(),
        version: 1,
        partitions: vec![
            PartitionEntry {
                id: 0,
                replicas: vec![
                    replica("node-1.dc1", TEST_PORT, "/mnt/d0"),
                    replica("node-2.dc1", TEST_PORT, "/mnt/d0"),
                    replica("node-3.dc2", TEST_PORT, "/mnt/d0"),
                ],
            },
            PartitionEntry {
                id: 1,
                replicas: vec![
                    replica("node-1.dc1", TEST_PORT, "/mnt/d1"),
                    replica("node-4.dc2", 6668, "/mnt/d0"),
                ],
            },
        ],
    }
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn sample_properties() -> BlobProperties {
    BlobProperties {
        blob_size: 10,
        service_id: "test-service".to_string(),
        owner_id: Some("owner".to_string()),
        content_type: Some("application/octet-stream".to_string()),
        is_private: false,
        time_to_live_seconds: None,
        creation_time: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or_default(),
    }
}

pub fn properties_response(correlation_id: u64) -> Vec<u8> {
    serde_json::to_vec(&GetResponse {
        correlation_id,
        status: Some(ServerErrorCode::NoError),
        properties: Some(sample_properties()),
        ..GetResponse::default()
    })
    .unwrap()
}

fn status_response(correlation_id: u64, status: ServerErrorCode) -> Vec<u8> {
    serde_json::to_vec(&GetResponse {
        correlation_id,
        status: Some(status),
        ..GetResponse::default()
    })
    .unwrap()
}

/// Health policy that counts what it was told on top of the real policy.
#[derive(Debug)]
pub struct CountingPolicy {
    inner: ConsecutiveFailurePolicy,
    successes: AtomicU32,
    errors: AtomicU32,
}

impl ResourceStatePolicy for CountingPolicy {
    fn on_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
        self.inner.on_success();
    }

    fn on_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.inner.on_error();
    }

    fn is_down(&self) -> bool {
        self.inner.is_down()
    }

    fn is_hard_down(&self) -> bool {
        self.inner.is_hard_down()
    }
}

#[derive(Default)]
pub struct CountingPolicyFactory {
    policies: Mutex<HashMap<String, Arc<CountingPolicy>>>,
}

impl CountingPolicyFactory {
    /// `(successes, errors)` reported for a resource so far.
    pub fn counts(&self, resource: &str) -> (u32, u32) {
        self.policies
            .lock()
            .get(resource)
            .map(|policy| {
                (
                    policy.successes.load(Ordering::SeqCst),
                    policy.errors.load(Ordering::SeqCst),
                )
            })
            .unwrap_or_default()
    }
}

impl ResourceStatePolicyFactory for CountingPolicyFactory {
    fn policy_for(
        &self,
        resource: &str,
        hard_state: HardwareState,
    ) -> Arc<dyn ResourceStatePolicy> {
        let policy = Arc::new(CountingPolicy {
            inner: ConsecutiveFailurePolicy::new(
                resource,
                hard_state,
                &cluster_map_config().resource_state,
            )
            .unwrap(),
            successes: AtomicU32::new(0),
            errors: AtomicU32::new(0),
        });
        self.policies
            .lock()
            .insert(resource.to_string(), policy.clone());
        policy
    }
}

/// What a scripted node does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Properties,
    DelayedProperties(Duration),
    TransportError,
    DelayedError(Duration),
    Malformed,
    Server(ServerErrorCode),
    Hang,
}

/// In-process transport answering from a per-host script.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, Behavior>>,
    sent: Mutex<Vec<Endpoint>>,
}

impl ScriptedTransport {
    pub fn script(&self, hostname: &str, behavior: Behavior) {
        self.scripts.lock().insert(hostname.to_string(), behavior);
    }

    pub fn sent(&self) -> Vec<Endpoint> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: Bytes,
    ) -> std::result::Result<Bytes, ReplicaError> {
        self.sent.lock().push(endpoint.clone());
        let behavior = self.scripts.lock().get(&endpoint.hostname).copied();
        let request: GetRequest = serde_json::from_slice(&request)
            .map_err(|error| ReplicaError::Transport(error.to_string()))?;
        let correlation_id = request.correlation_id;

        let body = match behavior {
            Some(Behavior::Properties) => properties_response(correlation_id),
            Some(Behavior::DelayedProperties(delay)) => {
                tokio::time::sleep(delay).await;
                properties_response(correlation_id)
            }
            Some(Behavior::TransportError) | None => {
                return Err(ReplicaError::Transport(format!(
                    "connection refused: {}",
                    endpoint
                )));
            }
            Some(Behavior::DelayedError(delay)) => {
                tokio::time::sleep(delay).await;
                return Err(ReplicaError::Transport(format!(
                    "connection reset: {}",
                    endpoint
                )));
            }
            Some(Behavior::Malformed) => b"{\"garbage\":".to_vec(),
            Some(Behavior::Server(status)) => status_response(correlation_id, status),
            Some(Behavior::Hang) => std::future::pending().await,
        };
        Ok(Bytes::from(body))
    }
}

/// Single-datacenter-per-entry cluster whose partition 0 has one replica on
/// every listed node, in the listed order.
pub struct TestCluster {
    pub map: Arc<StaticClusterMap>,
    pub transport: Arc<ScriptedTransport>,
    pub metrics: Arc<RequestMetrics>,
    policies: Arc<CountingPolicyFactory>,
}

impl TestCluster {
    pub fn new(nodes: &[(&str, &str)]) -> Self {
        let mut datacenters: Vec<DatacenterLayout> = Vec::new();
        for (datacenter, hostname) in nodes {
            let layout = node(hostname, TEST_PORT, vec![disk("/mnt/d0", 1 << 30)]);
            match datacenters.iter_mut().find(|dc| dc.name == *datacenter) {
                Some(dc) => dc.data_nodes.push(layout),
                None => datacenters.push(DatacenterLayout {
                    name: datacenter.to_string(),
                    data_nodes: vec![layout],
                }),
            }
        }

        let hardware = HardwareLayout {
            cluster_name: "test-cluster".to_string(),
            version: 1,
            datacenters,
        };
        let partitions = PartitionLayout {
            cluster_name: "test-cluster".to_string(),
            version: 1,
            partitions: vec![PartitionEntry {
                id: 0,
                replicas: nodes
                    .iter()
                    .map(|(_, hostname)| replica(hostname, TEST_PORT, "/mnt/d0"))
                    .collect(),
            }],
        };

        let policies = Arc::new(CountingPolicyFactory::default());
        let map = StaticClusterMap::new(
            &hardware,
            &partitions,
            &cluster_map_config(),
            &VerbatimHostnameResolver,
            policies.as_ref(),
        )
        .unwrap();

        Self {
            map: Arc::new(map),
            transport: Arc::new(ScriptedTransport::default()),
            metrics: Arc::new(RequestMetrics::new()),
            policies,
        }
    }

    pub fn node(&self, hostname: &str) -> Arc<DataNode> {
        self.map.data_node(hostname, TEST_PORT).unwrap().clone()
    }

    /// Reports enough errors to mark the node down.
    pub fn trip(&self, hostname: &str) {
        let node = self.node(hostname);
        for _ in 0..cluster_map_config().resource_state.error_threshold {
            node.on_node_error();
        }
        assert!(node.is_down());
    }

    pub fn script(&self, hostname: &str, behavior: Behavior) {
        self.transport.script(hostname, behavior);
    }

    pub fn operation_config(&self, parallelism: usize) -> OperationConfig {
        OperationConfig {
            parallelism,
            ..operation_config()
        }
    }

    pub fn context(&self, parallelism: usize) -> Arc<OperationContext> {
        self.context_with(self.operation_config(parallelism))
    }

    pub fn context_with(&self, config: OperationConfig) -> Arc<OperationContext> {
        Arc::new(
            OperationContext::new(
                config,
                "tessera-test",
                self.map.clone(),
                self.transport.clone(),
                Arc::new(JsonWireCodec),
                self.metrics.clone(),
            )
            .unwrap(),
        )
    }

    /// `(successes, errors)` the node's health policy has seen.
    pub fn health(&self, hostname: &str) -> (u32, u32) {
        self.policies
            .counts(&format!("{}:{}", hostname, TEST_PORT))
    }

    pub fn sends(&self, hostname: &str) -> usize {
        self.transport
            .sent()
            .iter()
            .filter(|endpoint| endpoint.hostname == hostname)
            .count()
    }

    pub fn send_order(&self) -> Vec<String> {
        self.transport
            .sent()
            .into_iter()
            .map(|endpoint| endpoint.hostname)
            .collect()
    }

    pub fn endpoints(&self, hostname: &str) -> Vec<(u16, bool)> {
        self.transport
            .sent()
            .into_iter()
            .filter(|endpoint| endpoint.hostname == hostname)
            .map(|endpoint| (endpoint.port, endpoint.secure))
            .collect()
    }
}
