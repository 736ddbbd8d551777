use super::disk::Disk;
use super::layout::DataNodeLayout;
use super::resolver::HostnameResolver;
use super::HardwareState;
use crate::config::ClusterMapConfig;
use crate::health::{ResourceStatePolicy, ResourceStatePolicyFactory};
use crate::transport::Endpoint;
use crate::{Result, TesseraError};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A storage node, uniquely identified by hostname and port.
///
/// The node's hardware state is never stored; it is read from the node's
/// [`ResourceStatePolicy`] on every call.
#[derive(Debug)]
pub struct DataNode {
    datacenter: String,
    hostname: String,
    port: u16,
    ssl_port: u16,
    disks: Vec<Disk>,
    raw_capacity_in_bytes: u64,
    state_policy: Arc<dyn ResourceStatePolicy>,
}

impl DataNode {
    pub fn new(
        datacenter: &str,
        layout: &DataNodeLayout,
        config: &ClusterMapConfig,
        resolver: &dyn HostnameResolver,
        policies: &dyn ResourceStatePolicyFactory,
    ) -> Result<Self> {
        tracing::trace!("building data node {}:{}", layout.hostname, layout.port);

        if datacenter.trim().is_empty() {
            return Err(TesseraError::Config(format!(
                "data node {}:{} has no datacenter",
                layout.hostname, layout.port
            )));
        }

        let hostname = layout.hostname.clone();
        validate_hostname(&hostname, resolver)?;
        let port = validate_port("port", layout.port, config)?;
        let ssl_port = validate_port("sslport", layout.ssl_port, config)?;

        let disks = layout
            .disks
            .iter()
            .map(Disk::new)
            .collect::<Result<Vec<_>>>()?;
        let raw_capacity_in_bytes = disks.iter().map(Disk::raw_capacity_in_bytes).sum();

        let state_policy =
            policies.policy_for(&format!("{}:{}", hostname, port), layout.hardware_state);

        Ok(Self {
            datacenter: datacenter.to_string(),
            hostname,
            port,
            ssl_port,
            disks,
            raw_capacity_in_bytes,
            state_policy,
        })
    }

    pub fn datacenter(&self) -> &str {
        &self.datacenter
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn ssl_port(&self) -> u16 {
        self.ssl_port
    }

    pub fn disks(&self) -> &[Disk] {
        &self.disks
    }

    pub fn raw_capacity_in_bytes(&self) -> u64 {
        self.raw_capacity_in_bytes
    }

    pub fn state(&self) -> HardwareState {
        if self.state_policy.is_down() {
            HardwareState::Unavailable
        } else {
            HardwareState::Available
        }
    }

    pub fn is_down(&self) -> bool {
        self.state_policy.is_down()
    }

    pub fn disk_state(&self, disk: &Disk) -> HardwareState {
        if self.is_down() {
            HardwareState::Unavailable
        } else {
            disk.hard_state()
        }
    }

    pub fn on_node_response(&self) {
        self.state_policy.on_success();
    }

    pub fn on_node_timeout(&self) {
        self.state_policy.on_error();
    }

    pub fn on_node_error(&self) {
        self.state_policy.on_error();
    }

    pub fn endpoint(&self, secure: bool) -> Endpoint {
        Endpoint {
            hostname: self.hostname.clone(),
            port: if secure { self.ssl_port } else { self.port },
            secure,
        }
    }

    /// Writes the administrative state only; runtime health is not persisted.
    pub fn to_layout(&self) -> DataNodeLayout {
        DataNodeLayout {
            hostname: self.hostname.clone(),
            port: self.port as u32,
            ssl_port: self.ssl_port as u32,
            hardware_state: if self.state_policy.is_hard_down() {
                HardwareState::Unavailable
            } else {
                HardwareState::Available
            },
            disks: self.disks.iter().map(Disk::to_layout).collect(),
        }
    }
}

fn validate_hostname(hostname: &str, resolver: &dyn HostnameResolver) -> Result<()> {
    let canonical = resolver.canonical_hostname(hostname)?;
    if canonical != hostname {
        return Err(TesseraError::Config(format!(
            "hostname for data node ({}) does not match its canonical name: {}",
            hostname, canonical
        )));
    }
    Ok(())
}

fn validate_port(field: &str, port: u32, config: &ClusterMapConfig) -> Result<u16> {
    let range = config.port_range;
    if port < range.min {
        return Err(TesseraError::Config(format!(
            "invalid {}: {} is less than {}",
            field, port, range.min
        )));
    }
    if port > range.max {
        return Err(TesseraError::Config(format!(
            "invalid {}: {} is greater than {}",
            field, port, range.max
        )));
    }
    u16::try_from(port)
        .map_err(|_| TesseraError::Config(format!("invalid {}: {} is not a port", field, port)))
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataNode[{}:{}]", self.hostname, self.port)
    }
}

impl PartialEq for DataNode {
    fn eq(&self, other: &Self) -> bool {
        self.port == other.port && self.hostname == other.hostname
    }
}

impl Eq for DataNode {}

impl Hash for DataNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hostname.hash(state);
        self.port.hash(state);
    }
}

impl PartialOrd for DataNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.port
            .cmp(&other.port)
            .then_with(|| self.hostname.cmp(&other.hostname))
    }
}
