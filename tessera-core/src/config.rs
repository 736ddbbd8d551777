//! Typed configuration options consumed by the cluster map and the operation
//! engine. None of these carry serde defaults; every value has to be named in
//! the configuration source.

use crate::{Result, TesseraError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStateConfig {
    /// Consecutive errors after which a node is considered down.
    pub error_threshold: u32,
    /// Consecutive successes a down node needs before it is usable again.
    pub success_threshold: u32,
}

impl ResourceStateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.error_threshold == 0 {
            return Err(TesseraError::Config(
                "resource_state.error_threshold must be at least 1".to_string(),
            ));
        }
        if self.success_threshold == 0 {
            return Err(TesseraError::Config(
                "resource_state.success_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub min: u32,
    pub max: u32,
}

impl PortRange {
    /// Registered port range accepted for storage nodes.
    pub const REGISTERED: PortRange = PortRange {
        min: 1025,
        max: 65535,
    };

    pub fn contains(&self, port: u32) -> bool {
        port >= self.min && port <= self.max
    }

    pub fn validate(&self) -> Result<()> {
        if self.min == 0 || self.min > self.max || self.max > u16::MAX as u32 {
            return Err(TesseraError::Config(format!(
                "invalid port range: min={} max={}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostnameResolution {
    /// Resolve through the system resolver and lowercase.
    Dns,
    /// Only normalize case and trailing dots; no lookups.
    Verbatim,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMapConfig {
    pub resource_state: ResourceStateConfig,
    pub port_range: PortRange,
    pub hostname_resolution: HostnameResolution,
}

impl ClusterMapConfig {
    pub fn validate(&self) -> Result<()> {
        self.resource_state.validate()?;
        self.port_range.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationConfig {
    /// Datacenter the coordinator runs in; its replicas are tried first.
    pub local_datacenter: String,
    pub request_timeout_ms: u64,
    pub operation_timeout_ms: u64,
    /// Upper bound on concurrently in-flight replica requests per operation.
    pub parallelism: usize,
    /// Move replicas on down nodes behind healthy ones instead of keeping
    /// them in locality order.
    pub deprioritize_down_nodes: bool,
    pub ssl_enabled_datacenters: Vec<String>,
}

impl OperationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn is_ssl_enabled(&self, datacenter: &str) -> bool {
        self.ssl_enabled_datacenters
            .iter()
            .any(|name| name == datacenter)
    }

    pub fn validate(&self) -> Result<()> {
        if self.local_datacenter.trim().is_empty() {
            return Err(TesseraError::Config(
                "operation.local_datacenter cannot be empty".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(TesseraError::Config(
                "operation.request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.operation_timeout_ms == 0 {
            return Err(TesseraError::Config(
                "operation.operation_timeout_ms must be positive".to_string(),
            ));
        }
        if self.parallelism == 0 {
            return Err(TesseraError::Config(
                "operation.parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
