//! Persisted topology documents.
//!
//! The hardware layout describes datacenters, nodes and disks; the partition
//! layout maps partitions to replicas by (hostname, port, mount path). Both
//! are plain JSON and survive a read -> write -> read cycle field for field.

use super::HardwareState;
use crate::{Result, TesseraError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareLayout {
    pub cluster_name: String,
    pub version: u64,
    pub datacenters: Vec<DatacenterLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterLayout {
    pub name: String,
    pub data_nodes: Vec<DataNodeLayout>,
}

/// Ports are kept wide here so out-of-range values reach validation instead
/// of failing inside the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataNodeLayout {
    pub hostname: String,
    pub port: u32,
    #[serde(rename = "sslport")]
    pub ssl_port: u32,
    pub hardware_state: HardwareState,
    pub disks: Vec<DiskLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskLayout {
    pub mount_path: String,
    pub hardware_state: HardwareState,
    pub capacity_in_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionLayout {
    pub cluster_name: String,
    pub version: u64,
    pub partitions: Vec<PartitionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionEntry {
    pub id: u64,
    pub replicas: Vec<ReplicaLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaLayout {
    pub hostname: String,
    pub port: u32,
    pub mount_path: String,
}

impl HardwareLayout {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self)
    }
}

impl PartitionLayout {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|error| {
        TesseraError::Config(format!(
            "invalid layout file {}: {}",
            path.display(),
            error
        ))
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value)?;
    payload.push('\n');
    std::fs::write(path, payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDWARE_JSON: &str = r#"{
        "clusterName": "test",
        "version": 4,
        "datacenters": [{
            "name": "dc1",
            "dataNodes": [{
                "hostname": "node-1.dc1",
                "port": 6667,
                "sslport": 7667,
                "hardwareState": "AVAILABLE",
                "disks": [
                    {"mountPath": "/mnt/d0", "hardwareState": "AVAILABLE", "capacityInBytes": 1024},
                    {"mountPath": "/mnt/d1", "hardwareState": "UNAVAILABLE", "capacityInBytes": 2048}
                ]
            }]
        }]
    }"#;

    #[test]
    fn hardware_layout_field_names() {
        let layout: HardwareLayout = serde_json::from_str(HARDWARE_JSON).unwrap();
        let node = &layout.datacenters[0].data_nodes[0];
        assert_eq!(node.hostname, "node-1.dc1");
        assert_eq!(node.ssl_port, 7667);
        assert_eq!(node.disks[1].hardware_state, HardwareState::Unavailable);

        let value = serde_json::to_value(&layout).unwrap();
        let node = &value["datacenters"][0]["dataNodes"][0];
        assert_eq!(node["sslport"], 7667);
        assert_eq!(node["hardwareState"], "AVAILABLE");
        assert_eq!(node["disks"][0]["mountPath"], "/mnt/d0");
    }

    #[test]
    fn layout_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hardware.json");
        let layout: HardwareLayout = serde_json::from_str(HARDWARE_JSON).unwrap();

        layout.write_to_file(&path).unwrap();
        let reloaded = HardwareLayout::from_file(&path).unwrap();
        assert_eq!(reloaded, layout);
    }

    #[test]
    fn unreadable_layout_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partitions.json");
        std::fs::write(&path, r#"{"clusterName": "test"}"#).unwrap();

        let error = PartitionLayout::from_file(&path).unwrap_err();
        assert!(matches!(error, TesseraError::Config(_)));
    }
}
