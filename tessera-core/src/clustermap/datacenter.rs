use super::data_node::DataNode;
use super::layout::DatacenterLayout;
use super::resolver::HostnameResolver;
use crate::config::ClusterMapConfig;
use crate::health::ResourceStatePolicyFactory;
use crate::{Result, TesseraError};
use std::sync::Arc;

#[derive(Debug)]
pub struct Datacenter {
    name: String,
    data_nodes: Vec<Arc<DataNode>>,
    raw_capacity_in_bytes: u64,
}

impl Datacenter {
    pub fn new(
        layout: &DatacenterLayout,
        config: &ClusterMapConfig,
        resolver: &dyn HostnameResolver,
        policies: &dyn ResourceStatePolicyFactory,
    ) -> Result<Self> {
        if layout.name.trim().is_empty() {
            return Err(TesseraError::Config(
                "datacenter name cannot be empty".to_string(),
            ));
        }

        let data_nodes = layout
            .data_nodes
            .iter()
            .map(|node| {
                DataNode::new(&layout.name, node, config, resolver, policies).map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;
        let raw_capacity_in_bytes = data_nodes
            .iter()
            .map(|node| node.raw_capacity_in_bytes())
            .sum();

        Ok(Self {
            name: layout.name.clone(),
            data_nodes,
            raw_capacity_in_bytes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_nodes(&self) -> &[Arc<DataNode>] {
        &self.data_nodes
    }

    pub fn raw_capacity_in_bytes(&self) -> u64 {
        self.raw_capacity_in_bytes
    }

    pub fn to_layout(&self) -> DatacenterLayout {
        DatacenterLayout {
            name: self.name.clone(),
            data_nodes: self.data_nodes.iter().map(|node| node.to_layout()).collect(),
        }
    }
}
