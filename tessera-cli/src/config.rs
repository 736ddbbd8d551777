use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tessera_core::{
    ClusterMapConfig, HardwareLayout, OperationConfig, PartitionLayout, Result, StaticClusterMap,
    TesseraError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identifies this client in every wire request.
    pub client_id: String,
    pub hardware_layout: PathBuf,
    pub partition_layout: PathBuf,
    pub connect_timeout_ms: u64,
    pub cluster_map: ClusterMapConfig,
    pub operation: OperationConfig,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(
                ::config::Environment::with_prefix("TESSERA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| TesseraError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| TesseraError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(TesseraError::Config("client_id cannot be empty".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(TesseraError::Config(
                "connect_timeout_ms must be positive".to_string(),
            ));
        }
        self.cluster_map.validate()?;
        self.operation.validate()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_layouts(&self) -> Result<(HardwareLayout, PartitionLayout)> {
        let hardware = HardwareLayout::from_file(&self.hardware_layout)?;
        let partitions = PartitionLayout::from_file(&self.partition_layout)?;
        Ok((hardware, partitions))
    }

    pub fn load_cluster_map(&self) -> Result<StaticClusterMap> {
        let (hardware, partitions) = self.read_layouts()?;
        StaticClusterMap::from_config(&hardware, &partitions, &self.cluster_map)
    }
}
