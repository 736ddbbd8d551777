use super::HardwareState;
use super::layout::DiskLayout;
use crate::{Result, TesseraError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk {
    mount_path: String,
    hard_state: HardwareState,
    raw_capacity_in_bytes: u64,
}

impl Disk {
    pub fn new(layout: &DiskLayout) -> Result<Self> {
        let disk = Self {
            mount_path: layout.mount_path.clone(),
            hard_state: layout.hardware_state,
            raw_capacity_in_bytes: layout.capacity_in_bytes,
        };
        disk.validate()?;
        Ok(disk)
    }

    fn validate(&self) -> Result<()> {
        if self.mount_path.is_empty() {
            return Err(TesseraError::Config(
                "disk mount path cannot be empty".to_string(),
            ));
        }
        if !self.mount_path.starts_with('/') {
            return Err(TesseraError::Config(format!(
                "disk mount path must be absolute: {}",
                self.mount_path
            )));
        }
        if self.raw_capacity_in_bytes == 0 {
            return Err(TesseraError::Config(format!(
                "disk {} must have positive capacity",
                self.mount_path
            )));
        }
        Ok(())
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    pub fn raw_capacity_in_bytes(&self) -> u64 {
        self.raw_capacity_in_bytes
    }

    /// Administrative state from the layout; see `DataNode::disk_state` for
    /// the effective one.
    pub fn hard_state(&self) -> HardwareState {
        self.hard_state
    }

    pub fn to_layout(&self) -> DiskLayout {
        DiskLayout {
            mount_path: self.mount_path.clone(),
            hardware_state: self.hard_state,
            capacity_in_bytes: self.raw_capacity_in_bytes,
        }
    }
}
