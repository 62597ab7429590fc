//! 设备注册表

use crate::device::{Device, construct_device};
use crate::error::DeviceError;
use beam_signal::HardwareFactory;
use beam_tools::DeviceDatabase;
use std::sync::Arc;
use tracing::{info, warn};

/// 由设备数据库构造的全部设备
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    failed: Vec<(String, String)>,
}

impl DeviceRegistry {
    /// 构造数据库中的所有设备
    ///
    /// 单个条目构造失败时记录 warn 日志并跳过，不影响其他设备。
    pub fn from_database(db: &DeviceDatabase, hardware: &Arc<dyn HardwareFactory>) -> Self {
        let mut registry = Self::default();
        for entry in &db.devices {
            match construct_device(entry, hardware) {
                Ok(device) => registry.devices.push(device),
                Err(e) => {
                    warn!("Failed to load {}: {}", entry.name, e);
                    registry.failed.push((entry.name.clone(), e.to_string()));
                },
            }
        }
        info!(
            "Loaded {} devices ({} failed)",
            registry.devices.len(),
            registry.failed.len()
        );
        registry
    }

    /// 按名称查找
    pub fn get(&self, name: &str) -> Result<&Device, DeviceError> {
        self.devices
            .iter()
            .find(|device| device.name() == name)
            .ok_or_else(|| DeviceError::UnknownDevice(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.devices.iter().map(Device::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// 构造失败的条目：`(名称, 错误信息)`
    pub fn failed(&self) -> &[(String, String)] {
        &self.failed
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
