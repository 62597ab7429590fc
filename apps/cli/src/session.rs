//! 命令执行上下文：配置文件位置和设备数据库

use anyhow::{Context, Result, anyhow};
use beam_devices::{Device, construct_device};
use beam_signal::{HardwareFactory, SimHardware};
use beam_tools::{CliConfig, DeviceDatabase};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// 默认配置文件：`<用户配置目录>/beam/config.toml`
fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow!("无法确定配置目录"))?;
    path.push("beam");
    path.push("config.toml");
    Ok(path)
}

pub struct Session {
    config_path: PathBuf,
    database_override: Option<PathBuf>,
    hardware: Arc<dyn HardwareFactory>,
}

impl Session {
    pub fn new(config_path: Option<PathBuf>, database_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => default_config_file()?,
        };
        debug!("Using config file {}", config_path.display());
        Ok(Self {
            config_path,
            database_override,
            hardware: Arc::new(SimHardware::new()),
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 命令行给出的数据库路径
    pub fn database_override(&self) -> Option<&PathBuf> {
        self.database_override.as_ref()
    }

    pub fn hardware(&self) -> &Arc<dyn HardwareFactory> {
        &self.hardware
    }

    pub fn load_config(&self) -> Result<CliConfig> {
        CliConfig::load_from(&self.config_path)
    }

    /// 数据库路径：命令行参数优先，其次是配置文件
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_override {
            return Ok(path.clone());
        }
        self.load_config()?.database.ok_or_else(|| {
            anyhow!("未配置设备数据库，请使用 --database 或 `beam-cli config set --database <PATH>`")
        })
    }

    pub fn load_database(&self) -> Result<DeviceDatabase> {
        let path = self.database_path()?;
        DeviceDatabase::load(&path)
            .with_context(|| format!("加载设备数据库失败: {}", path.display()))
    }

    /// 构造单个设备
    pub fn device(&self, name: &str) -> Result<Device> {
        let db = self.load_database()?;
        let entry = db
            .find(name)
            .ok_or_else(|| beam_devices::DeviceError::UnknownDevice(name.to_string()))?;
        construct_device(entry, &self.hardware).with_context(|| format!("构造设备 {} 失败", name))
    }
}
