//! # Beam Tools - 设备数据库与配置
//!
//! **依赖原则**: 只依赖序列化和错误处理，不依赖 `beam-pseudo` / `beam-signal`，
//! 设备的构造由 `beam-devices` 完成。
//!
//! ## 包含模块
//!
//! - `database` - 设备数据库（TOML）
//! - `table` - 查找表文件读取
//! - `config` - CLI 配置

pub mod config;
pub mod database;
mod error;
pub mod table;

pub use config::CliConfig;
pub use database::{
    AxisConfig, AxisSource, CombineKind, DeviceDatabase, DeviceEntry, DeviceKind, TableSource,
    pick_class,
};
pub use error::ConfigError;
pub use table::{parse_table, read_table};
