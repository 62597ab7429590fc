//! # Beam Devices
//!
//! 由设备数据库构造束线设备：同步轴、光学延迟线、查找表三类伪定位器，
//! 以及 MPOD 电源通道。
//!
//! ```rust
//! use beam_devices::prelude::*;
//! use std::sync::Arc;
//!
//! let db = DeviceDatabase::from_toml_str(r#"
//! [[device]]
//! name = "las_delay"
//! prefix = "LAS:DLY"
//! class = "DelayStage"
//! egu = "ps"
//! motor = { egu = "mm" }
//! "#).unwrap();
//!
//! let hardware: Arc<dyn HardwareFactory> = Arc::new(SimHardware::new());
//! let registry = DeviceRegistry::from_database(&db, &hardware);
//! let delay = registry.get("las_delay").unwrap();
//! delay.mv(&[10.0], None).unwrap();
//! ```

pub mod device;
mod error;
pub mod logging;
pub mod mpod;
pub mod prelude;
pub mod registry;

pub use device::{Device, Reading, construct_device};
pub use error::DeviceError;
pub use mpod::{ChannelState, MpodChannel, MpodKind};
pub use registry::DeviceRegistry;
