//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use beam_devices::prelude::*;
//! ```

pub use crate::device::{Device, Reading, construct_device};
pub use crate::error::DeviceError;
pub use crate::mpod::{ChannelState, MpodChannel};
pub use crate::registry::DeviceRegistry;

pub use beam_pseudo::{
    DelayStage, LookupTable, PseudoError, PseudoPosition, PseudoPositioner,
    PseudoPositionerBuilder, SyncAxes,
};
pub use beam_signal::{HardwareFactory, Positioner, SimHardware, SimMotor};
pub use beam_tools::{DeviceDatabase, DeviceEntry};
pub use beam_units::Unit;
