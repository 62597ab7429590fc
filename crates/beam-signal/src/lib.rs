//! # Beam Signal
//!
//! 控制系统信号与电机的抽象层。
//!
//! 伪轴引擎只通过本 crate 定义的接口访问外部世界：
//!
//! - [`Signal`]: 单个 PV 通道（连接状态、写权限、读、写）
//! - [`Positioner`]: 真实轴（当前位置、移动并返回完成句柄、单位、限位）
//! - [`MoveStatus`]: 移动完成句柄，支持等待、回调和聚合
//! - [`HardwareFactory`]: 按 PV 地址创建信号和电机（连接管理）
//!
//! 同时提供无需硬件的仿真实现，用于测试和离线运行：
//! [`SoftSignal`]、[`SimMotor`]、[`VirtualMotor`]、[`SimHardware`]。

pub mod address;
mod error;
pub mod hardware;
pub mod positioner;
pub mod signal;
pub mod sim;
pub mod status;
pub mod virtual_motor;

pub use address::PvAddress;
pub use error::SignalError;
pub use hardware::{HardwareFactory, SimHardware};
pub use positioner::{Positioner, ReadbackCallback, ReadbackSubscribers};
pub use signal::{Signal, SoftSignal};
pub use sim::SimMotor;
pub use status::{MoveStatus, StatusCompleter, StatusError};
pub use virtual_motor::VirtualMotor;
