//! 设备层错误类型定义

use beam_pseudo::PseudoError;
use beam_signal::SignalError;
use beam_tools::ConfigError;
use thiserror::Error;

/// 设备层错误类型
#[derive(Error, Debug)]
pub enum DeviceError {
    /// 伪定位器错误（校验、运动超时等）
    #[error("Pseudo positioner error: {0}")]
    Pseudo(#[from] PseudoError),

    /// 信号错误
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    /// 数据库错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 表格文件读取失败
    #[error("Failed to load table for '{device}': {reason}")]
    Table { device: String, reason: String },

    /// 数据库中没有该设备
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
}

impl DeviceError {
    /// 是否为输入校验错误（没有发出任何运动）
    pub fn is_validation(&self) -> bool {
        match self {
            DeviceError::Pseudo(e) => e.is_validation(),
            DeviceError::Signal(SignalError::OutOfRange { .. }) => true,
            _ => false,
        }
    }
}
