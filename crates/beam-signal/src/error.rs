//! 信号层错误类型定义

use thiserror::Error;

/// 信号层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    /// 通道未连接
    #[error("Signal {0} is not connected")]
    Disconnected(String),

    /// 通道只读
    #[error("Signal {0} is read-only")]
    ReadOnly(String),

    /// 设备不支持该操作
    #[error("{device} does not support {operation}")]
    Unsupported {
        /// 设备名称
        device: String,
        /// 操作名称
        operation: &'static str,
    },

    /// 限位被拒绝
    #[error("{device} rejected limits ({low}, {high}): {reason}")]
    LimitsRejected {
        /// 设备名称
        device: String,
        /// 下限
        low: f64,
        /// 上限
        high: f64,
        /// 原因
        reason: String,
    },

    /// 目标超出软限位
    #[error("{device} target {value} outside soft limits ({low}, {high})")]
    OutOfRange {
        /// 设备名称
        device: String,
        /// 目标值
        value: f64,
        /// 下限
        low: f64,
        /// 上限
        high: f64,
    },

    /// 底层 I/O 错误
    #[error("I/O error on {name}: {reason}")]
    Io {
        /// 通道或设备名称
        name: String,
        /// 原因
        reason: String,
    },
}

impl SignalError {
    /// 创建 I/O 错误
    pub fn io(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Io {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// 创建不支持操作错误
    pub fn unsupported(device: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            device: device.into(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_error_display() {
        let err = SignalError::Disconnected("TST:SIG".to_string());
        assert_eq!(format!("{}", err), "Signal TST:SIG is not connected");

        let err = SignalError::ReadOnly("TST:RO".to_string());
        assert_eq!(format!("{}", err), "Signal TST:RO is read-only");

        let err = SignalError::unsupported("mtr", "set_limits");
        assert_eq!(format!("{}", err), "mtr does not support set_limits");

        let err = SignalError::io("TST:IO", "channel access timeout");
        let msg = format!("{}", err);
        assert!(msg.contains("TST:IO") && msg.contains("channel access timeout"));
    }
}
