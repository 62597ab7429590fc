//! 配置错误类型定义

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读写失败
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// TOML 解析失败
    #[error("Failed to parse device database: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Failed to serialize: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 设备名重复
    #[error("Duplicate device name: {0}")]
    DuplicateDevice(String),

    /// 条目内容无效
    #[error("Invalid entry '{device}': {reason}")]
    Invalid { device: String, reason: String },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(device: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            device: device.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::io(
            "/nope/devices.toml",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        let msg = format!("{}", err);
        assert!(msg.contains("/nope/devices.toml") && msg.contains("missing"));

        let err = ConfigError::invalid("lut", "no table");
        assert_eq!(format!("{}", err), "Invalid entry 'lut': no table");

        assert_eq!(
            format!("{}", ConfigError::DuplicateDevice("x".to_string())),
            "Duplicate device name: x"
        );
    }
}
