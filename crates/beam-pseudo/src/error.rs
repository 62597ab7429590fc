//! 伪轴引擎错误类型定义

use beam_signal::{SignalError, StatusError};
use beam_units::UnitError;
use thiserror::Error;

/// 伪轴引擎错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PseudoError {
    /// 位置的字段数量或取值无效
    #[error("Invalid {space} position: {reason}")]
    InvalidPosition {
        /// `"pseudo"` 或 `"real"`
        space: &'static str,
        reason: String,
    },

    /// 未知的轴名称
    #[error("Unknown axis: {0}")]
    UnknownAxis(String),

    /// 查找表缺少配置的轴对应的列
    #[error("Positioners [{}] not present in the table", .axes.join(", "))]
    MissingColumns {
        /// 缺失的轴名称（已排序）
        axes: Vec<String>,
    },

    /// 列名数量与表格列数不一致
    #[error("Column name count ({names}) does not match table column count ({columns})")]
    ColumnCountMismatch { names: usize, columns: usize },

    /// 表格形状无效
    #[error("Invalid table shape: {0}")]
    TableShape(String),

    /// 表格列不单调
    #[error("Table column '{column}' is not monotonic")]
    NonMonotonic { column: String },

    /// 构造参数无效
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter { param: &'static str, reason: String },

    /// 伪轴目标超出限位
    #[error("{axis}: target {value} outside limits [{low}, {high}]")]
    LimitExceeded {
        axis: String,
        value: f64,
        low: f64,
        high: f64,
    },

    /// 变换不支持的轴数量
    #[error("{transform} requires {expected} {kind} axis, found {actual}")]
    UnsupportedAxisCount {
        transform: &'static str,
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 抽象配置被直接使用（缺少必需的轴）
    #[error("Abstract usage: {0}")]
    AbstractUsage(String),

    /// 运动超时
    #[error("Motion did not complete within {timeout_ms}ms")]
    MotionTimeout { timeout_ms: u64 },

    /// 运动失败
    #[error("Motion failed: {0}")]
    MotionFault(String),

    /// 单位错误
    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    /// 信号/电机错误
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),
}

impl PseudoError {
    /// 同步校验错误（在任何运动发出之前返回）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PseudoError::InvalidPosition { .. }
                | PseudoError::UnknownAxis(_)
                | PseudoError::MissingColumns { .. }
                | PseudoError::ColumnCountMismatch { .. }
                | PseudoError::TableShape(_)
                | PseudoError::NonMonotonic { .. }
                | PseudoError::InvalidParameter { .. }
                | PseudoError::LimitExceeded { .. }
                | PseudoError::UnsupportedAxisCount { .. }
                | PseudoError::Unit(_)
                | PseudoError::Signal(SignalError::OutOfRange { .. })
        )
    }

    /// 运动阶段的错误（超时或故障）
    pub fn is_motion_error(&self) -> bool {
        matches!(
            self,
            PseudoError::MotionTimeout { .. } | PseudoError::MotionFault(_)
        )
    }

    /// 抽象配置错误
    pub fn is_abstract_usage(&self) -> bool {
        matches!(self, PseudoError::AbstractUsage(_))
    }
}

impl From<StatusError> for PseudoError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::Timeout { timeout_ms } => PseudoError::MotionTimeout { timeout_ms },
            StatusError::Failed(reason) => PseudoError::MotionFault(reason),
            StatusError::Abandoned => PseudoError::MotionFault(err.to_string()),
        }
    }
}

/// 伪轴引擎结果类型
pub type Result<T> = std::result::Result<T, PseudoError>;
