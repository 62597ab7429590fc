//! 单位错误类型定义

use crate::unit::Dimension;
use thiserror::Error;

/// 单位错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    /// 无法识别的单位字符串
    #[error("Unknown unit of measure: '{0}'")]
    UnknownUnit(String),

    /// 量纲不兼容（例如秒 -> 米）
    #[error("Cannot convert {from} ({from_dim}) to {to} ({to_dim})")]
    IncompatibleUnits {
        /// 源单位
        from: String,
        /// 源量纲
        from_dim: Dimension,
        /// 目标单位
        to: String,
        /// 目标量纲
        to_dim: Dimension,
    },
}
