//! PV 地址组合
//!
//! 子组件的地址在构造时由父前缀显式组合一次，之后不再变化：
//!
//! - [`PvAddress::child`]: `"{parent}:{attr}"`，用于没有自身前缀的子轴
//! - [`PvAddress::with_suffix`]: 直接拼接后缀（后缀通常自带 `:`）
//!
//! ```rust
//! use beam_signal::PvAddress;
//!
//! let stage = PvAddress::new("LAS:DLY");
//! let delay = stage.child("delay");
//! assert_eq!(delay.as_str(), "LAS:DLY:delay");
//! assert_eq!(delay.with_suffix(":OphydSetpoint").as_str(), "LAS:DLY:delay:OphydSetpoint");
//! ```

use std::fmt;

/// PV 地址
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PvAddress(String);

impl PvAddress {
    /// 创建地址
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// 子组件地址：`"{self}:{attr}"`
    ///
    /// 父地址为空时直接使用 `attr`。
    pub fn child(&self, attr: &str) -> Self {
        if self.0.is_empty() {
            Self(attr.to_string())
        } else {
            Self(format!("{}:{}", self.0, attr))
        }
    }

    /// 拼接后缀
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }

    /// 地址字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PvAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PvAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for PvAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}
