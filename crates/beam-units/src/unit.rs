//! 时间与长度单位
//!
//! 每个单位记录它的量纲和相对 SI 基本单位的十进制指数，
//! 换算时只做一次 10 的整数次幂缩放，避免累积误差。

use crate::error::UnitError;
use std::fmt;
use std::str::FromStr;

/// 物理量纲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dimension {
    /// 时间（SI 基本单位：秒）
    Time,
    /// 长度（SI 基本单位：米）
    Length,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Time => write!(f, "time"),
            Dimension::Length => write!(f, "length"),
        }
    }
}

/// 单位枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    /// 秒
    Second,
    /// 毫秒
    Millisecond,
    /// 微秒
    Microsecond,
    /// 纳秒
    Nanosecond,
    /// 皮秒
    Picosecond,
    /// 飞秒
    Femtosecond,
    /// 千米
    Kilometer,
    /// 米
    Meter,
    /// 厘米
    Centimeter,
    /// 毫米
    Millimeter,
    /// 微米
    Micrometer,
    /// 纳米
    Nanometer,
    /// 皮米
    Picometer,
}

impl Unit {
    /// 所有单位
    pub const ALL: [Unit; 13] = [
        Unit::Second,
        Unit::Millisecond,
        Unit::Microsecond,
        Unit::Nanosecond,
        Unit::Picosecond,
        Unit::Femtosecond,
        Unit::Kilometer,
        Unit::Meter,
        Unit::Centimeter,
        Unit::Millimeter,
        Unit::Micrometer,
        Unit::Nanometer,
        Unit::Picometer,
    ];

    /// 单位所属量纲
    pub const fn dimension(self) -> Dimension {
        match self {
            Unit::Second
            | Unit::Millisecond
            | Unit::Microsecond
            | Unit::Nanosecond
            | Unit::Picosecond
            | Unit::Femtosecond => Dimension::Time,
            _ => Dimension::Length,
        }
    }

    /// 相对 SI 基本单位的十进制指数
    pub const fn exponent(self) -> i32 {
        match self {
            Unit::Second | Unit::Meter => 0,
            Unit::Kilometer => 3,
            Unit::Centimeter => -2,
            Unit::Millisecond | Unit::Millimeter => -3,
            Unit::Microsecond | Unit::Micrometer => -6,
            Unit::Nanosecond | Unit::Nanometer => -9,
            Unit::Picosecond | Unit::Picometer => -12,
            Unit::Femtosecond => -15,
        }
    }

    /// 换算到 SI 基本单位的乘数
    #[inline]
    pub fn factor(self) -> f64 {
        10f64.powi(self.exponent())
    }

    /// SI 基本单位（秒或米）
    pub const fn base(dimension: Dimension) -> Unit {
        match dimension {
            Dimension::Time => Unit::Second,
            Dimension::Length => Unit::Meter,
        }
    }

    /// 标准符号
    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::Second => "s",
            Unit::Millisecond => "ms",
            Unit::Microsecond => "us",
            Unit::Nanosecond => "ns",
            Unit::Picosecond => "ps",
            Unit::Femtosecond => "fs",
            Unit::Kilometer => "km",
            Unit::Meter => "m",
            Unit::Centimeter => "cm",
            Unit::Millimeter => "mm",
            Unit::Micrometer => "um",
            Unit::Nanometer => "nm",
            Unit::Picometer => "pm",
        }
    }

    /// 把 `value`（本单位）换算到 `to`
    ///
    /// # 错误
    ///
    /// 量纲不同时返回 [`UnitError::IncompatibleUnits`]，不做任何隐式转换。
    pub fn convert(self, value: f64, to: Unit) -> Result<f64, UnitError> {
        if self.dimension() != to.dimension() {
            return Err(UnitError::IncompatibleUnits {
                from: self.symbol().to_string(),
                from_dim: self.dimension(),
                to: to.symbol().to_string(),
                to_dim: to.dimension(),
            });
        }

        let shift = self.exponent() - to.exponent();
        Ok(if shift >= 0 {
            value * 10f64.powi(shift)
        } else {
            value / 10f64.powi(-shift)
        })
    }

    /// 换算到本量纲的 SI 基本单位
    #[inline]
    pub fn to_base(self, value: f64) -> f64 {
        // 同量纲换算不会失败
        value * self.factor()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // 符号区分大小写（"ms" 与 "Ms" 不同）
        let by_symbol = match trimmed {
            "s" => Some(Unit::Second),
            "ms" => Some(Unit::Millisecond),
            "us" | "µs" | "μs" => Some(Unit::Microsecond),
            "ns" => Some(Unit::Nanosecond),
            "ps" => Some(Unit::Picosecond),
            "fs" => Some(Unit::Femtosecond),
            "km" => Some(Unit::Kilometer),
            "m" => Some(Unit::Meter),
            "cm" => Some(Unit::Centimeter),
            "mm" => Some(Unit::Millimeter),
            "um" | "µm" | "μm" => Some(Unit::Micrometer),
            "nm" => Some(Unit::Nanometer),
            "pm" => Some(Unit::Picometer),
            _ => None,
        };
        if let Some(unit) = by_symbol {
            return Ok(unit);
        }

        // 全称不区分大小写，允许单复数和英式拼写
        let lower = trimmed.to_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower);
        let unit = match singular {
            "sec" | "second" => Unit::Second,
            "millisecond" => Unit::Millisecond,
            "microsecond" => Unit::Microsecond,
            "nanosecond" => Unit::Nanosecond,
            "picosecond" => Unit::Picosecond,
            "femtosecond" => Unit::Femtosecond,
            "kilometer" | "kilometre" => Unit::Kilometer,
            "meter" | "metre" => Unit::Meter,
            "centimeter" | "centimetre" => Unit::Centimeter,
            "millimeter" | "millimetre" => Unit::Millimeter,
            "micrometer" | "micrometre" | "micron" => Unit::Micrometer,
            "nanometer" | "nanometre" => Unit::Nanometer,
            "picometer" | "picometre" => Unit::Picometer,
            _ => return Err(UnitError::UnknownUnit(s.to_string())),
        };
        Ok(unit)
    }
}

/// 按单位字符串换算数值
///
/// # 参数
///
/// - `value`: 数值（以 `from` 为单位）
/// - `from`: 源单位字符串，例如 `"ps"`、`"seconds"`
/// - `to`: 目标单位字符串
///
/// # 错误
///
/// - 任一单位无法识别：[`UnitError::UnknownUnit`]
/// - 量纲不同：[`UnitError::IncompatibleUnits`]
pub fn convert_unit(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    let from: Unit = from.parse()?;
    let to: Unit = to.parse()?;
    from.convert(value, to)
}
