//! 强类型物理量
//!
//! 使用 NewType 模式区分时间和长度，光程换算只能在两者之间显式进行。
//!
//! ```rust
//! use beam_units::{Meters, Seconds};
//!
//! let path = Seconds(1e-9).to_optical_path(2);
//! assert!((path.0 - 0.149896229).abs() < 1e-12);
//!
//! let delay = path.to_optical_delay(2);
//! assert!((delay.0 - 1e-9).abs() < 1e-21);
//! ```

use crate::SPEED_OF_LIGHT;
use crate::error::UnitError;
use crate::unit::{Dimension, Unit};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// 秒（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Seconds(pub f64);

/// 米（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Meters(pub f64);

impl Seconds {
    /// 零时间
    pub const ZERO: Self = Seconds(0.0);

    /// 从任意时间单位创建
    pub fn from_unit(value: f64, unit: Unit) -> Result<Self, UnitError> {
        Ok(Seconds(unit.convert(value, Unit::base(Dimension::Time))?))
    }

    /// 换算到任意时间单位
    pub fn in_unit(self, unit: Unit) -> Result<f64, UnitError> {
        Unit::Second.convert(self.0, unit)
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 延迟对应的位移台行程
    ///
    /// 光在位移台上往返 `n_bounces` 次，行程 = `t * c / n_bounces`。
    #[inline]
    pub fn to_optical_path(self, n_bounces: u32) -> Meters {
        Meters(self.0 * SPEED_OF_LIGHT / f64::from(n_bounces))
    }
}

impl Meters {
    /// 零长度
    pub const ZERO: Self = Meters(0.0);

    /// 从任意长度单位创建
    pub fn from_unit(value: f64, unit: Unit) -> Result<Self, UnitError> {
        Ok(Meters(unit.convert(value, Unit::base(Dimension::Length))?))
    }

    /// 换算到任意长度单位
    pub fn in_unit(self, unit: Unit) -> Result<f64, UnitError> {
        Unit::Meter.convert(self.0, unit)
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 位移台行程对应的光学延迟
    ///
    /// `t = d / c * n_bounces`，与 [`Seconds::to_optical_path`] 互逆。
    #[inline]
    pub fn to_optical_delay(self, n_bounces: u32) -> Seconds {
        Seconds(self.0 / SPEED_OF_LIGHT * f64::from(n_bounces))
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e} s", self.0)
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} m", self.0)
    }
}

macro_rules! impl_quantity_ops {
    ($t:ident) => {
        impl Add for $t {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                $t(self.0 + rhs.0)
            }
        }

        impl Sub for $t {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                $t(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $t {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                $t(self.0 * rhs)
            }
        }

        impl Div<f64> for $t {
            type Output = Self;
            #[inline]
            fn div(self, rhs: f64) -> Self {
                $t(self.0 / rhs)
            }
        }

        impl Neg for $t {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                $t(-self.0)
            }
        }
    };
}

impl_quantity_ops!(Seconds);
impl_quantity_ops!(Meters);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unit() {
        let t = Seconds::from_unit(1.0, Unit::Nanosecond).unwrap();
        assert!((t.0 - 1e-9).abs() < 1e-24);

        let d = Meters::from_unit(150.0, Unit::Millimeter).unwrap();
        assert!((d.0 - 0.15).abs() < 1e-15);

        // 长度单位不能用来构造时间
        assert!(Seconds::from_unit(1.0, Unit::Meter).is_err());
        assert!(Meters::from_unit(1.0, Unit::Second).is_err());
    }

    #[test]
    fn test_optical_path_two_bounces() {
        let path = Seconds(1e-9).to_optical_path(2);
        let mm = path.in_unit(Unit::Millimeter).unwrap();
        assert!((mm - 149.896229).abs() < 1e-6);
    }

    #[test]
    fn test_optical_roundtrip() {
        for n in 1..=8 {
            let t = Seconds(3.3e-12);
            let back = t.to_optical_path(n).to_optical_delay(n);
            assert!((back.0 - t.0).abs() < 1e-24);
        }
    }

    #[test]
    fn test_operations() {
        assert_eq!(Seconds(1.0) + Seconds(2.0), Seconds(3.0));
        assert_eq!(Meters(3.0) - Meters(1.0), Meters(2.0));
        assert_eq!(Meters(2.0) * 2.0, Meters(4.0));
        assert_eq!(Seconds(4.0) / 2.0, Seconds(2.0));
        assert_eq!(-Meters(1.0), Meters(-1.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Meters(0.15)), "0.150000 m");
        assert_eq!(format!("{}", Seconds(1e-9)), "1e-9 s");
    }
}
