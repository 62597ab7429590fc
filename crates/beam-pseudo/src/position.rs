//! 伪坐标与真实坐标
//!
//! 位置是带名字的有序 `f64` 元组。字段名在构造时固定，构成坐标空间的身份：
//! 两个位置只有在字段名完全一致时才属于同一空间。
//!
//! 使用类型参数区分伪空间和真实空间，防止把真实位置当作伪位置传给 `forward`。
//!
//! ```rust
//! use beam_pseudo::{AxisNames, PseudoPosition};
//!
//! let names = AxisNames::new(["delay"]);
//! let pos = PseudoPosition::new(&names, [1e-9]).unwrap();
//! assert_eq!(pos.get("delay"), Some(1e-9));
//! assert_eq!(format!("{}", pos), "PseudoPosition(delay=0.000000001)");
//! ```

use crate::error::{PseudoError, Result};
use smallvec::SmallVec;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 坐标空间标记
pub trait Space: Send + Sync + 'static {
    /// 错误信息中使用的空间名
    const LABEL: &'static str;
    /// 显示时使用的类型名
    const TYPE_NAME: &'static str;
}

/// 伪空间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoSpace;

/// 真实空间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealSpace;

impl Space for PseudoSpace {
    const LABEL: &'static str = "pseudo";
    const TYPE_NAME: &'static str = "PseudoPosition";
}

impl Space for RealSpace {
    const LABEL: &'static str = "real";
    const TYPE_NAME: &'static str = "RealPosition";
}

/// 有序的轴名称列表（共享、不可变）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisNames(Arc<[String]>);

impl AxisNames {
    /// 创建名称列表
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self(names.into())
    }

    /// 名称所在的下标
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    /// 是否包含名称
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按顺序遍历名称
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// 名称切片
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for AxisNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// 坐标空间中的一个位置
#[derive(Debug, Clone, PartialEq)]
pub struct Position<S: Space> {
    names: AxisNames,
    values: SmallVec<[f64; 4]>,
    _space: PhantomData<S>,
}

/// 伪位置
pub type PseudoPosition = Position<PseudoSpace>;
/// 真实位置
pub type RealPosition = Position<RealSpace>;

impl<S: Space> Position<S> {
    /// 按字段顺序创建
    ///
    /// 值的数量必须与字段数量一致，且全部为有限值。
    pub fn new(names: &AxisNames, values: impl IntoIterator<Item = f64>) -> Result<Self> {
        let values: SmallVec<[f64; 4]> = values.into_iter().collect();
        if values.len() != names.len() {
            return Err(PseudoError::InvalidPosition {
                space: S::LABEL,
                reason: format!(
                    "expected {} values for {}, got {}",
                    names.len(),
                    names,
                    values.len()
                ),
            });
        }
        if let Some((name, value)) = names.iter().zip(&values).find(|(_, v)| !v.is_finite()) {
            return Err(PseudoError::InvalidPosition {
                space: S::LABEL,
                reason: format!("{} is not finite ({})", name, value),
            });
        }
        Ok(Self {
            names: names.clone(),
            values,
            _space: PhantomData,
        })
    }

    /// 按字段名创建
    ///
    /// 每个字段必须恰好出现一次；未知字段返回 [`PseudoError::UnknownAxis`]。
    pub fn from_pairs<'a>(
        names: &AxisNames,
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<Self> {
        let mut slots: SmallVec<[Option<f64>; 4]> = SmallVec::from_elem(None, names.len());
        for (name, value) in pairs {
            let index = names
                .index_of(name)
                .ok_or_else(|| PseudoError::UnknownAxis(name.to_string()))?;
            if slots[index].replace(value).is_some() {
                return Err(PseudoError::InvalidPosition {
                    space: S::LABEL,
                    reason: format!("{} given more than once", name),
                });
            }
        }

        let mut values = SmallVec::<[f64; 4]>::with_capacity(names.len());
        for (name, slot) in names.iter().zip(slots) {
            match slot {
                Some(value) => values.push(value),
                None => {
                    return Err(PseudoError::InvalidPosition {
                        space: S::LABEL,
                        reason: format!("missing field {}", name),
                    });
                },
            }
        }
        Self::new(names, values)
    }

    /// 按名称读取
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.index_of(name).map(|i| self.values[i])
    }

    /// 按名称读取，未知名称返回错误
    pub fn value(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| PseudoError::UnknownAxis(name.to_string()))
    }

    /// 所有值（字段顺序）
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 字段名
    pub fn names(&self) -> &AxisNames {
        &self.names
    }

    /// `(名称, 值)` 迭代器
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 是否与给定字段名属于同一空间
    pub fn is_in(&self, names: &AxisNames) -> bool {
        &self.names == names
    }
}

impl<S: Space> fmt::Display for Position<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", S::TYPE_NAME)?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> AxisNames {
        AxisNames::new(["left", "right"])
    }

    #[test]
    fn test_new_checks_shape() {
        let pos = RealPosition::new(&names(), [1.0, 2.0]).unwrap();
        assert_eq!(pos.values(), &[1.0, 2.0]);
        assert_eq!(pos.len(), 2);

        let err = RealPosition::new(&names(), [1.0]).unwrap_err();
        assert!(matches!(
            err,
            PseudoError::InvalidPosition { space: "real", .. }
        ));
    }

    #[test]
    fn test_rejects_nan() {
        let err = PseudoPosition::new(&AxisNames::new(["delay"]), [f64::NAN]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_from_pairs() {
        let pos = RealPosition::from_pairs(&names(), [("right", 4.0), ("left", 3.0)]).unwrap();
        assert_eq!(pos.values(), &[3.0, 4.0]);
        assert_eq!(pos.value("right").unwrap(), 4.0);

        assert_eq!(
            RealPosition::from_pairs(&names(), [("left", 1.0), ("middle", 2.0)]),
            Err(PseudoError::UnknownAxis("middle".to_string()))
        );
        assert!(RealPosition::from_pairs(&names(), [("left", 1.0)]).is_err());
        assert!(RealPosition::from_pairs(&names(), [("left", 1.0), ("left", 2.0)]).is_err());
    }

    #[test]
    fn test_display() {
        let pos = RealPosition::new(&names(), [1.5, -2.0]).unwrap();
        assert_eq!(format!("{}", pos), "RealPosition(left=1.5, right=-2)");
        assert_eq!(format!("{}", names()), "(left, right)");
    }

    #[test]
    fn test_space_identity() {
        let pos = RealPosition::new(&names(), [0.0, 0.0]).unwrap();
        assert!(pos.is_in(&names()));
        assert!(!pos.is_in(&AxisNames::new(["right", "left"])));
        assert_eq!(pos.get("nope"), None);
    }
}
