//! 同步轴
//!
//! N 个真实轴 -> 1 个伪轴。所有真实轴保持各自的相对偏移一起运动：
//!
//! - `calc_combined(real)`: 组合位置（默认取第一个轴）
//! - `save_offsets()`: `offset[axis] = real[axis] - combined`
//! - `forward(p)`: `target[axis] = p + offset[axis]`（首次使用时自动保存偏移）
//! - `inverse(real)`: `calc_combined(real)`，不缓存
//!
//! 偏移只有在显式重新保存时才会改变。重新保存与正在进行的运动不是原子的，
//! 由调用方负责串行化。

use crate::axis::{AxisSet, PseudoAxisSpec};
use crate::error::{PseudoError, Result};
use crate::position::{PseudoPosition, RealPosition};
use crate::positioner::PseudoPositioner;
use crate::transform::Transform;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

/// 伪轴名称
pub const SYNC_PSEUDO_AXIS: &str = "pseudo";

/// 真实轴名 -> 偏移
pub type OffsetMap = BTreeMap<String, f64>;

/// 组合函数
pub trait Combine: Send + Sync {
    fn combine(&self, real: &RealPosition) -> f64;
}

/// 内置组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineMode {
    /// 第一个轴
    #[default]
    First,
    Min,
    Max,
    Mean,
}

impl Combine for CombineMode {
    fn combine(&self, real: &RealPosition) -> f64 {
        let values = real.values();
        match self {
            CombineMode::First => values.first().copied().unwrap_or(f64::NAN),
            CombineMode::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            CombineMode::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            CombineMode::Mean => {
                if values.is_empty() {
                    f64::NAN
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            },
        }
    }
}

/// 自定义组合函数
pub struct CombineFn<F>(pub F);

impl<F> Combine for CombineFn<F>
where
    F: Fn(&RealPosition) -> f64 + Send + Sync,
{
    fn combine(&self, real: &RealPosition) -> f64 {
        (self.0)(real)
    }
}

/// 同步轴变换
pub struct SyncAxes<C = CombineMode> {
    combiner: C,
    offsets: Mutex<Option<OffsetMap>>,
}

impl SyncAxes<CombineMode> {
    /// 以第一个轴为组合位置
    pub fn new() -> Self {
        Self::with_combiner(CombineMode::First)
    }

    pub fn with_mode(mode: CombineMode) -> Self {
        Self::with_combiner(mode)
    }
}

impl Default for SyncAxes<CombineMode> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> SyncAxes<CombineFn<F>>
where
    F: Fn(&RealPosition) -> f64 + Send + Sync,
{
    /// 使用闭包作为组合函数
    pub fn with_fn(combine: F) -> Self {
        Self::with_combiner(CombineFn(combine))
    }
}

impl<C: Combine> SyncAxes<C> {
    pub fn with_combiner(combiner: C) -> Self {
        Self {
            combiner,
            offsets: Mutex::new(None),
        }
    }

    /// 组合位置
    pub fn calc_combined(&self, real: &RealPosition) -> f64 {
        self.combiner.combine(real)
    }

    /// 由给定的真实位置计算并缓存偏移
    pub fn save_offsets_from(&self, real: &RealPosition) -> OffsetMap {
        let combined = self.calc_combined(real);
        let offsets: OffsetMap = real
            .iter()
            .map(|(name, value)| (name.to_string(), value - combined))
            .collect();
        debug!("Offsets {:?} cached", offsets);
        *self.offsets.lock() = Some(offsets.clone());
        offsets
    }

    /// 读取真实轴当前位置并缓存偏移
    pub fn save_offsets(&self, axes: &AxisSet) -> Result<OffsetMap> {
        let real = axes.real_position()?;
        Ok(self.save_offsets_from(&real))
    }

    /// 已缓存的偏移（尚未计算时为 `None`）
    pub fn offsets(&self) -> Option<OffsetMap> {
        self.offsets.lock().clone()
    }
}

impl<C: Combine> Transform for SyncAxes<C> {
    fn default_pseudo_axes(&self) -> Vec<PseudoAxisSpec> {
        vec![PseudoAxisSpec::new(SYNC_PSEUDO_AXIS)]
    }

    fn attach(&mut self, axes: &AxisSet) -> Result<()> {
        if axes.real_axes().is_empty() {
            return Err(PseudoError::AbstractUsage(
                "SyncAxes must be given the axes to synchronize".to_string(),
            ));
        }
        if axes.pseudo_axes().len() != 1 {
            return Err(PseudoError::UnsupportedAxisCount {
                transform: "SyncAxes",
                kind: "pseudo",
                expected: 1,
                actual: axes.pseudo_axes().len(),
            });
        }
        Ok(())
    }

    fn forward(&self, axes: &AxisSet, pseudo: &PseudoPosition) -> Result<RealPosition> {
        let target = pseudo.values().first().copied().ok_or_else(|| {
            PseudoError::InvalidPosition {
                space: "pseudo",
                reason: "empty position".to_string(),
            }
        })?;
        let cached = self.offsets.lock().clone();
        let offsets = match cached {
            Some(offsets) => offsets,
            None => self.save_offsets(axes)?,
        };

        let values = axes
            .real_names()
            .iter()
            .map(|name| {
                offsets
                    .get(name)
                    .map(|offset| target + offset)
                    .ok_or_else(|| PseudoError::UnknownAxis(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        RealPosition::new(axes.real_names(), values)
    }

    fn inverse(&self, axes: &AxisSet, real: &RealPosition) -> Result<PseudoPosition> {
        PseudoPosition::new(axes.pseudo_names(), [self.calc_combined(real)])
    }
}

impl<C: Combine + 'static> PseudoPositioner<SyncAxes<C>> {
    /// 以真实轴当前位置重新保存偏移
    pub fn save_offsets(&self) -> Result<OffsetMap> {
        self.transform().save_offsets(self.axes())
    }

    /// 已缓存的偏移
    pub fn offsets(&self) -> Option<OffsetMap> {
        self.transform().offsets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::AxisNames;

    fn real(values: [f64; 3]) -> RealPosition {
        RealPosition::new(&AxisNames::new(["a", "b", "c"]), values).unwrap()
    }

    #[test]
    fn test_combine_modes() {
        let pos = real([2.0, -1.0, 5.0]);
        assert_eq!(CombineMode::First.combine(&pos), 2.0);
        assert_eq!(CombineMode::Min.combine(&pos), -1.0);
        assert_eq!(CombineMode::Max.combine(&pos), 5.0);
        assert_eq!(CombineMode::Mean.combine(&pos), 2.0);
    }

    #[test]
    fn test_custom_combiner() {
        let sync = SyncAxes::with_fn(|real: &RealPosition| real.value("c").unwrap_or(0.0));
        assert_eq!(sync.calc_combined(&real([1.0, 2.0, 3.0])), 3.0);
    }

    #[test]
    fn test_save_offsets_identity() {
        let sync = SyncAxes::new();
        assert!(sync.offsets().is_none());

        let pos = real([1.0, 3.0, -2.0]);
        let offsets = sync.save_offsets_from(&pos);
        assert_eq!(offsets["a"], 0.0);
        assert_eq!(offsets["b"], 2.0);
        assert_eq!(offsets["c"], -3.0);

        let combined = sync.calc_combined(&pos);
        for (name, value) in pos.iter() {
            assert_eq!(combined + offsets[name], value);
        }
        assert_eq!(sync.offsets(), Some(offsets));
    }
}
