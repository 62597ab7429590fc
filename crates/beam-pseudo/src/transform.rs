//! 坐标变换 Trait
//!
//! 每种伪定位器都由一个 [`Transform`] 实现给出伪空间与真实空间之间的映射。
//! `forward` 和 `inverse` 都是必须实现的方法，不存在默认变换。
//!
//! 变换在构造时通过 [`Transform::attach`] 看到最终的轴集合，
//! 可以在这里校验轴的数量和名称、缓存列下标、设置限位。

use crate::axis::{AxisSet, PseudoAxisSpec};
use crate::error::Result;
use crate::position::{PseudoPosition, RealPosition};

/// 坐标变换
pub trait Transform: Send + Sync {
    /// 未显式配置伪轴时使用的伪轴
    fn default_pseudo_axes(&self) -> Vec<PseudoAxisSpec>;

    /// 绑定到轴集合（构造时调用一次）
    fn attach(&mut self, axes: &AxisSet) -> Result<()> {
        let _ = axes;
        Ok(())
    }

    /// 伪位置 -> 真实目标
    fn forward(&self, axes: &AxisSet, pseudo: &PseudoPosition) -> Result<RealPosition>;

    /// 真实位置 -> 伪位置
    fn inverse(&self, axes: &AxisSet, real: &RealPosition) -> Result<PseudoPosition>;
}
