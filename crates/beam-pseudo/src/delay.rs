//! 光学延迟线
//!
//! 1 个伪轴（时间）<-> 1 个真实轴（距离）。光在位移台上往返 `n_bounces` 次：
//!
//! ```text
//! forward:  delay -> 秒 -> 米 = 秒 * c / n_bounces -> 电机单位
//! inverse:  电机读数 -> 米 -> 秒 = 米 / c * n_bounces -> 伪轴单位
//! ```
//!
//! 真实轴必须命名为 `motor`，伪轴名为 `delay`。显式配置的伪轴单位须与延迟单位一致。

use crate::axis::{AxisSet, PseudoAxisSpec};
use crate::error::{PseudoError, Result};
use crate::position::{PseudoPosition, RealPosition};
use crate::transform::Transform;
use beam_units::{Dimension, Meters, Seconds, Unit, UnitError};
use std::str::FromStr;

/// 真实轴名称
pub const DELAY_MOTOR_AXIS: &str = "motor";
/// 伪轴名称
pub const DELAY_PSEUDO_AXIS: &str = "delay";
/// 默认往返次数
pub const DEFAULT_N_BOUNCES: u32 = 2;

/// 光学延迟线变换
#[derive(Debug, Clone, PartialEq)]
pub struct DelayStage {
    egu: Unit,
    n_bounces: u32,
    motor_unit: Option<Unit>,
}

impl Default for DelayStage {
    fn default() -> Self {
        Self {
            egu: Unit::Second,
            n_bounces: DEFAULT_N_BOUNCES,
            motor_unit: None,
        }
    }
}

impl DelayStage {
    /// 创建延迟线
    ///
    /// `egu` 必须是时间单位，`n_bounces` 必须为正。
    pub fn new(egu: Unit, n_bounces: u32) -> Result<Self> {
        if egu.dimension() != Dimension::Time {
            return Err(UnitError::IncompatibleUnits {
                from: egu.symbol().to_string(),
                from_dim: egu.dimension(),
                to: Unit::Second.symbol().to_string(),
                to_dim: Dimension::Time,
            }
            .into());
        }
        if n_bounces == 0 {
            return Err(PseudoError::InvalidParameter {
                param: "n_bounces",
                reason: "must be a positive integer".to_string(),
            });
        }
        Ok(Self {
            egu,
            n_bounces,
            motor_unit: None,
        })
    }

    /// 按单位字符串创建
    pub fn from_egu(egu: &str, n_bounces: u32) -> Result<Self> {
        Self::new(Unit::from_str(egu)?, n_bounces)
    }

    /// 伪轴单位
    pub fn egu(&self) -> Unit {
        self.egu
    }

    pub fn n_bounces(&self) -> u32 {
        self.n_bounces
    }

    /// 电机单位（绑定后可用）
    pub fn motor_unit(&self) -> Option<Unit> {
        self.motor_unit
    }

    /// 延迟（伪轴单位）-> 电机位置（电机单位）
    pub fn delay_to_motor(&self, delay: f64, motor_unit: Unit) -> Result<f64> {
        let path = Seconds::from_unit(delay, self.egu)?.to_optical_path(self.n_bounces);
        Ok(path.in_unit(motor_unit)?)
    }

    /// 电机位置（电机单位）-> 延迟（伪轴单位）
    pub fn motor_to_delay(&self, position: f64, motor_unit: Unit) -> Result<f64> {
        let delay = Meters::from_unit(position, motor_unit)?.to_optical_delay(self.n_bounces);
        Ok(delay.in_unit(self.egu)?)
    }

    fn attached_motor_unit(&self) -> Result<Unit> {
        self.motor_unit.ok_or_else(|| {
            PseudoError::AbstractUsage("DelayStage used before it was attached".to_string())
        })
    }
}

impl Transform for DelayStage {
    fn default_pseudo_axes(&self) -> Vec<PseudoAxisSpec> {
        vec![PseudoAxisSpec::new(DELAY_PSEUDO_AXIS).with_egu(self.egu.symbol())]
    }

    fn attach(&mut self, axes: &AxisSet) -> Result<()> {
        let motor = axes.real(DELAY_MOTOR_AXIS).ok_or_else(|| {
            PseudoError::AbstractUsage(format!(
                "DelayStage requires a real axis named '{}'",
                DELAY_MOTOR_AXIS
            ))
        })?;
        if axes.real_axes().len() != 1 {
            return Err(PseudoError::UnsupportedAxisCount {
                transform: "DelayStage",
                kind: "real",
                expected: 1,
                actual: axes.real_axes().len(),
            });
        }
        if axes.pseudo_axes().len() != 1 {
            return Err(PseudoError::UnsupportedAxisCount {
                transform: "DelayStage",
                kind: "pseudo",
                expected: 1,
                actual: axes.pseudo_axes().len(),
            });
        }

        // 显式给出的伪轴单位必须与延迟单位一致
        let pseudo = &axes.pseudo_axes()[0];
        if !pseudo.egu().is_empty() && Unit::from_str(pseudo.egu())? != self.egu {
            return Err(PseudoError::InvalidParameter {
                param: "egu",
                reason: format!(
                    "pseudo axis '{}' uses {} but the delay is expressed in {}",
                    pseudo.name(),
                    pseudo.egu(),
                    self.egu.symbol()
                ),
            });
        }

        let egu = motor.positioner().egu();
        let unit = Unit::from_str(&egu)?;
        if unit.dimension() != Dimension::Length {
            return Err(UnitError::IncompatibleUnits {
                from: egu,
                from_dim: unit.dimension(),
                to: Unit::Meter.symbol().to_string(),
                to_dim: Dimension::Length,
            }
            .into());
        }
        self.motor_unit = Some(unit);
        Ok(())
    }

    fn forward(&self, axes: &AxisSet, pseudo: &PseudoPosition) -> Result<RealPosition> {
        let motor_unit = self.attached_motor_unit()?;
        let delay = pseudo.values().first().copied().unwrap_or(f64::NAN);
        let position = self.delay_to_motor(delay, motor_unit)?;
        RealPosition::new(axes.real_names(), [position])
    }

    fn inverse(&self, axes: &AxisSet, real: &RealPosition) -> Result<PseudoPosition> {
        let motor_unit = self.attached_motor_unit()?;
        let position = real.value(DELAY_MOTOR_AXIS)?;
        let delay = self.motor_to_delay(position, motor_unit)?;
        PseudoPosition::new(axes.pseudo_names(), [delay])
    }
}
