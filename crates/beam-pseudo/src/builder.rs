//! PseudoPositioner Builder 模式实现
//!
//! 所有组件（真实轴、伪轴、notepad 信号）在 `build` 时一次性解析，
//! 构造完成后轴集合和字段名不再变化。

use crate::axis::{AxisSet, PseudoAxis, PseudoAxisSpec, RealAxis};
use crate::error::{PseudoError, Result};
use crate::notepad::{DEFAULT_QUEUE_CAPACITY, NotepadLink};
use crate::positioner::{Inner, PseudoPositioner};
use crate::transform::Transform;
use arc_swap::ArcSwapOption;
use beam_signal::{HardwareFactory, Positioner, PvAddress};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// PseudoPositioner Builder
///
/// # 示例
///
/// ```rust
/// use beam_pseudo::{DelayStage, PseudoPositionerBuilder};
/// use beam_signal::{Positioner, SimMotor};
/// use std::sync::Arc;
///
/// let motor: Arc<dyn Positioner> = Arc::new(SimMotor::new("LAS:MMS:01", "mm"));
/// let stage = PseudoPositionerBuilder::new("las_delay", DelayStage::default())
///     .prefix("LAS:DLY")
///     .real_axis("motor", motor)
///     .build()
///     .unwrap();
///
/// let pos = stage.mv(&[1e-9], None).unwrap();
/// assert!((pos.value("delay").unwrap() - 1e-9).abs() < 1e-18);
/// ```
pub struct PseudoPositionerBuilder<T> {
    name: String,
    prefix: PvAddress,
    transform: T,
    pseudo: Option<Vec<PseudoAxisSpec>>,
    real: Vec<RealAxis>,
    notepad: Option<Arc<dyn HardwareFactory>>,
    notepad_capacity: usize,
    default_timeout: Option<Duration>,
}

impl<T: Transform + 'static> PseudoPositionerBuilder<T> {
    /// 创建新的 Builder
    pub fn new(name: impl Into<String>, transform: T) -> Self {
        Self {
            name: name.into(),
            prefix: PvAddress::default(),
            transform,
            pseudo: None,
            real: Vec::new(),
            notepad: None,
            notepad_capacity: DEFAULT_QUEUE_CAPACITY,
            default_timeout: None,
        }
    }

    /// 设备 PV 前缀（没有显式前缀的伪轴以此为父前缀）
    pub fn prefix(mut self, prefix: impl Into<PvAddress>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// 添加真实轴（按添加顺序构成真实空间）
    pub fn real_axis(mut self, name: impl Into<String>, positioner: Arc<dyn Positioner>) -> Self {
        self.real.push(RealAxis::new(name, positioner));
        self
    }

    /// 添加伪轴
    ///
    /// 一旦调用，变换的默认伪轴不再使用。
    pub fn pseudo_axis(mut self, spec: PseudoAxisSpec) -> Self {
        self.pseudo.get_or_insert_with(Vec::new).push(spec);
        self
    }

    /// 为每个伪轴连接 notepad 信号
    pub fn notepad(mut self, hardware: Arc<dyn HardwareFactory>) -> Self {
        self.notepad = Some(hardware);
        self
    }

    /// notepad 队列容量（默认 64）
    pub fn notepad_capacity(mut self, capacity: usize) -> Self {
        self.notepad_capacity = capacity;
        self
    }

    /// `move_to` 未指定超时时使用的等待上限
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// 构建伪定位器
    ///
    /// # 错误
    ///
    /// - 没有任何伪轴：[`PseudoError::AbstractUsage`]
    /// - 轴名重复：[`PseudoError::InvalidParameter`]
    /// - 变换拒绝该轴集合（见各变换的 `attach`）
    /// - notepad 信号无法创建
    pub fn build(self) -> Result<PseudoPositioner<T>> {
        let Self {
            name,
            prefix,
            mut transform,
            pseudo,
            real,
            notepad,
            notepad_capacity,
            default_timeout,
        } = self;

        let specs = pseudo.unwrap_or_else(|| transform.default_pseudo_axes());
        if specs.is_empty() {
            return Err(PseudoError::AbstractUsage(format!(
                "{} has no pseudo axes configured",
                name
            )));
        }

        let mut pseudo_axes = Vec::with_capacity(specs.len());
        for spec in specs {
            let mut axis = PseudoAxis::new(spec, &prefix);
            if let Some(hardware) = &notepad {
                let setpoint = hardware.float_signal(&axis.setpoint_pv(), None)?;
                let readback = hardware.float_signal(&axis.readback_pv(), None)?;
                axis = axis.with_notepad(setpoint, readback);
            }
            pseudo_axes.push(axis);
        }

        let axes = AxisSet::new(pseudo_axes, real)?;
        transform.attach(&axes)?;

        let notepad = match notepad {
            Some(_) => Some(NotepadLink::with_capacity(notepad_capacity)?),
            None => None,
        };

        debug!(
            "{}: built with pseudo axes {} and real axes {}",
            name,
            axes.pseudo_names(),
            axes.real_names()
        );

        Ok(PseudoPositioner::from_inner(Inner {
            name,
            prefix,
            axes,
            transform,
            notepad,
            default_timeout,
            last_position: ArcSwapOption::empty(),
        }))
    }
}
