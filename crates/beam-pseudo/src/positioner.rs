//! 伪定位器
//!
//! [`PseudoPositioner`] 把一组真实轴、一个 [`Transform`] 和可选的 notepad 链路组合起来，
//! 负责运动编排：
//!
//! ```text
//! move_to(pseudo)
//!   -> 校验（字段、伪轴限位）
//!   -> forward
//!   -> 校验（真实轴限位）
//!   -> 并行发出所有真实轴运动，聚合完成句柄
//!   -> notepad 推送设定值（非阻塞）
//!   -> 完成后 inverse 重新计算伪位置，notepad 推送读回值
//! ```
//!
//! 除运动完成外，任何真实轴的读回变化（中间位置、外部手动操作）
//! 也会触发重新计算。
//!
//! 句柄是廉价的克隆（内部 `Arc`）。

use crate::axis::AxisSet;
use crate::error::{PseudoError, Result};
use crate::notepad::{NotepadChannel, NotepadLink};
use crate::position::{AxisNames, Position, PseudoPosition, PseudoSpace, RealPosition, Space};
use crate::transform::Transform;
use arc_swap::ArcSwapOption;
use beam_signal::{MoveStatus, PvAddress, SignalError};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, trace};

pub(crate) struct Inner<T> {
    pub(crate) name: String,
    pub(crate) prefix: PvAddress,
    pub(crate) axes: AxisSet,
    pub(crate) transform: T,
    pub(crate) notepad: Option<NotepadLink>,
    pub(crate) default_timeout: Option<Duration>,
    pub(crate) last_position: ArcSwapOption<PseudoPosition>,
}

/// 伪定位器
pub struct PseudoPositioner<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for PseudoPositioner<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transform + 'static> PseudoPositioner<T> {
    pub(crate) fn from_inner(inner: Inner<T>) -> Self {
        let inner = Arc::new(inner);
        inner.subscribe_readbacks();
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn prefix(&self) -> &PvAddress {
        &self.inner.prefix
    }

    pub fn axes(&self) -> &AxisSet {
        &self.inner.axes
    }

    pub fn transform(&self) -> &T {
        &self.inner.transform
    }

    pub fn pseudo_names(&self) -> &AxisNames {
        self.inner.axes.pseudo_names()
    }

    pub fn real_names(&self) -> &AxisNames {
        self.inner.axes.real_names()
    }

    pub fn notepad(&self) -> Option<&NotepadLink> {
        self.inner.notepad.as_ref()
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.inner.default_timeout
    }

    /// 按伪轴顺序创建伪位置
    pub fn make_position(&self, values: impl IntoIterator<Item = f64>) -> Result<PseudoPosition> {
        PseudoPosition::new(self.pseudo_names(), values)
    }

    /// 伪位置 -> 真实目标
    pub fn forward(&self, pseudo: &PseudoPosition) -> Result<RealPosition> {
        self.inner.forward(pseudo)
    }

    /// 真实位置 -> 伪位置
    pub fn inverse(&self, real: &RealPosition) -> Result<PseudoPosition> {
        self.inner.inverse(real)
    }

    /// 所有真实轴的当前位置
    pub fn real_position(&self) -> Result<RealPosition> {
        self.inner.axes.real_position()
    }

    /// 当前伪位置（读取真实轴并重新计算）
    pub fn position(&self) -> Result<PseudoPosition> {
        self.inner.update_position()
    }

    /// 重新计算伪位置并推送读回值
    pub fn update_position(&self) -> Result<PseudoPosition> {
        self.inner.update_position()
    }

    /// 最近一次计算出的伪位置（不访问硬件）
    pub fn last_position(&self) -> Option<PseudoPosition> {
        self.inner.last_position.load_full().map(|p| (*p).clone())
    }

    /// 校验目标并返回对应的真实目标
    pub fn check_value(&self, pseudo: &PseudoPosition) -> Result<RealPosition> {
        self.inner.check_value(pseudo)
    }

    /// 移动到伪位置
    ///
    /// - `wait`: 为 `true` 时阻塞到运动完成（或超时），随后更新伪位置
    /// - `timeout`: 等待上限；`None` 时使用构造时的默认值
    ///
    /// 校验错误在任何运动发出之前同步返回。`wait` 为 `false` 时，
    /// 超时和故障通过返回的句柄报告。
    ///
    /// 某个真实轴无法发出运动时，已发出的轴会先被停止，再返回该错误。
    /// 等待超时后运动仍在继续，完成时照常更新伪位置和读回值。
    pub fn move_to(
        &self,
        pseudo: &PseudoPosition,
        wait: bool,
        timeout: Option<Duration>,
    ) -> Result<MoveStatus> {
        let inner = &self.inner;
        let real = inner.check_value(pseudo)?;
        debug!("{}: moving to {} ({})", inner.name, pseudo, real);

        let status = MoveStatus::all(inner.dispatch(&real)?);

        if let Some(notepad) = &inner.notepad {
            notepad.push(inner.axes.pseudo_axes(), pseudo, NotepadChannel::Setpoint);
        }

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        status.add_callback(move |result| {
            if let Err(e) = result {
                debug!("move finished with error: {}", e);
            }
            if let Some(inner) = weak.upgrade() {
                if let Err(e) = inner.update_position() {
                    debug!("{}: position update after move failed: {}", inner.name, e);
                }
            }
        });

        if wait {
            status
                .wait(timeout.or(inner.default_timeout))
                .map_err(PseudoError::from)?;
            inner.update_position()?;
        }
        Ok(status)
    }

    /// 阻塞移动并返回到位后的伪位置
    pub fn mv(&self, values: &[f64], timeout: Option<Duration>) -> Result<PseudoPosition> {
        let target = self.make_position(values.iter().copied())?;
        self.move_to(&target, true, timeout)?;
        self.inner.current()
    }

    /// 相对当前伪位置移动
    pub fn mvr(&self, deltas: &[f64], timeout: Option<Duration>) -> Result<PseudoPosition> {
        let current = self.position()?;
        if deltas.len() != current.len() {
            return Err(PseudoError::InvalidPosition {
                space: PseudoSpace::LABEL,
                reason: format!("expected {} deltas, got {}", current.len(), deltas.len()),
            });
        }
        let target: Vec<f64> = current
            .values()
            .iter()
            .zip(deltas)
            .map(|(value, delta)| value + delta)
            .collect();
        self.mv(&target, timeout)
    }

    /// 当前位置（where motor）
    pub fn wm(&self) -> Result<PseudoPosition> {
        self.position()
    }

    /// 停止所有真实轴
    ///
    /// 所有轴都会收到停止命令，返回第一个错误。
    pub fn stop(&self) -> Result<()> {
        let mut first_error = None;
        for axis in self.inner.axes.real_axes() {
            if let Err(e) = axis.positioner().stop() {
                debug!("{}: failed to stop {}: {}", self.inner.name, axis.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => {
                info!("{}: stopped", self.inner.name);
                Ok(())
            },
        }
    }
}

impl<T: Transform + 'static> Inner<T> {
    /// 订阅所有真实轴的读回，读数变化时重新计算伪位置
    pub(crate) fn subscribe_readbacks(self: &Arc<Self>) {
        for axis in self.axes.real_axes() {
            let weak: Weak<Inner<T>> = Arc::downgrade(self);
            axis.positioner().subscribe(Arc::new(move |_: f64| {
                if let Some(inner) = weak.upgrade() {
                    if let Err(e) = inner.update_position() {
                        trace!("{}: readback update failed: {}", inner.name, e);
                    }
                }
            }));
        }
    }
}

impl<T: Transform> Inner<T> {
    /// 向所有真实轴发出运动
    ///
    /// 第 k 个轴失败时停止前 k 个已发出的轴，再返回错误。
    fn dispatch(&self, real: &RealPosition) -> std::result::Result<Vec<MoveStatus>, SignalError> {
        let axes = self.axes.real_axes();
        let mut statuses = Vec::with_capacity(axes.len());
        for (index, (axis, &target)) in axes.iter().zip(real.values()).enumerate() {
            match axis.positioner().move_to(target) {
                Ok(status) => statuses.push(status),
                Err(e) => {
                    debug!("{}: {} rejected move to {}: {}", self.name, axis.name(), target, e);
                    for dispatched in &axes[..index] {
                        if let Err(stop_error) = dispatched.positioner().stop() {
                            debug!(
                                "{}: failed to stop {}: {}",
                                self.name,
                                dispatched.name(),
                                stop_error
                            );
                        }
                    }
                    return Err(e);
                },
            }
        }
        Ok(statuses)
    }

    fn forward(&self, pseudo: &PseudoPosition) -> Result<RealPosition> {
        check_fields(pseudo, self.axes.pseudo_names())?;
        let real = self.transform.forward(&self.axes, pseudo)?;
        check_fields(&real, self.axes.real_names())?;
        Ok(real)
    }

    fn inverse(&self, real: &RealPosition) -> Result<PseudoPosition> {
        check_fields(real, self.axes.real_names())?;
        let pseudo = self.transform.inverse(&self.axes, real)?;
        check_fields(&pseudo, self.axes.pseudo_names())?;
        Ok(pseudo)
    }

    fn check_value(&self, pseudo: &PseudoPosition) -> Result<RealPosition> {
        check_fields(pseudo, self.axes.pseudo_names())?;
        for axis in self.axes.pseudo_axes() {
            axis.check_value(pseudo.value(axis.name())?)?;
        }
        let real = self.forward(pseudo)?;
        for (axis, &target) in self.axes.real_axes().iter().zip(real.values()) {
            axis.positioner().check_value(target)?;
        }
        Ok(real)
    }

    fn update_position(&self) -> Result<PseudoPosition> {
        let real = self.axes.real_position()?;
        let pseudo = self.inverse(&real)?;
        trace!("{}: {} -> {}", self.name, real, pseudo);
        self.last_position.store(Some(Arc::new(pseudo.clone())));
        if let Some(notepad) = &self.notepad {
            notepad.push(self.axes.pseudo_axes(), &pseudo, NotepadChannel::Readback);
        }
        Ok(pseudo)
    }

    fn current(&self) -> Result<PseudoPosition> {
        match self.last_position.load_full() {
            Some(position) => Ok((*position).clone()),
            None => self.update_position(),
        }
    }
}

fn check_fields<S: Space>(position: &Position<S>, expected: &AxisNames) -> Result<()> {
    if !position.is_in(expected) {
        return Err(PseudoError::InvalidPosition {
            space: S::LABEL,
            reason: format!("fields {} do not match {}", position.names(), expected),
        });
    }
    Ok(())
}
