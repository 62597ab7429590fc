//! 仿真电机
//!
//! 无硬件依赖的真实轴实现：
//!
//! - 默认瞬间到位（`travel_time` 为零）
//! - 设置 `travel_time` 后在后台线程中模拟运动时间
//! - 支持软限位、拒绝设置限位、注入运动故障，并记录所有移动目标
//! - 每次位置变化（到位或 [`SimMotor::set_position`]）都通知读回订阅者

use crate::error::SignalError;
use crate::positioner::{Positioner, ReadbackCallback, ReadbackSubscribers};
use crate::status::MoveStatus;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::trace;

/// 仿真电机
pub struct SimMotor {
    name: String,
    egu: String,
    travel_time: Duration,
    position: Arc<Mutex<f64>>,
    moving: Arc<AtomicBool>,
    // 每次 move/stop 递增，后台线程据此判断运动是否已被取代
    generation: Arc<AtomicU64>,
    limits: Mutex<(f64, f64)>,
    reject_limits: AtomicBool,
    fail_next: Mutex<Option<String>>,
    history: Mutex<Vec<f64>>,
    subscribers: Arc<ReadbackSubscribers>,
}

impl SimMotor {
    /// 创建位于 0 的瞬时电机
    pub fn new(name: impl Into<String>, egu: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            egu: egu.into(),
            travel_time: Duration::ZERO,
            position: Arc::new(Mutex::new(0.0)),
            moving: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            limits: Mutex::new((0.0, 0.0)),
            reject_limits: AtomicBool::new(false),
            fail_next: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            subscribers: Arc::new(ReadbackSubscribers::new()),
        }
    }

    /// 设置初始位置
    pub fn with_position(self, position: f64) -> Self {
        *self.position.lock() = position;
        self
    }

    /// 设置每次运动的耗时
    pub fn with_travel_time(mut self, travel_time: Duration) -> Self {
        self.travel_time = travel_time;
        self
    }

    /// 设置软限位
    pub fn with_limits(self, limits: (f64, f64)) -> Self {
        *self.limits.lock() = limits;
        self
    }

    /// 让 `set_limits` 返回错误
    pub fn reject_limits(&self, reject: bool) {
        self.reject_limits.store(reject, Ordering::Relaxed);
    }

    /// 下一次运动以指定原因失败
    pub fn fail_next_move(&self, reason: impl Into<String>) {
        *self.fail_next.lock() = Some(reason.into());
    }

    /// 模拟外部改变位置（例如手动操作）
    pub fn set_position(&self, position: f64) {
        *self.position.lock() = position;
        self.subscribers.notify(position);
    }

    /// 所有移动目标（按命令顺序）
    pub fn move_history(&self) -> Vec<f64> {
        self.history.lock().clone()
    }
}

impl Positioner for SimMotor {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Result<f64, SignalError> {
        Ok(*self.position.lock())
    }

    fn move_to(&self, target: f64) -> Result<MoveStatus, SignalError> {
        self.check_value(target)?;
        self.history.lock().push(target);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        if let Some(reason) = self.fail_next.lock().take() {
            trace!("{}: injected fault moving to {}", self.name, target);
            return Ok(MoveStatus::failed(reason));
        }

        if self.travel_time.is_zero() {
            *self.position.lock() = target;
            self.subscribers.notify(target);
            return Ok(MoveStatus::done());
        }

        let (status, completer) = MoveStatus::pending();
        let position = self.position.clone();
        let moving = self.moving.clone();
        let current = self.generation.clone();
        let subscribers = self.subscribers.clone();
        let travel_time = self.travel_time;
        moving.store(true, Ordering::Release);

        thread::Builder::new()
            .name(format!("sim-motor-{}", self.name))
            .spawn(move || {
                spin_sleep::sleep(travel_time);
                if current.load(Ordering::Acquire) != generation {
                    completer.fail("motion superseded");
                    return;
                }
                *position.lock() = target;
                moving.store(false, Ordering::Release);
                subscribers.notify(target);
                completer.success();
            })
            .map_err(|e| SignalError::io(&self.name, e.to_string()))?;

        Ok(status)
    }

    fn egu(&self) -> String {
        self.egu.clone()
    }

    fn limits(&self) -> (f64, f64) {
        *self.limits.lock()
    }

    fn set_limits(&self, limits: (f64, f64)) -> Result<(), SignalError> {
        if self.reject_limits.load(Ordering::Relaxed) {
            return Err(SignalError::LimitsRejected {
                device: self.name.clone(),
                low: limits.0,
                high: limits.1,
                reason: "limits are read-only".to_string(),
            });
        }
        *self.limits.lock() = limits;
        Ok(())
    }

    fn moving(&self) -> bool {
        self.moving.load(Ordering::Acquire)
    }

    fn stop(&self) -> Result<(), SignalError> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.moving.store(false, Ordering::Release);
        Ok(())
    }

    fn subscribe(&self, callback: ReadbackCallback) {
        self.subscribers.add(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusError;

    #[test]
    fn test_instant_move() {
        let motor = SimMotor::new("mtr", "mm").with_position(1.0);
        assert_eq!(motor.position().unwrap(), 1.0);

        let status = motor.move_to(5.0).unwrap();
        assert!(status.success());
        assert_eq!(motor.position().unwrap(), 5.0);
        assert_eq!(motor.move_history(), vec![5.0]);
        assert_eq!(motor.egu(), "mm");
    }

    #[test]
    fn test_travel_time() {
        let motor = SimMotor::new("slow", "mm").with_travel_time(Duration::from_millis(20));
        let status = motor.move_to(3.0).unwrap();
        assert!(motor.moving());
        assert_eq!(status.wait(Some(Duration::from_secs(5))), Ok(()));
        assert_eq!(motor.position().unwrap(), 3.0);
        assert!(!motor.moving());
    }

    #[test]
    fn test_stop_supersedes_motion() {
        let motor = SimMotor::new("slow", "mm").with_travel_time(Duration::from_millis(50));
        let status = motor.move_to(3.0).unwrap();
        motor.stop().unwrap();
        assert!(matches!(
            status.wait(Some(Duration::from_secs(5))),
            Err(StatusError::Failed(_))
        ));
        assert_eq!(motor.position().unwrap(), 0.0);
    }

    #[test]
    fn test_soft_limits() {
        let motor = SimMotor::new("mtr", "mm").with_limits((-1.0, 1.0));
        assert!(matches!(
            motor.move_to(2.0),
            Err(SignalError::OutOfRange { .. })
        ));
        assert!(motor.move_to(0.5).is_ok());

        // low >= high 表示不限位
        motor.set_limits((0.0, 0.0)).unwrap();
        assert!(motor.move_to(100.0).is_ok());
    }

    #[test]
    fn test_reject_limits() {
        let motor = SimMotor::new("mtr", "mm");
        motor.reject_limits(true);
        assert!(matches!(
            motor.set_limits((0.0, 1.0)),
            Err(SignalError::LimitsRejected { .. })
        ));
        assert_eq!(motor.limits(), (0.0, 0.0));
    }

    #[test]
    fn test_readback_subscribers() {
        let motor = SimMotor::new("slow", "mm").with_travel_time(Duration::from_millis(5));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        motor.subscribe(Arc::new(move |value: f64| sink.lock().push(value)));

        // 外部改变位置
        motor.set_position(7.0);
        assert_eq!(*seen.lock(), vec![7.0]);

        // 运动到位后通知，且先于完成句柄
        let status = motor.move_to(2.0).unwrap();
        assert_eq!(status.wait(Some(Duration::from_secs(5))), Ok(()));
        assert_eq!(*seen.lock(), vec![7.0, 2.0]);
    }

    #[test]
    fn test_superseded_motion_does_not_notify() {
        let motor = SimMotor::new("slow", "mm").with_travel_time(Duration::from_millis(20));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        motor.subscribe(Arc::new(move |value: f64| sink.lock().push(value)));

        let status = motor.move_to(3.0).unwrap();
        motor.stop().unwrap();
        assert!(status.wait(Some(Duration::from_secs(5))).is_err());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_injected_fault() {
        let motor = SimMotor::new("mtr", "mm");
        motor.fail_next_move("amplifier fault");
        let status = motor.move_to(1.0).unwrap();
        assert_eq!(
            status.result(),
            Some(Err(StatusError::Failed("amplifier fault".to_string())))
        );
        assert_eq!(motor.position().unwrap(), 0.0);

        // 故障只影响一次运动
        assert!(motor.move_to(1.0).unwrap().success());
    }
}
