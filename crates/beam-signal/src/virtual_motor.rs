//! 虚拟电机
//!
//! 由两个闭包组成的真实轴：一个发出移动命令，一个读取当前位置。
//! 移动后由后台线程轮询位置，读数接近目标时完成句柄。
//! 每个轮询读数都通知读回订阅者；电机被丢弃后轮询线程随之退出。
//!
//! ```rust
//! use beam_signal::{Positioner, VirtualMotor};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::time::Duration;
//!
//! let cell = Arc::new(AtomicU64::new(0f64.to_bits()));
//! let (set, get) = (cell.clone(), cell.clone());
//! let motor = VirtualMotor::new(
//!     "virtual",
//!     move |value| set.store(value.to_bits(), Ordering::SeqCst),
//!     move || f64::from_bits(get.load(Ordering::SeqCst)),
//! )
//! .with_poll_interval(Duration::from_millis(1));
//!
//! let status = motor.move_to(2.0).unwrap();
//! assert!(status.wait(Some(Duration::from_secs(1))).is_ok());
//! assert_eq!(motor.position().unwrap(), 2.0);
//! ```

use crate::error::SignalError;
use crate::positioner::{Positioner, ReadbackCallback, ReadbackSubscribers};
use crate::status::MoveStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

type MoveFn = dyn Fn(f64) + Send + Sync;
type PositionFn = dyn Fn() -> f64 + Send + Sync;

/// 默认轮询周期
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// 判断到位的容差：`|x - goal| <= ATOL + RTOL * |goal|`
const RTOL: f64 = 1e-5;
const ATOL: f64 = 1e-8;

/// 读数与目标是否足够接近
#[inline]
pub fn is_close(position: f64, goal: f64) -> bool {
    (position - goal).abs() <= ATOL + RTOL * goal.abs()
}

/// 虚拟电机
pub struct VirtualMotor {
    name: String,
    egu: String,
    move_fn: Arc<MoveFn>,
    position_fn: Arc<PositionFn>,
    poll_interval: Duration,
    give_up_after: Option<Duration>,
    moving: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    subscribers: Arc<ReadbackSubscribers>,
}

impl VirtualMotor {
    /// 创建虚拟电机
    ///
    /// - `move_fn`: 发出移动命令
    /// - `position_fn`: 读取当前位置
    pub fn new<M, P>(name: impl Into<String>, move_fn: M, position_fn: P) -> Self
    where
        M: Fn(f64) + Send + Sync + 'static,
        P: Fn() -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            egu: String::new(),
            move_fn: Arc::new(move_fn),
            position_fn: Arc::new(position_fn),
            poll_interval: DEFAULT_POLL_INTERVAL,
            give_up_after: None,
            moving: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            subscribers: Arc::new(ReadbackSubscribers::new()),
        }
    }

    /// 设置工程单位
    pub fn with_egu(mut self, egu: impl Into<String>) -> Self {
        self.egu = egu.into();
        self
    }

    /// 设置轮询周期
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 超过该时长仍未到位时判定运动失败
    pub fn with_give_up_after(mut self, limit: Duration) -> Self {
        self.give_up_after = Some(limit);
        self
    }
}

impl Positioner for VirtualMotor {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Result<f64, SignalError> {
        Ok((self.position_fn)())
    }

    fn move_to(&self, target: f64) -> Result<MoveStatus, SignalError> {
        self.check_value(target)?;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        (self.move_fn)(target);

        let position = (self.position_fn)();
        self.subscribers.notify(position);
        if is_close(position, target) {
            return Ok(MoveStatus::done());
        }

        let (status, completer) = MoveStatus::pending();
        let position_fn = self.position_fn.clone();
        let moving = self.moving.clone();
        let current = self.generation.clone();
        let subscribers = self.subscribers.clone();
        let poll_interval = self.poll_interval;
        let give_up_after = self.give_up_after;
        let name = self.name.clone();
        moving.store(true, Ordering::Release);

        thread::Builder::new()
            .name(format!("virtual-motor-{}", self.name))
            .spawn(move || {
                let started = Instant::now();
                loop {
                    thread::sleep(poll_interval);
                    if current.load(Ordering::Acquire) != generation {
                        completer.fail("motion superseded");
                        return;
                    }
                    // 只剩本线程持有计数器：电机已被丢弃
                    if Arc::strong_count(&current) == 1 {
                        debug!("{}: motor dropped while moving to {}", name, target);
                        completer.fail("motor dropped");
                        return;
                    }
                    let position = position_fn();
                    subscribers.notify(position);
                    if is_close(position, target) {
                        moving.store(false, Ordering::Release);
                        completer.success();
                        return;
                    }
                    if give_up_after.is_some_and(|limit| started.elapsed() >= limit) {
                        debug!("{}: readback {} never reached {}", name, position, target);
                        moving.store(false, Ordering::Release);
                        completer.fail(format!("readback {} never reached {}", position, target));
                        return;
                    }
                }
            })
            .map_err(|e| SignalError::io(&self.name, e.to_string()))?;

        Ok(status)
    }

    fn egu(&self) -> String {
        self.egu.clone()
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
