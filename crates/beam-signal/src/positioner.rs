//! 真实轴（Positioner）抽象
//!
//! 伪轴引擎驱动的每个真实轴都实现本 Trait。运动是非阻塞的：
//! `move_to` 发出命令后立即返回 [`MoveStatus`]，由调用方决定是否等待。
//!
//! 位置读回的变化（包括运动中间位置和外部手动操作）通过
//! [`Positioner::subscribe`] 注册的回调通知订阅者。

use crate::error::SignalError;
use crate::status::MoveStatus;
use parking_lot::Mutex;
use std::sync::Arc;

/// 读回回调，参数为新的位置读数
pub type ReadbackCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// 读回订阅者列表
///
/// 通知时先复制列表再逐个调用，回调中可以再次订阅。
#[derive(Default)]
pub struct ReadbackSubscribers {
    callbacks: Mutex<Vec<ReadbackCallback>>,
}

impl ReadbackSubscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: ReadbackCallback) {
        self.callbacks.lock().push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 把新读数发给所有订阅者
    pub fn notify(&self, value: f64) {
        let callbacks = self.callbacks.lock().clone();
        for callback in callbacks {
            callback(value);
        }
    }
}

/// 真实轴 Trait
pub trait Positioner: Send + Sync {
    /// 轴名称
    fn name(&self) -> &str;

    /// 当前位置（以 [`egu`](Self::egu) 为单位）
    fn position(&self) -> Result<f64, SignalError>;

    /// 移动到目标位置
    ///
    /// 命令发出后立即返回完成句柄；运动失败通过句柄报告。
    /// 命令本身无法发出时返回 `Err`。
    fn move_to(&self, target: f64) -> Result<MoveStatus, SignalError>;

    /// 工程单位（例如 `"mm"`）
    fn egu(&self) -> String;

    /// 当前软限位 `(low, high)`
    ///
    /// `low >= high` 表示不限位。默认不限位。
    fn limits(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    /// 设置软限位
    ///
    /// 默认实现返回 [`SignalError::Unsupported`]。
    fn set_limits(&self, limits: (f64, f64)) -> Result<(), SignalError> {
        let _ = limits;
        Err(SignalError::unsupported(self.name(), "set_limits"))
    }

    /// 是否正在运动
    fn moving(&self) -> bool {
        false
    }

    /// 停止运动
    fn stop(&self) -> Result<(), SignalError> {
        Ok(())
    }

    /// 订阅位置读回
    ///
    /// 位置每次变化时调用 `callback`。不支持读回通知的实现忽略订阅。
    fn subscribe(&self, callback: ReadbackCallback) {
        let _ = callback;
    }

    /// 检查目标值是否在软限位内
    fn check_value(&self, target: f64) -> Result<(), SignalError> {
        let (low, high) = self.limits();
        if low < high && !(low..=high).contains(&target) {
            return Err(SignalError::OutOfRange {
                device: self.name().to_string(),
                value: target,
                low,
                high,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribers_notified_in_order() {
        let subscribers = ReadbackSubscribers::new();
        assert!(subscribers.is_empty());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        subscribers.add(Arc::new(move |value: f64| sink.lock().push(value)));
        subscribers.notify(1.5);
        subscribers.notify(-2.0);
        assert_eq!(*seen.lock(), vec![1.5, -2.0]);
    }

    #[test]
    fn test_callback_may_subscribe_again() {
        let subscribers = Arc::new(ReadbackSubscribers::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (list, counter) = (subscribers.clone(), calls.clone());
        subscribers.add(Arc::new(move |_: f64| {
            counter.fetch_add(1, Ordering::Relaxed);
            list.add(Arc::new(|_: f64| {}));
        }));

        subscribers.notify(0.0);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(subscribers.len(), 2);
    }
}
