//! 移动完成句柄（MoveStatus）
//!
//! 真实轴的 `move_to` 立即返回一个 [`MoveStatus`]，运动在后台进行。
//! 句柄可以被克隆、等待（带超时）、注册完成回调，也可以把多个句柄聚合成一个：
//! 聚合句柄在所有子句柄成功后完成，任一子句柄失败时立即以该错误完成。
//!
//! # 示例
//!
//! ```rust
//! use beam_signal::MoveStatus;
//! use std::time::Duration;
//!
//! let (left, left_done) = MoveStatus::pending();
//! let (right, right_done) = MoveStatus::pending();
//! let both = MoveStatus::all([left, right]);
//!
//! left_done.success();
//! assert!(!both.is_done());
//! right_done.success();
//! assert!(both.wait(Some(Duration::from_millis(10))).is_ok());
//! ```

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// 完成句柄错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatusError {
    /// 等待超时（运动可能仍在进行）
    #[error("Status did not complete within {timeout_ms}ms")]
    Timeout {
        /// 超时时间（毫秒）
        timeout_ms: u64,
    },

    /// 运动失败
    #[error("Motion failed: {0}")]
    Failed(String),

    /// 完成端被丢弃而未报告结果
    #[error("Status abandoned before completion")]
    Abandoned,
}

/// 完成结果
pub type StatusResult = Result<(), StatusError>;

type Callback = Box<dyn FnOnce(&StatusResult) + Send>;

enum State {
    Pending(Vec<Callback>),
    Finished(StatusResult),
}

struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

impl Shared {
    /// 设置结果，返回是否是第一次设置
    fn finish(&self, result: StatusResult) -> bool {
        let callbacks = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Finished(_) => return false,
                State::Pending(callbacks) => {
                    let callbacks = std::mem::take(callbacks);
                    *state = State::Finished(result.clone());
                    callbacks
                },
            }
        };
        self.cond.notify_all();

        // 回调在锁外执行，允许回调里再次访问句柄
        for callback in callbacks {
            callback(&result);
        }
        true
    }
}

/// 移动完成句柄
#[derive(Clone)]
pub struct MoveStatus {
    shared: Arc<Shared>,
}

/// 完成端
///
/// 由执行运动的一方持有。丢弃前未调用 [`finish`](Self::finish) 时，
/// 句柄以 [`StatusError::Abandoned`] 完成，等待方不会永久阻塞。
pub struct StatusCompleter {
    shared: Arc<Shared>,
}

impl MoveStatus {
    /// 创建未完成的句柄及其完成端
    pub fn pending() -> (MoveStatus, StatusCompleter) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::Pending(Vec::new())),
            cond: Condvar::new(),
        });
        (
            MoveStatus {
                shared: shared.clone(),
            },
            StatusCompleter { shared },
        )
    }

    /// 创建已成功完成的句柄
    pub fn done() -> MoveStatus {
        Self::finished(Ok(()))
    }

    /// 创建已失败的句柄
    pub fn failed(reason: impl Into<String>) -> MoveStatus {
        Self::finished(Err(StatusError::Failed(reason.into())))
    }

    fn finished(result: StatusResult) -> MoveStatus {
        MoveStatus {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Finished(result)),
                cond: Condvar::new(),
            }),
        }
    }

    /// 聚合多个句柄
    ///
    /// - 空集合：立即成功
    /// - 全部成功：成功
    /// - 任一失败：以第一个失败的错误完成，不再等待其余句柄
    pub fn all(statuses: impl IntoIterator<Item = MoveStatus>) -> MoveStatus {
        let statuses: Vec<MoveStatus> = statuses.into_iter().collect();
        if statuses.is_empty() {
            return MoveStatus::done();
        }

        let (status, completer) = MoveStatus::pending();
        let completer = Arc::new(Mutex::new(Some(completer)));
        let remaining = Arc::new(AtomicUsize::new(statuses.len()));

        for child in &statuses {
            let completer = completer.clone();
            let remaining = remaining.clone();
            child.add_callback(move |result| {
                let finished = match result {
                    Err(_) => true,
                    Ok(()) => remaining.fetch_sub(1, Ordering::AcqRel) == 1,
                };
                if finished {
                    let taken = completer.lock().take();
                    if let Some(completer) = taken {
                        completer.finish(result.clone());
                    }
                }
            });
        }

        status
    }

    /// 是否已完成（成功或失败）
    pub fn is_done(&self) -> bool {
        matches!(*self.shared.state.lock(), State::Finished(_))
    }

    /// 是否已成功完成
    pub fn success(&self) -> bool {
        matches!(*self.shared.state.lock(), State::Finished(Ok(())))
    }

    /// 已完成时返回结果
    pub fn result(&self) -> Option<StatusResult> {
        match &*self.shared.state.lock() {
            State::Finished(result) => Some(result.clone()),
            State::Pending(_) => None,
        }
    }

    /// 等待完成
    ///
    /// # 参数
    ///
    /// - `timeout`: 最长等待时间，`None` 表示一直等待
    ///
    /// # 错误
    ///
    /// - 超时：[`StatusError::Timeout`]（句柄本身保持未完成）
    /// - 运动失败：运动方报告的错误
    pub fn wait(&self, timeout: Option<Duration>) -> StatusResult {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.state.lock();
        loop {
            if let State::Finished(result) = &*state {
                return result.clone();
            }
            match (deadline, timeout) {
                (Some(deadline), Some(timeout)) => {
                    if self.shared.cond.wait_until(&mut state, deadline).timed_out() {
                        if let State::Finished(result) = &*state {
                            return result.clone();
                        }
                        return Err(StatusError::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                        });
                    }
                },
                _ => self.shared.cond.wait(&mut state),
            }
        }
    }

    /// 注册完成回调
    ///
    /// 已完成时回调立即在当前线程执行；否则在完成端所在线程执行。
    /// 回调必须非阻塞。
    pub fn add_callback<F>(&self, callback: F)
    where
        F: FnOnce(&StatusResult) + Send + 'static,
    {
        let result = {
            let mut state = self.shared.state.lock();
            match &mut *state {
                State::Pending(callbacks) => {
                    callbacks.push(Box::new(callback));
                    return;
                },
                State::Finished(result) => result.clone(),
            }
        };
        callback(&result);
    }
}

impl fmt::Debug for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result() {
            None => write!(f, "MoveStatus(pending)"),
            Some(Ok(())) => write!(f, "MoveStatus(done)"),
            Some(Err(e)) => write!(f, "MoveStatus(failed: {})", e),
        }
    }
}

impl StatusCompleter {
    /// 报告结果
    pub fn finish(self, result: StatusResult) {
        self.shared.finish(result);
    }

    /// 报告成功
    pub fn success(self) {
        self.finish(Ok(()));
    }

    /// 报告失败
    pub fn fail(self, reason: impl Into<String>) {
        self.finish(Err(StatusError::Failed(reason.into())));
    }
}

impl Drop for StatusCompleter {
    fn drop(&mut self) {
        // 已完成时 finish 返回 false，不会覆盖结果
        self.shared.finish(Err(StatusError::Abandoned));
    }
}
