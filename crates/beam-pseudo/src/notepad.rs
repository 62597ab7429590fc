//! Notepad 遥测链路
//!
//! 把最近一次的伪设定值和伪读回值镜像到 notepad PV 上，供其他客户端查看。
//!
//! # 设计
//!
//! - **非阻塞**: 运动路径只做 `try_send`，写入在后台线程完成
//! - **Bounded Queue**: 队列满时丢弃并计数，而不是阻塞运动
//! - **尽力而为**: 写入失败只记 debug 日志并计数，从不向调用方传播
//!
//! 后台线程对每个信号依次检查：已连接、有写权限、当前值（允许使用监视缓存）
//! 与新值不同，满足条件时发出不等待完成的写入。

use crate::axis::PseudoAxis;
use crate::error::{PseudoError, Result};
use crate::position::PseudoPosition;
use beam_signal::{Signal, SignalError};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// 默认队列容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// 写入哪一组 notepad 信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotepadChannel {
    /// 最近一次命令的伪位置
    Setpoint,
    /// 最近一次读回的伪位置
    Readback,
}

enum Message {
    Write {
        signal: Arc<dyn Signal<f64>>,
        value: f64,
    },
    Flush(Sender<()>),
}

#[derive(Default)]
struct Counters {
    written: AtomicU64,
    skipped: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

/// Notepad 链路
pub struct NotepadLink {
    tx: Option<Sender<Message>>,
    worker: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl NotepadLink {
    /// 以默认容量启动后台线程
    pub fn start() -> Result<Self> {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// 以指定容量启动后台线程
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let (tx, rx) = bounded(capacity.max(1));
        let counters = Arc::new(Counters::default());
        let worker_counters = counters.clone();
        let worker = thread::Builder::new()
            .name("notepad".to_string())
            .spawn(move || run_worker(rx, worker_counters))
            .map_err(|e| PseudoError::Signal(SignalError::io("notepad", e.to_string())))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            counters,
        })
    }

    /// 推送一个伪位置
    ///
    /// 只处理带 notepad 信号的伪轴，从不阻塞、从不失败。
    pub fn push(&self, axes: &[PseudoAxis], position: &PseudoPosition, channel: NotepadChannel) {
        let Some(tx) = &self.tx else {
            return;
        };
        for axis in axes {
            let signal = match channel {
                NotepadChannel::Setpoint => axis.setpoint_signal(),
                NotepadChannel::Readback => axis.readback_signal(),
            };
            let (Some(signal), Some(value)) = (signal, position.get(axis.name())) else {
                continue;
            };
            let message = Message::Write {
                signal: signal.clone(),
                value,
            };
            match tx.try_send(message) {
                Ok(()) => {},
                Err(TrySendError::Full(_)) => {
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!("Notepad queue full, dropped update of {} to {}", signal.name(), value);
                },
                Err(TrySendError::Disconnected(_)) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    debug!("Notepad worker gone, cannot update {}", signal.name());
                },
            }
        }
    }

    /// 等待队列中已有的写入处理完毕
    ///
    /// 超时返回 `false`。
    pub fn flush(&self, timeout: Duration) -> bool {
        let Some(tx) = &self.tx else {
            return true;
        };
        let deadline = Instant::now() + timeout;
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send_deadline(Message::Flush(ack_tx), deadline).is_err() {
            return false;
        }
        ack_rx.recv_deadline(deadline).is_ok()
    }

    /// 成功写入的次数
    pub fn written(&self) -> u64 {
        self.counters.written.load(Ordering::Relaxed)
    }

    /// 因未连接、无写权限或值未变化而跳过的次数
    pub fn skipped(&self) -> u64 {
        self.counters.skipped.load(Ordering::Relaxed)
    }

    /// 队列满而丢弃的次数
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    /// 读写出错的次数
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }
}

impl Drop for NotepadLink {
    fn drop(&mut self) {
        // 关闭发送端让后台线程退出
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(rx: Receiver<Message>, counters: Arc<Counters>) {
    for message in rx.iter() {
        match message {
            Message::Write { signal, value } => write_one(signal.as_ref(), value, &counters),
            Message::Flush(ack) => {
                let _ = ack.send(());
            },
        }
    }
    trace!("notepad worker exiting");
}

fn write_one(signal: &dyn Signal<f64>, value: f64, counters: &Counters) {
    if !signal.connected() || !signal.write_access() {
        counters.skipped.fetch_add(1, Ordering::Relaxed);
        return;
    }
    let result = signal.get(true).and_then(|current| {
        if current == value {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            Ok(())
        } else {
            signal.put(value, false).map(|()| {
                counters.written.fetch_add(1, Ordering::Relaxed);
            })
        }
    });
    if let Err(e) = result {
        counters.failed.fetch_add(1, Ordering::Relaxed);
        debug!("Failed to update notepad {} to position {}: {}", signal.name(), value, e);
    }
}
