//! 信号（Signal）抽象
//!
//! 一个信号对应控制系统中的一个通道（读 PV 和可选的写 PV）。
//! 伪轴引擎只依赖下列能力：连接状态、写权限、读取（可使用监视缓存）、
//! 以及不等待完成的写入。

use crate::error::SignalError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 信号 Trait
///
/// # 线程安全
///
/// 实现必须是 `Send + Sync`，内部状态使用内部可变性。
pub trait Signal<T>: Send + Sync {
    /// 信号名称（通常是 PV 地址）
    fn name(&self) -> &str;

    /// 是否已连接
    fn connected(&self) -> bool;

    /// 是否有写权限
    fn write_access(&self) -> bool;

    /// 读取当前值
    ///
    /// `use_monitor` 为 `true` 时允许返回监视缓存中的最近值，而不发起新的读请求。
    fn get(&self, use_monitor: bool) -> Result<T, SignalError>;

    /// 写入新值
    ///
    /// `wait` 为 `false` 时只发出请求，不等待对端处理完成。
    fn put(&self, value: T, wait: bool) -> Result<(), SignalError>;
}

/// 内存信号
///
/// 无硬件依赖的信号实现，连接状态、写权限和写入失败都可以在运行时切换，
/// 用于仿真和测试。
pub struct SoftSignal<T> {
    name: String,
    value: Mutex<T>,
    connected: AtomicBool,
    write_access: AtomicBool,
    fail_puts: AtomicBool,
    put_count: AtomicU64,
}

impl<T: Clone + Send> SoftSignal<T> {
    /// 创建已连接、可写的信号
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        Self {
            name: name.into(),
            value: Mutex::new(initial),
            connected: AtomicBool::new(true),
            write_access: AtomicBool::new(true),
            fail_puts: AtomicBool::new(false),
            put_count: AtomicU64::new(0),
        }
    }

    /// 设置连接状态
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// 设置写权限
    pub fn set_write_access(&self, write_access: bool) {
        self.write_access.store(write_access, Ordering::Relaxed);
    }

    /// 让后续写入返回 I/O 错误
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::Relaxed);
    }

    /// 成功写入的次数
    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::Relaxed)
    }

    /// 直接读取内部值（不检查连接状态）
    pub fn value(&self) -> T {
        self.value.lock().clone()
    }

    /// 模拟对端更新（不计入写入次数）
    pub fn sim_set(&self, value: T) {
        *self.value.lock() = value;
    }
}

impl<T: Clone + Send> Signal<T> for SoftSignal<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn write_access(&self) -> bool {
        self.write_access.load(Ordering::Relaxed)
    }

    fn get(&self, _use_monitor: bool) -> Result<T, SignalError> {
        if !self.connected() {
            return Err(SignalError::Disconnected(self.name.clone()));
        }
        Ok(self.value.lock().clone())
    }

    fn put(&self, value: T, _wait: bool) -> Result<(), SignalError> {
        if !self.connected() {
            return Err(SignalError::Disconnected(self.name.clone()));
        }
        if !self.write_access() {
            return Err(SignalError::ReadOnly(self.name.clone()));
        }
        if self.fail_puts.load(Ordering::Relaxed) {
            return Err(SignalError::io(&self.name, "put rejected"));
        }
        *self.value.lock() = value;
        self.put_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
