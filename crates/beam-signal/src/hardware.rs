//! 硬件工厂
//!
//! 设备构造时通过 [`HardwareFactory`] 把 PV 地址解析为具体的信号和电机句柄。
//! 连接管理、通道访问等细节由工厂的实现负责。
//!
//! [`SimHardware`] 是仿真实现：按地址创建并缓存 [`SoftSignal`] 和 [`SimMotor`]，
//! 同一地址总是返回同一个对象，测试可以通过地址取回并检查它们。

use crate::address::PvAddress;
use crate::error::SignalError;
use crate::positioner::Positioner;
use crate::signal::{Signal, SoftSignal};
use crate::sim::SimMotor;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// 硬件工厂 Trait
pub trait HardwareFactory: Send + Sync {
    /// 创建（或连接到）一个电机
    fn motor(&self, pv: &PvAddress, egu: &str) -> Result<Arc<dyn Positioner>, SignalError>;

    /// 创建浮点信号
    ///
    /// `write_pv` 为 `None` 时读写使用同一个 PV。
    fn float_signal(
        &self,
        read_pv: &PvAddress,
        write_pv: Option<&PvAddress>,
    ) -> Result<Arc<dyn Signal<f64>>, SignalError>;

    /// 创建字符串信号（枚举型 PV 以字符串访问）
    fn string_signal(
        &self,
        read_pv: &PvAddress,
        write_pv: Option<&PvAddress>,
    ) -> Result<Arc<dyn Signal<String>>, SignalError>;
}

/// 仿真硬件
#[derive(Default)]
pub struct SimHardware {
    travel_time: Duration,
    motors: Mutex<HashMap<PvAddress, Arc<SimMotor>>>,
    floats: Mutex<HashMap<PvAddress, Arc<SoftSignal<f64>>>>,
    strings: Mutex<HashMap<PvAddress, Arc<SoftSignal<String>>>>,
}

impl SimHardware {
    /// 创建瞬时到位的仿真硬件
    pub fn new() -> Self {
        Self::default()
    }

    /// 新建电机使用的运动耗时
    pub fn with_travel_time(mut self, travel_time: Duration) -> Self {
        self.travel_time = travel_time;
        self
    }

    /// 预先放置一个电机（例如设置初始位置或限位）
    pub fn insert_motor(&self, pv: impl Into<PvAddress>, motor: SimMotor) -> Arc<SimMotor> {
        let motor = Arc::new(motor);
        self.motors.lock().insert(pv.into(), motor.clone());
        motor
    }

    /// 按地址取回电机
    pub fn sim_motor(&self, pv: &str) -> Option<Arc<SimMotor>> {
        self.motors.lock().get(&PvAddress::new(pv)).cloned()
    }

    /// 按地址取回浮点信号（读或写 PV 均可）
    pub fn float(&self, pv: &str) -> Option<Arc<SoftSignal<f64>>> {
        self.floats.lock().get(&PvAddress::new(pv)).cloned()
    }

    /// 按地址取回字符串信号（读或写 PV 均可）
    pub fn string(&self, pv: &str) -> Option<Arc<SoftSignal<String>>> {
        self.strings.lock().get(&PvAddress::new(pv)).cloned()
    }

    /// 已创建的电机地址
    pub fn motor_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self
            .motors
            .lock()
            .keys()
            .map(|pv| pv.as_str().to_string())
            .collect();
        addresses.sort();
        addresses
    }

    fn soft_signal<T: Clone + Send + 'static>(
        registry: &Mutex<HashMap<PvAddress, Arc<SoftSignal<T>>>>,
        read_pv: &PvAddress,
        write_pv: Option<&PvAddress>,
        initial: T,
    ) -> Arc<SoftSignal<T>> {
        let mut registry = registry.lock();
        let signal = registry
            .entry(read_pv.clone())
            .or_insert_with(|| {
                trace!("sim signal {} created", read_pv);
                Arc::new(SoftSignal::new(read_pv.as_str(), initial))
            })
            .clone();
        if let Some(write_pv) = write_pv {
            registry.insert(write_pv.clone(), signal.clone());
        }
        signal
    }
}

impl HardwareFactory for SimHardware {
    fn motor(&self, pv: &PvAddress, egu: &str) -> Result<Arc<dyn Positioner>, SignalError> {
        let motor = self
            .motors
            .lock()
            .entry(pv.clone())
            .or_insert_with(|| {
                trace!("sim motor {} created ({})", pv, egu);
                Arc::new(SimMotor::new(pv.as_str(), egu).with_travel_time(self.travel_time))
            })
            .clone();
        Ok(motor)
    }

    fn float_signal(
        &self,
        read_pv: &PvAddress,
        write_pv: Option<&PvAddress>,
    ) -> Result<Arc<dyn Signal<f64>>, SignalError> {
        Ok(Self::soft_signal(&self.floats, read_pv, write_pv, 0.0))
    }

    fn string_signal(
        &self,
        read_pv: &PvAddress,
        write_pv: Option<&PvAddress>,
    ) -> Result<Arc<dyn Signal<String>>, SignalError> {
        Ok(Self::soft_signal(
            &self.strings,
            read_pv,
            write_pv,
            String::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_is_cached_by_address() {
        let hw = SimHardware::new();
        let pv = PvAddress::new("TST:MTR:01");
        let a = hw.motor(&pv, "mm").unwrap();
        a.move_to(2.0).unwrap();
        let b = hw.motor(&pv, "mm").unwrap();
        assert_eq!(b.position().unwrap(), 2.0);
        assert_eq!(hw.motor_addresses(), vec!["TST:MTR:01".to_string()]);
        assert_eq!(hw.sim_motor("TST:MTR:01").unwrap().move_history(), vec![2.0]);
    }

    #[test]
    fn test_inserted_motor_is_used() {
        let hw = SimHardware::new();
        hw.insert_motor("TST:MTR:02", SimMotor::new("TST:MTR:02", "um").with_position(7.0));
        let motor = hw.motor(&PvAddress::new("TST:MTR:02"), "mm").unwrap();
        assert_eq!(motor.position().unwrap(), 7.0);
        assert_eq!(motor.egu(), "um");
    }

    #[test]
    fn test_signal_write_alias() {
        let hw = SimHardware::new();
        let read = PvAddress::new("CH:GetVoltage");
        let write = PvAddress::new("CH:SetVoltage");
        let sig = hw.float_signal(&read, Some(&write)).unwrap();
        sig.put(12.0, false).unwrap();

        assert_eq!(hw.float("CH:GetVoltage").unwrap().value(), 12.0);
        assert_eq!(hw.float("CH:SetVoltage").unwrap().value(), 12.0);
        assert_eq!(sig.name(), "CH:GetVoltage");
    }

    #[test]
    fn test_string_signal() {
        let hw = SimHardware::new();
        let sig = hw
            .string_signal(&PvAddress::new("CH:GetSwitch"), Some(&PvAddress::new("CH:SetSwitch")))
            .unwrap();
        sig.put("On".to_string(), false).unwrap();
        assert_eq!(hw.string("CH:SetSwitch").unwrap().value(), "On");
    }
}
