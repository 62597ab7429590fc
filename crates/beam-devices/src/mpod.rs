//! MPOD 电源通道
//!
//! 每个通道有电压、电流、温度等读数和一个开关状态。低压（LV）模块的电压
//! 升降速率按通道设置；高压（HV）模块的速率作用于整张卡，PV 位于卡前缀下。

use beam_signal::{HardwareFactory, PvAddress, Signal, SignalError};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 通道开关状态（枚举型 PV 的字符串值）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Off,
    On,
    Reset,
    EmerOff,
    ClrEvnt,
}

impl ChannelState {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelState::Off => "Off",
            ChannelState::On => "On",
            ChannelState::Reset => "Reset",
            ChannelState::EmerOff => "EmerOff",
            ChannelState::ClrEvnt => "ClrEvnt",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 模块类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MpodKind {
    /// 低压模块
    Lv,
    /// 高压模块，携带卡前缀
    Hv { card_prefix: PvAddress },
}

/// MPOD 通道
pub struct MpodChannel {
    name: String,
    prefix: PvAddress,
    kind: MpodKind,
    /// 电压读数 [V]，写入设定电压
    pub voltage: Arc<dyn Signal<f64>>,
    pub max_voltage: Arc<dyn Signal<f64>>,
    pub terminal_voltage: Arc<dyn Signal<f64>>,
    /// 电流读数 [A]，写入设定电流
    pub current: Arc<dyn Signal<f64>>,
    pub max_current: Arc<dyn Signal<f64>>,
    /// 温度 [C]
    pub temperature: Arc<dyn Signal<f64>>,
    pub status_string: Arc<dyn Signal<String>>,
    /// Off/On/Reset/EmerOff/ClrEvnt
    pub state: Arc<dyn Signal<String>>,
    /// 0 表示没有上限
    pub voltage_high_limit: Arc<dyn Signal<f64>>,
    /// [V/s]
    pub voltage_rise_rate: Arc<dyn Signal<f64>>,
    /// [V/s]
    pub voltage_fall_rate: Arc<dyn Signal<f64>>,
}

impl MpodChannel {
    /// 低压通道，例如 `XPP:R39:MPD:CH:0`
    pub fn lv(
        name: impl Into<String>,
        prefix: impl Into<PvAddress>,
        hardware: &dyn HardwareFactory,
    ) -> Result<Self, SignalError> {
        Self::connect(name.into(), prefix.into(), MpodKind::Lv, hardware)
    }

    /// 高压通道，例如 `XPP:R39:MPD:CH:100`，卡前缀 `XPP:R39:MPD:MOD:10`
    pub fn hv(
        name: impl Into<String>,
        prefix: impl Into<PvAddress>,
        card_prefix: impl Into<PvAddress>,
        hardware: &dyn HardwareFactory,
    ) -> Result<Self, SignalError> {
        let kind = MpodKind::Hv {
            card_prefix: card_prefix.into(),
        };
        Self::connect(name.into(), prefix.into(), kind, hardware)
    }

    fn connect(
        name: String,
        prefix: PvAddress,
        kind: MpodKind,
        hardware: &dyn HardwareFactory,
    ) -> Result<Self, SignalError> {
        let pv = |suffix: &str| prefix.with_suffix(suffix);
        let rw = |read: &str, write: &str| -> Result<Arc<dyn Signal<f64>>, SignalError> {
            hardware.float_signal(&pv(read), Some(&pv(write)))
        };
        let ro = |read: &str| hardware.float_signal(&pv(read), None);

        let rate_base = match &kind {
            MpodKind::Lv => &prefix,
            MpodKind::Hv { card_prefix } => card_prefix,
        };
        let rate = |read: &str, write: &str| {
            hardware.float_signal(
                &rate_base.with_suffix(read),
                Some(&rate_base.with_suffix(write)),
            )
        };

        let channel = Self {
            voltage: rw(":GetVoltageMeasurement", ":SetVoltage")?,
            max_voltage: ro(":GetMaxVoltage")?,
            terminal_voltage: ro(":GetTerminalVoltageMeasurement")?,
            current: rw(":GetCurrentMeasurement", ":SetCurrent")?,
            max_current: ro(":GetMaxCurrent")?,
            temperature: ro(":GetTemperature")?,
            status_string: hardware.string_signal(&pv(":GetStatusString"), None)?,
            state: hardware.string_signal(&pv(":GetSwitch"), Some(&pv(":SetSwitch")))?,
            voltage_high_limit: ro(":SetVoltage.DRVH")?,
            voltage_rise_rate: rate(":GetVoltageRiseRate", ":SetVoltageRiseRate")?,
            voltage_fall_rate: rate(":GetVoltageFallRate", ":SetVoltageFallRate")?,
            name,
            prefix,
            kind,
        };
        debug!("{}: connected MPOD channel at {}", channel.name, channel.prefix);
        Ok(channel)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &PvAddress {
        &self.prefix
    }

    pub fn kind(&self) -> &MpodKind {
        &self.kind
    }

    /// 设置开关状态
    pub fn set_state(&self, state: ChannelState) -> Result<(), SignalError> {
        debug!("{}: switch {}", self.name, state);
        self.state.put(state.as_str().to_string(), false)
    }

    pub fn on(&self) -> Result<(), SignalError> {
        self.set_state(ChannelState::On)
    }

    pub fn off(&self) -> Result<(), SignalError> {
        self.set_state(ChannelState::Off)
    }

    pub fn reset(&self) -> Result<(), SignalError> {
        self.set_state(ChannelState::Reset)
    }

    pub fn emer_off(&self) -> Result<(), SignalError> {
        self.set_state(ChannelState::EmerOff)
    }

    /// 清除事件
    pub fn clr_evnt(&self) -> Result<(), SignalError> {
        self.set_state(ChannelState::ClrEvnt)
    }

    /// 设定电压 [V]
    pub fn set_voltage(&self, voltage: f64) -> Result<(), SignalError> {
        self.voltage.put(voltage, false)
    }

    /// 设定电流 [A]
    pub fn set_current(&self, current: f64) -> Result<(), SignalError> {
        self.current.put(current, false)
    }

    /// 电压上升速率 [V/s]
    ///
    /// 高压模块上该值作用于整张卡。
    pub fn set_voltage_rise_rate(&self, rise_rate: f64) -> Result<(), SignalError> {
        self.voltage_rise_rate.put(rise_rate, false)
    }

    /// 电压下降速率 [V/s]
    ///
    /// 高压模块上该值作用于整张卡。
    pub fn set_voltage_fall_rate(&self, fall_rate: f64) -> Result<(), SignalError> {
        self.voltage_fall_rate.put(fall_rate, false)
    }
}

impl fmt::Debug for MpodChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpodChannel")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
