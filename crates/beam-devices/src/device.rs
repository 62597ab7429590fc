//! 按数据库条目构造设备

use crate::error::DeviceError;
use crate::mpod::MpodChannel;
use beam_pseudo::delay::DELAY_MOTOR_AXIS;
use beam_pseudo::{
    CombineMode, DelayStage, LookupTable, PseudoAxisSpec, PseudoPosition, PseudoPositioner,
    PseudoPositionerBuilder, SyncAxes, Table, Transform,
};
use beam_signal::{HardwareFactory, MoveStatus, Positioner, PvAddress, Signal, SimMotor};
use beam_tools::{
    AxisConfig, AxisSource, CombineKind, DeviceEntry, DeviceKind, TableSource, pick_class,
    read_table,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 设备读数：`(字段名, 值)` 列表
#[derive(Debug, Clone, PartialEq)]
pub struct Reading(pub Vec<(String, f64)>);

impl Reading {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|(_, v)| *v).collect()
    }
}

impl From<&PseudoPosition> for Reading {
    fn from(position: &PseudoPosition) -> Self {
        Reading(position.iter().map(|(n, v)| (n.to_string(), v)).collect())
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// 已构造的设备
pub enum Device {
    Sync(PseudoPositioner<SyncAxes>),
    Delay(PseudoPositioner<DelayStage>),
    Lookup(PseudoPositioner<LookupTable>),
    Mpod(MpodChannel),
}

impl Device {
    pub fn name(&self) -> &str {
        match self {
            Device::Sync(p) => p.name(),
            Device::Delay(p) => p.name(),
            Device::Lookup(p) => p.name(),
            Device::Mpod(ch) => ch.name(),
        }
    }

    /// 设备类名
    pub fn class_name(&self) -> &'static str {
        match self {
            Device::Sync(_) => "SyncAxes",
            Device::Delay(_) => "DelayStage",
            Device::Lookup(_) => "LookupTable",
            Device::Mpod(ch) => match ch.kind() {
                crate::mpod::MpodKind::Lv => "MpodChannel",
                crate::mpod::MpodKind::Hv { .. } => "MpodChannelHv",
            },
        }
    }

    /// 阻塞移动
    ///
    /// 伪定位器移动到给定的伪位置；MPOD 通道写入设定电压。
    pub fn mv(&self, values: &[f64], timeout: Option<Duration>) -> Result<Reading, DeviceError> {
        match self {
            Device::Sync(p) => Ok(Reading::from(&p.mv(values, timeout)?)),
            Device::Delay(p) => Ok(Reading::from(&p.mv(values, timeout)?)),
            Device::Lookup(p) => Ok(Reading::from(&p.mv(values, timeout)?)),
            Device::Mpod(ch) => {
                ch.set_voltage(single_value(ch.name(), values)?)?;
                self.wm()
            },
        }
    }

    /// 发出移动但不等待完成
    pub fn start_move(&self, values: &[f64]) -> Result<MoveStatus, DeviceError> {
        fn start<T: Transform + 'static>(
            p: &PseudoPositioner<T>,
            values: &[f64],
        ) -> Result<MoveStatus, DeviceError> {
            let target = p.make_position(values.iter().copied())?;
            Ok(p.move_to(&target, false, None)?)
        }
        match self {
            Device::Sync(p) => start(p, values),
            Device::Delay(p) => start(p, values),
            Device::Lookup(p) => start(p, values),
            Device::Mpod(ch) => {
                ch.set_voltage(single_value(ch.name(), values)?)?;
                Ok(MoveStatus::done())
            },
        }
    }

    /// 当前读数（where motor）
    pub fn wm(&self) -> Result<Reading, DeviceError> {
        match self {
            Device::Sync(p) => Ok(Reading::from(&p.wm()?)),
            Device::Delay(p) => Ok(Reading::from(&p.wm()?)),
            Device::Lookup(p) => Ok(Reading::from(&p.wm()?)),
            Device::Mpod(ch) => Ok(Reading(vec![
                ("voltage".to_string(), ch.voltage.get(true)?),
                ("current".to_string(), ch.current.get(true)?),
            ])),
        }
    }

    /// 一行描述
    pub fn describe(&self) -> String {
        fn axes<T: Transform + 'static>(p: &PseudoPositioner<T>) -> String {
            format!("pseudo {} real {}", p.pseudo_names(), p.real_names())
        }
        let detail = match self {
            Device::Sync(p) => axes(p),
            Device::Delay(p) => format!(
                "{} n_bounces={} {}",
                axes(p),
                p.transform().n_bounces(),
                p.transform().egu().symbol()
            ),
            Device::Lookup(p) => axes(p),
            Device::Mpod(ch) => format!("prefix {}", ch.prefix()),
        };
        format!("{} ({}): {}", self.name(), self.class_name(), detail)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name())
            .field("class", &self.class_name())
            .finish()
    }
}

fn single_value(device: &str, values: &[f64]) -> Result<f64, DeviceError> {
    match values {
        [value] => Ok(*value),
        _ => Err(DeviceError::Pseudo(beam_pseudo::PseudoError::InvalidPosition {
            space: "pseudo",
            reason: format!("{} takes exactly one value, got {}", device, values.len()),
        })),
    }
}

/// 按数据库条目构造设备
///
/// `source = "sim"` 的轴直接创建仿真电机，`source = "motor"` 的轴通过
/// `hardware` 连接。条目开启 notepad 时，伪轴的 notepad 信号也由 `hardware` 创建。
pub fn construct_device(
    entry: &DeviceEntry,
    hardware: &Arc<dyn HardwareFactory>,
) -> Result<Device, DeviceError> {
    let class = pick_class(entry);
    debug!("Constructing {} as {}", entry.name, class);

    let device = match &entry.kind {
        DeviceKind::SyncAxes { axes, combine } => {
            let mode = match combine {
                CombineKind::First => CombineMode::First,
                CombineKind::Min => CombineMode::Min,
                CombineKind::Max => CombineMode::Max,
                CombineKind::Mean => CombineMode::Mean,
            };
            let mut builder = builder(entry, SyncAxes::with_mode(mode), hardware);
            for axis in axes {
                builder = builder.real_axis(&axis.name, real_positioner(entry, axis, "", hardware)?);
            }
            Device::Sync(builder.build()?)
        },

        DeviceKind::DelayStage {
            egu,
            n_bounces,
            motor,
        } => {
            let stage = DelayStage::from_egu(egu, *n_bounces)?;
            let positioner = real_positioner(entry, motor, DELAY_MOTOR_AXIS, hardware)?;
            Device::Delay(
                builder(entry, stage, hardware)
                    .real_axis(DELAY_MOTOR_AXIS, positioner)
                    .build()?,
            )
        },

        DeviceKind::LookupTable {
            pseudo,
            pseudo_egu,
            real,
            column_names,
            table,
        } => {
            let rows = match table {
                TableSource::Inline(rows) => rows.clone(),
                TableSource::File(path) => read_table(path).map_err(|e| DeviceError::Table {
                    device: entry.name.clone(),
                    reason: format!("{:#}", e),
                })?,
            };
            let lut = LookupTable::new(Table::from_rows(&rows)?, column_names.iter().cloned());
            let spec = PseudoAxisSpec::new(pseudo.as_str()).with_egu(pseudo_egu.as_str());
            let positioner = real_positioner(entry, real, "", hardware)?;
            Device::Lookup(
                builder(entry, lut, hardware)
                    .pseudo_axis(spec)
                    .real_axis(&real.name, positioner)
                    .build()?,
            )
        },

        DeviceKind::MpodChannel { card_prefix } => match card_prefix {
            Some(card) => Device::Mpod(MpodChannel::hv(
                &entry.name,
                entry.prefix.as_str(),
                card.as_str(),
                hardware.as_ref(),
            )?),
            None => Device::Mpod(MpodChannel::lv(
                &entry.name,
                entry.prefix.as_str(),
                hardware.as_ref(),
            )?),
        },
    };

    info!("{} ready", device.describe());
    Ok(device)
}

fn builder<T: Transform + 'static>(
    entry: &DeviceEntry,
    transform: T,
    hardware: &Arc<dyn HardwareFactory>,
) -> PseudoPositionerBuilder<T> {
    let builder = PseudoPositionerBuilder::new(&entry.name, transform).prefix(entry.prefix.as_str());
    if entry.notepad {
        builder.notepad(hardware.clone())
    } else {
        builder
    }
}

/// 构造真实轴；轴名为空时地址使用 `default_name`
fn real_positioner(
    entry: &DeviceEntry,
    axis: &AxisConfig,
    default_name: &str,
    hardware: &Arc<dyn HardwareFactory>,
) -> Result<Arc<dyn Positioner>, DeviceError> {
    let pv = PvAddress::new(axis.address_or(&entry.prefix, default_name));
    match axis.source {
        AxisSource::Sim => {
            let mut motor = SimMotor::new(pv.as_str(), axis.egu.as_str()).with_position(axis.position);
            if let Some(limits) = axis.limits {
                motor = motor.with_limits(limits);
            }
            Ok(Arc::new(motor))
        },
        AxisSource::Motor => Ok(hardware.motor(&pv, &axis.egu)?),
    }
}
