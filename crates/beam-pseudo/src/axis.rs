//! 伪轴与真实轴
//!
//! - [`PseudoAxis`]: 伪空间中的一个轴，带 PV 前缀、单位、内部限位和可选的 notepad 信号
//! - [`RealAxis`]: 命名的真实轴句柄
//! - [`AxisSet`]: 一台伪定位器的全部轴，构造后不再变化

use crate::error::{PseudoError, Result};
use crate::position::{AxisNames, RealPosition};
use beam_signal::{Positioner, PvAddress, Signal};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// notepad 设定值 PV 后缀
pub const NOTEPAD_SETPOINT_SUFFIX: &str = ":OphydSetpoint";
/// notepad 读回值 PV 后缀
pub const NOTEPAD_READBACK_SUFFIX: &str = ":OphydReadback";

/// 伪轴配置
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoAxisSpec {
    pub name: String,
    /// 显式前缀；为 `None` 时使用 `"{父前缀}:{name}"`
    pub prefix: Option<PvAddress>,
    pub egu: String,
    /// `(low, high)`，`low >= high` 表示不限位
    pub limits: (f64, f64),
}

impl PseudoAxisSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            egu: String::new(),
            limits: (0.0, 0.0),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<PvAddress>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_egu(mut self, egu: impl Into<String>) -> Self {
        self.egu = egu.into();
        self
    }

    pub fn with_limits(mut self, limits: (f64, f64)) -> Self {
        self.limits = limits;
        self
    }
}

/// 伪轴
pub struct PseudoAxis {
    name: String,
    prefix: PvAddress,
    egu: String,
    limits: RwLock<(f64, f64)>,
    setpoint: Option<Arc<dyn Signal<f64>>>,
    readback: Option<Arc<dyn Signal<f64>>>,
}

impl PseudoAxis {
    /// 按配置创建，前缀在此处一次性解析
    pub fn new(spec: PseudoAxisSpec, parent: &PvAddress) -> Self {
        let prefix = spec.prefix.unwrap_or_else(|| parent.child(&spec.name));
        Self {
            name: spec.name,
            prefix,
            egu: spec.egu,
            limits: RwLock::new(spec.limits),
            setpoint: None,
            readback: None,
        }
    }

    /// 连接 notepad 信号
    pub fn with_notepad(
        mut self,
        setpoint: Arc<dyn Signal<f64>>,
        readback: Arc<dyn Signal<f64>>,
    ) -> Self {
        self.setpoint = Some(setpoint);
        self.readback = Some(readback);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &PvAddress {
        &self.prefix
    }

    pub fn egu(&self) -> &str {
        &self.egu
    }

    /// notepad 设定值 PV
    pub fn setpoint_pv(&self) -> PvAddress {
        self.prefix.with_suffix(NOTEPAD_SETPOINT_SUFFIX)
    }

    /// notepad 读回值 PV
    pub fn readback_pv(&self) -> PvAddress {
        self.prefix.with_suffix(NOTEPAD_READBACK_SUFFIX)
    }

    pub fn setpoint_signal(&self) -> Option<&Arc<dyn Signal<f64>>> {
        self.setpoint.as_ref()
    }

    pub fn readback_signal(&self) -> Option<&Arc<dyn Signal<f64>>> {
        self.readback.as_ref()
    }

    pub fn limits(&self) -> (f64, f64) {
        *self.limits.read()
    }

    pub fn set_limits(&self, limits: (f64, f64)) {
        *self.limits.write() = limits;
    }

    /// 检查目标是否在限位内（`low < high` 时生效）
    pub fn check_value(&self, value: f64) -> Result<()> {
        let (low, high) = self.limits();
        if low < high && !(low..=high).contains(&value) {
            return Err(PseudoError::LimitExceeded {
                axis: self.name.clone(),
                value,
                low,
                high,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for PseudoAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PseudoAxis")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("egu", &self.egu)
            .field("limits", &self.limits())
            .field("notepad", &self.setpoint.is_some())
            .finish()
    }
}

/// 真实轴
#[derive(Clone)]
pub struct RealAxis {
    name: String,
    positioner: Arc<dyn Positioner>,
}

impl RealAxis {
    pub fn new(name: impl Into<String>, positioner: Arc<dyn Positioner>) -> Self {
        Self {
            name: name.into(),
            positioner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positioner(&self) -> &Arc<dyn Positioner> {
        &self.positioner
    }
}

impl fmt::Debug for RealAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealAxis")
            .field("name", &self.name)
            .field("positioner", &self.positioner.name())
            .finish()
    }
}

/// 伪定位器的全部轴
#[derive(Debug)]
pub struct AxisSet {
    pseudo: Vec<PseudoAxis>,
    real: Vec<RealAxis>,
    pseudo_names: AxisNames,
    real_names: AxisNames,
}

impl AxisSet {
    /// 创建轴集合
    ///
    /// 同一空间内的轴名不能重复。
    pub fn new(pseudo: Vec<PseudoAxis>, real: Vec<RealAxis>) -> Result<Self> {
        check_unique(pseudo.iter().map(PseudoAxis::name))?;
        check_unique(real.iter().map(RealAxis::name))?;
        let pseudo_names = AxisNames::new(pseudo.iter().map(PseudoAxis::name));
        let real_names = AxisNames::new(real.iter().map(RealAxis::name));
        Ok(Self {
            pseudo,
            real,
            pseudo_names,
            real_names,
        })
    }

    pub fn pseudo_axes(&self) -> &[PseudoAxis] {
        &self.pseudo
    }

    pub fn real_axes(&self) -> &[RealAxis] {
        &self.real
    }

    pub fn pseudo_names(&self) -> &AxisNames {
        &self.pseudo_names
    }

    pub fn real_names(&self) -> &AxisNames {
        &self.real_names
    }

    pub fn pseudo(&self, name: &str) -> Option<&PseudoAxis> {
        self.pseudo.iter().find(|axis| axis.name() == name)
    }

    pub fn real(&self, name: &str) -> Option<&RealAxis> {
        self.real.iter().find(|axis| axis.name() == name)
    }

    /// 读取所有真实轴的当前位置
    pub fn real_position(&self) -> Result<RealPosition> {
        let values = self
            .real
            .iter()
            .map(|axis| axis.positioner.position())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        RealPosition::new(&self.real_names, values)
    }
}

fn check_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PseudoError::InvalidParameter {
                param: "axes",
                reason: format!("duplicate axis name '{}'", name),
            });
        }
    }
    Ok(())
}
