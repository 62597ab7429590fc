//! # 设备数据库
//!
//! 以 TOML 描述束线上的设备。每个 `[[device]]` 条目包含名称、PV 前缀、
//! 可选的束线名，以及由 `class` 字段选择的设备类型和类型参数。
//!
//! ```toml
//! [[device]]
//! name = "las_delay"
//! prefix = "LAS:DLY"
//! beamline = "LAS"
//! notepad = true
//! class = "DelayStage"
//! egu = "ps"
//! n_bounces = 2
//! motor = { source = "motor", suffix = ":MMS:01", egu = "mm" }
//! ```
//!
//! 真实轴可以是仿真电机（`source = "sim"`，默认）或按 `prefix + suffix`
//! 寻址的硬件电机（`source = "motor"`）。

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 设备数据库
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDatabase {
    #[serde(rename = "device", default)]
    pub devices: Vec<DeviceEntry>,
}

impl DeviceDatabase {
    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading device database from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let mut db = Self::from_toml_str(&content)?;

        // 表格文件路径相对于数据库文件所在目录
        if let Some(base) = path.parent() {
            db.resolve_table_paths(base);
        }
        Ok(db)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let db: Self = toml::from_str(content)?;
        db.validate()?;
        debug!("Device database has {} entries", db.devices.len());
        Ok(db)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?).map_err(|e| ConfigError::io(path, e))
    }

    /// 检查名称唯一且条目完整
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.devices {
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateDevice(entry.name.clone()));
            }
            entry.validate()?;
        }
        Ok(())
    }

    /// 按名称查找
    pub fn find(&self, name: &str) -> Option<&DeviceEntry> {
        self.devices.iter().find(|entry| entry.name == name)
    }

    /// 某条束线上的设备（束线名不区分大小写）
    pub fn by_beamline<'a>(&'a self, beamline: &'a str) -> impl Iterator<Item = &'a DeviceEntry> {
        self.devices.iter().filter(move |entry| {
            entry
                .beamline
                .as_deref()
                .is_some_and(|b| b.eq_ignore_ascii_case(beamline))
        })
    }

    /// 所有设备名（按数据库顺序）
    pub fn names(&self) -> Vec<&str> {
        self.devices.iter().map(|entry| entry.name.as_str()).collect()
    }

    fn resolve_table_paths(&mut self, base: &Path) {
        for entry in &mut self.devices {
            if let DeviceKind::LookupTable {
                table: TableSource::File(path),
                ..
            } = &mut entry.kind
            {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }
}

/// 数据库条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beamline: Option<String>,
    /// 是否为伪轴连接 notepad 信号
    #[serde(default)]
    pub notepad: bool,
    #[serde(flatten)]
    pub kind: DeviceKind,
}

impl DeviceEntry {
    /// 提取条目信息
    ///
    /// 返回所有字段（包含 `class`）组成的字典。`info_map` 按
    /// `条目字段名 -> 构造参数名` 重命名；不存在的字段被忽略。
    pub fn info(
        &self,
        info_map: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, toml::Value>, ConfigError> {
        let mut info = match toml::Value::try_from(self)? {
            toml::Value::Table(table) => table.into_iter().collect::<BTreeMap<_, _>>(),
            other => {
                return Err(ConfigError::invalid(
                    &self.name,
                    format!("entry serialized to {} instead of a table", other.type_str()),
                ));
            },
        };
        debug!("Extracted info dictionary for {}: {:?}", self.name, info);

        for (from, to) in info_map {
            if let Some(value) = info.remove(from) {
                info.insert(to.clone(), value);
            }
        }
        Ok(info)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid(&self.name, "device name is empty"));
        }
        match &self.kind {
            DeviceKind::SyncAxes { axes, .. } => {
                if let Some(axis) = axes.iter().find(|a| a.name.is_empty()) {
                    return Err(ConfigError::invalid(
                        &self.name,
                        format!("axis with suffix {:?} has no name", axis.suffix),
                    ));
                }
            },
            DeviceKind::LookupTable {
                pseudo,
                real,
                column_names,
                ..
            } => {
                if pseudo.is_empty() || real.name.is_empty() {
                    return Err(ConfigError::invalid(
                        &self.name,
                        "lookup table needs named pseudo and real axes",
                    ));
                }
                if column_names.is_empty() {
                    return Err(ConfigError::invalid(&self.name, "column_names is empty"));
                }
            },
            DeviceKind::DelayStage { .. } | DeviceKind::MpodChannel { .. } => {},
        }
        for axis in self.kind.axes() {
            if axis.source == AxisSource::Motor && axis.suffix.is_none() {
                return Err(ConfigError::invalid(
                    &self.name,
                    format!("hardware motor '{}' needs a suffix", axis.name),
                ));
            }
        }
        Ok(())
    }
}

/// 设备类型（由 `class` 字段选择）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum DeviceKind {
    /// 同步轴
    SyncAxes {
        axes: Vec<AxisConfig>,
        #[serde(default)]
        combine: CombineKind,
    },

    /// 光学延迟线
    DelayStage {
        #[serde(default = "default_delay_egu")]
        egu: String,
        #[serde(default = "default_n_bounces")]
        n_bounces: u32,
        motor: AxisConfig,
    },

    /// 查找表
    LookupTable {
        /// 伪轴名称
        pseudo: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        pseudo_egu: String,
        real: AxisConfig,
        column_names: Vec<String>,
        table: TableSource,
    },

    /// MPOD 电源通道
    MpodChannel {
        /// 高压模块的卡前缀（低压模块没有）
        #[serde(default, skip_serializing_if = "Option::is_none")]
        card_prefix: Option<String>,
    },
}

fn default_delay_egu() -> String {
    "s".to_string()
}

fn default_n_bounces() -> u32 {
    2
}

impl DeviceKind {
    /// 数据库中的类名
    pub fn class_name(&self) -> &'static str {
        match self {
            DeviceKind::SyncAxes { .. } => "SyncAxes",
            DeviceKind::DelayStage { .. } => "DelayStage",
            DeviceKind::LookupTable { .. } => "LookupTable",
            DeviceKind::MpodChannel { .. } => "MpodChannel",
        }
    }

    /// 条目中配置的所有真实轴
    pub fn axes(&self) -> Vec<&AxisConfig> {
        match self {
            DeviceKind::SyncAxes { axes, .. } => axes.iter().collect(),
            DeviceKind::DelayStage { motor, .. } => vec![motor],
            DeviceKind::LookupTable { real, .. } => vec![real],
            DeviceKind::MpodChannel { .. } => Vec::new(),
        }
    }
}

/// 真实轴配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// 轴名（延迟线的轴固定为 `motor`，可省略）
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: AxisSource,
    /// PV 后缀，拼接在设备前缀之后
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default = "default_axis_egu")]
    pub egu: String,
    /// 仿真电机的初始位置
    #[serde(default)]
    pub position: f64,
    /// 仿真电机的软限位
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<(f64, f64)>,
}

fn default_axis_egu() -> String {
    "mm".to_string()
}

impl AxisConfig {
    /// 仿真轴
    pub fn sim(name: impl Into<String>, egu: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: AxisSource::Sim,
            suffix: None,
            egu: egu.into(),
            position: 0.0,
            limits: None,
        }
    }

    /// 轴的 PV 地址
    ///
    /// 有后缀时为 `prefix + suffix`，否则为 `prefix:name`。
    pub fn address(&self, device_prefix: &str) -> String {
        self.address_or(device_prefix, "")
    }

    /// 轴的 PV 地址，轴名为空时用 `default_name` 代替
    pub fn address_or(&self, device_prefix: &str, default_name: &str) -> String {
        let name = if self.name.is_empty() { default_name } else { self.name.as_str() };
        match &self.suffix {
            Some(suffix) => format!("{}{}", device_prefix, suffix),
            None if device_prefix.is_empty() => name.to_string(),
            None => format!("{}:{}", device_prefix, name),
        }
    }
}

/// 真实轴来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSource {
    /// 进程内仿真电机
    #[default]
    Sim,
    /// 通过硬件工厂连接的电机
    Motor,
}

/// 查找表数据来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableSource {
    /// 直接写在数据库里的行
    #[serde(rename = "rows")]
    Inline(Vec<Vec<f64>>),
    /// 表格文件（见 [`read_table`](crate::read_table)）
    #[serde(rename = "file")]
    File(PathBuf),
}

/// 同步轴的组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineKind {
    #[default]
    First,
    Min,
    Max,
    Mean,
}

/// 选择设备类
///
/// 数据库中的类名可以按条目信息细化：带 `card_prefix` 的 MPOD 通道是高压模块。
pub fn pick_class(entry: &DeviceEntry) -> &'static str {
    match &entry.kind {
        DeviceKind::MpodChannel {
            card_prefix: Some(_),
        } => "MpodChannelHv",
        kind => kind.class_name(),
    }
}
