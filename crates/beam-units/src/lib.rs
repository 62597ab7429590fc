//! # Beam Units
//!
//! 束线轴的物理单位（无硬件依赖）
//!
//! ## 模块
//!
//! - `unit`: 时间/长度单位枚举与换算
//! - `quantity`: `Seconds` / `Meters` 强类型数值
//! - `error`: 单位解析与换算错误
//!
//! ## 示例
//!
//! ```rust
//! use beam_units::{convert_unit, SPEED_OF_LIGHT};
//!
//! // 1 ns 的光程（米）
//! let meters = convert_unit(1.0, "ns", "s").unwrap() * SPEED_OF_LIGHT;
//! let mm = convert_unit(meters, "m", "mm").unwrap();
//! assert!((mm - 299.792458).abs() < 1e-9);
//!
//! // 量纲不同的单位不能互换
//! assert!(convert_unit(1.0, "s", "m").is_err());
//! ```

pub mod error;
pub mod quantity;
pub mod unit;

// 重新导出常用类型
pub use error::UnitError;
pub use quantity::{Meters, Seconds};
pub use unit::{Dimension, Unit, convert_unit};

/// 真空中的光速（m/s，精确值）
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
