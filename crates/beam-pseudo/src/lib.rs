//! # Beam Pseudo
//!
//! 伪定位器变换引擎：在伪坐标空间与一个或多个真实坐标空间之间做正/逆映射，
//! 并负责运动编排。
//!
//! ## 模块
//!
//! - `position`: 伪位置 / 真实位置（带名字的有序元组）
//! - `axis`: 伪轴、真实轴与轴集合
//! - `transform`: 坐标变换 Trait
//! - `positioner` / `builder`: 伪定位器及其 Builder
//! - `notepad`: notepad 遥测链路（非阻塞、尽力而为）
//! - `sync_axes`: 同步轴（N 个真实轴 -> 1 个伪轴）
//! - `delay`: 光学延迟线（时间 <-> 距离）
//! - `lookup` / `interp`: 查找表插值
//!
//! ## 快速开始
//!
//! ```rust
//! use beam_pseudo::{PseudoPositionerBuilder, SyncAxes};
//! use beam_signal::{Positioner, SimMotor};
//! use std::sync::Arc;
//!
//! let left: Arc<dyn Positioner> = Arc::new(SimMotor::new("L", "mm").with_position(1.0));
//! let right: Arc<dyn Positioner> = Arc::new(SimMotor::new("R", "mm").with_position(3.0));
//!
//! let sync = PseudoPositionerBuilder::new("parallel", SyncAxes::new())
//!     .real_axis("left", left.clone())
//!     .real_axis("right", right.clone())
//!     .build()
//!     .unwrap();
//!
//! sync.mv(&[5.0], None).unwrap();
//! assert_eq!(left.position().unwrap(), 5.0);
//! assert_eq!(right.position().unwrap(), 7.0);
//! ```

pub mod axis;
pub mod builder;
pub mod delay;
mod error;
pub mod interp;
pub mod lookup;
pub mod notepad;
pub mod position;
pub mod positioner;
pub mod sync_axes;
pub mod transform;

pub use axis::{AxisSet, PseudoAxis, PseudoAxisSpec, RealAxis};
pub use builder::PseudoPositionerBuilder;
pub use delay::DelayStage;
pub use error::{PseudoError, Result};
pub use interp::interp;
pub use lookup::{LookupTable, Table};
pub use notepad::{NotepadChannel, NotepadLink};
pub use position::{AxisNames, Position, PseudoPosition, RealPosition};
pub use positioner::PseudoPositioner;
pub use sync_axes::{Combine, CombineFn, CombineMode, OffsetMap, SyncAxes};
pub use transform::Transform;
