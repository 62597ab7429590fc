//! 命令定义和实现

pub mod config;
pub mod list;
pub mod mv;
pub mod wm;

pub use config::ConfigCommand;
pub use list::ListCommand;
pub use mv::MvCommand;
pub use wm::WmCommand;
