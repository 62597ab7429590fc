//! 位置查询命令

use crate::session::Session;
use anyhow::Result;
use clap::Args;

/// 位置查询命令参数
#[derive(Args, Debug)]
pub struct WmCommand {
    /// 设备名称
    pub device: String,
}

impl WmCommand {
    pub fn execute(&self, session: &Session) -> Result<()> {
        let device = session.device(&self.device)?;
        println!("{}: {}", device.name(), device.wm()?);
        Ok(())
    }
}
