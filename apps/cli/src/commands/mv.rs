//! 移动命令

use crate::session::Session;
use anyhow::Result;
use clap::Args;
use std::time::Duration;
use tracing::info;

/// 移动命令参数
#[derive(Args, Debug)]
pub struct MvCommand {
    /// 设备名称
    pub device: String,

    /// 目标伪位置（每个伪轴一个值）
    #[arg(required = true, allow_negative_numbers = true)]
    pub values: Vec<f64>,

    /// 等待超时（毫秒）
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// 发出移动后立即返回
    #[arg(long)]
    pub no_wait: bool,
}

impl MvCommand {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn execute(&self, session: &Session) -> Result<()> {
        let device = session.device(&self.device)?;
        info!("Moving {} to {:?}", device.name(), self.values);

        if self.no_wait {
            let status = device.start_move(&self.values)?;
            println!("{}: move started ({:?})", device.name(), status);
        } else {
            let reading = device.mv(&self.values, self.timeout())?;
            println!("{}: {}", device.name(), reading);
        }
        Ok(())
    }
}
