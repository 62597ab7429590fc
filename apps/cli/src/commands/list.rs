//! 设备列表命令

use crate::session::Session;
use anyhow::Result;
use beam_tools::pick_class;
use clap::Args;

/// 设备列表命令参数
#[derive(Args, Debug)]
pub struct ListCommand {
    /// 只列出某条束线的设备
    #[arg(short, long)]
    pub beamline: Option<String>,
}

impl ListCommand {
    pub fn execute(&self, session: &Session) -> Result<()> {
        let db = session.load_database()?;
        let entries: Vec<_> = match &self.beamline {
            Some(beamline) => db.by_beamline(beamline).collect(),
            None => db.devices.iter().collect(),
        };

        for entry in entries {
            println!(
                "{:<20} {:<16} {:<8} {}",
                entry.name,
                pick_class(entry),
                entry.beamline.as_deref().unwrap_or("-"),
                entry.prefix
            );
        }
        Ok(())
    }
}
