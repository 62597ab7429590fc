//! 配置管理命令
//!
//! 用于管理 CLI 配置（默认设备数据库）

use crate::session::Session;
use anyhow::{Context, Result};
use beam_devices::DeviceRegistry;
use beam_tools::DeviceDatabase;
use clap::Subcommand;
use std::path::PathBuf;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项（`config set --database <PATH>`）
    Set,

    /// 获取配置项
    Get {
        /// 配置项名称
        #[arg(default_value = "all")]
        key: String,
    },

    /// 检查配置：数据库可加载且所有设备可构造
    Check,
}

impl ConfigCommand {
    pub fn execute(self, session: &Session) -> Result<()> {
        match self {
            ConfigCommand::Set => Self::set_(session, session.database_override().cloned()),
            ConfigCommand::Get { key } => Self::get_(session, &key),
            ConfigCommand::Check => Self::check_(session),
        }
    }

    fn set_(session: &Session, database: Option<PathBuf>) -> Result<()> {
        let Some(path) = database else {
            anyhow::bail!("没有要设置的配置项（使用 --database <PATH>）");
        };
        let mut config = session.load_config()?;

        // 先确认能加载
        DeviceDatabase::load(&path)
            .with_context(|| format!("无法加载设备数据库: {}", path.display()))?;
        let path = path.canonicalize().unwrap_or(path);
        println!("✅ 设置设备数据库: {}", path.display());
        config.database = Some(path);

        config.save_to(session.config_path())?;
        Ok(())
    }

    fn get_(session: &Session, key: &str) -> Result<()> {
        let config = session.load_config()?;

        match key {
            "database" => match &config.database {
                Some(path) => println!("{}", path.display()),
                None => println!("(未设置)"),
            },

            _ => {
                println!("Beam CLI 配置 ({}):", session.config_path().display());
                println!("  数据库: {:?}", config.database);
            },
        }
        Ok(())
    }

    fn check_(session: &Session) -> Result<()> {
        let path = session.database_path()?;
        let db = session.load_database()?;
        println!("✅ 设备数据库: {} ({} 个设备)", path.display(), db.devices.len());

        let registry = DeviceRegistry::from_database(&db, session.hardware());
        for device in registry.iter() {
            println!("  ✅ {}", device.describe());
        }
        for (name, reason) in registry.failed() {
            println!("  ❌ {}: {}", name, reason);
        }

        if !registry.failed().is_empty() {
            anyhow::bail!("{} 个设备无法构造", registry.failed().len());
        }
        Ok(())
    }
}
