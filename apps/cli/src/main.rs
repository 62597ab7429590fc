//! # Beam CLI
//!
//! 束线伪定位器命令行工具。所有设备在仿真硬件上运行。
//!
//! ```bash
//! # 配置默认设备数据库
//! beam-cli config set --database /etc/beam/devices.toml
//!
//! # 列出设备、查询位置、移动
//! beam-cli list --beamline XPP
//! beam-cli wm las_delay
//! beam-cli mv las_delay 1.5 --timeout-ms 2000
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod session;

use commands::{ConfigCommand, ListCommand, MvCommand, WmCommand};
use session::Session;

/// Beam CLI - 束线伪定位器命令行工具
#[derive(Parser, Debug)]
#[command(name = "beam-cli")]
#[command(about = "Command-line interface for beamline pseudo positioners", long_about = None)]
#[command(version)]
struct Cli {
    /// 设备数据库（覆盖配置）
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// 配置文件路径（默认位于用户配置目录）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 列出数据库中的设备
    List {
        #[command(flatten)]
        args: ListCommand,
    },

    /// 查询设备当前位置
    Wm {
        #[command(flatten)]
        args: WmCommand,
    },

    /// 移动设备
    Mv {
        #[command(flatten)]
        args: MvCommand,
    },
}

fn main() -> Result<()> {
    beam_devices::logging::init("beam_cli=info");

    let cli = Cli::parse();
    let session = Session::new(cli.config, cli.database)?;

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&session),
        Commands::List { args } => args.execute(&session),
        Commands::Wm { args } => args.execute(&session),
        Commands::Mv { args } => args.execute(&session),
    }
}
