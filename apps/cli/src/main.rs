//! # DXL Arm CLI
//!
//! Command-line interface for 4-DOF servo arm kinematics and motion.
//!
//! ```bash
//! # 正运动学（角度）
//! dxl-arm-cli fk 0 0 0 0
//!
//! # 逆运动学（腕心坐标），JSON 输出
//! dxl-arm-cli ik 120 40 100 --json
//!
//! # 在模拟总线上往返运动（Ctrl-C 取消）
//! dxl-arm-cli sweep --joint 1 --low 400 --high 500 --cycles 3
//!
//! # 校验配置文件
//! dxl-arm-cli config check arm.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, FkCommand, IkCommand, SweepCommand};

/// DXL Arm CLI - 舵机机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "dxl-arm-cli")]
#[command(about = "Command-line interface for 4-DOF servo arm kinematics and motion", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 正运动学
    Fk {
        #[command(flatten)]
        args: FkCommand,
    },

    /// 逆运动学
    Ik {
        #[command(flatten)]
        args: IkCommand,
    },

    /// 在模拟总线上往返运动
    Sweep {
        #[command(flatten)]
        args: SweepCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dxl_arm_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fk { args } => args.execute(),
        Commands::Ik { args } => args.execute(),
        Commands::Sweep { args } => args.execute(),
        Commands::Config(cmd) => cmd.execute(),
    }
}
