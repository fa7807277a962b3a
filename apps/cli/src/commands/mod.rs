//! 命令定义和实现

pub mod config;
pub mod kinematics;
pub mod sweep;

pub use config::ConfigCommand;
pub use kinematics::{FkCommand, IkCommand};
pub use sweep::SweepCommand;

use anyhow::{Context, Result};
use dxl_sdk::ArmConfig;
use std::path::Path;

/// 加载配置文件；未指定时使用默认配置
pub fn load_config(path: Option<&Path>) -> Result<ArmConfig> {
    match path {
        Some(path) => ArmConfig::load(path)
            .with_context(|| format!("加载配置文件失败: {}", path.display())),
        None => Ok(ArmConfig::default()),
    }
}
