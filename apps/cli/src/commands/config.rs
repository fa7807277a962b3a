//! 配置管理命令

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use dxl_sdk::ArmConfig;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 校验配置文件
    Check {
        /// 配置文件路径
        path: PathBuf,
    },

    /// 输出默认配置（TOML）
    Default {
        /// 写入文件而不是标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Check { path } => Self::check_(path),
            ConfigCommand::Default { output } => Self::default_(output),
        }
    }

    fn check_(path: PathBuf) -> Result<()> {
        let config = ArmConfig::load(&path)
            .with_context(|| format!("配置无效: {}", path.display()))?;

        println!("✅ 配置有效: {}", path.display());
        println!("  通道: {} @ {} bps", config.channel.port, config.channel.baud_rate);
        let g = config.geometry;
        println!(
            "  几何: d1={} a2={} a3={} a4={}",
            g.d1(),
            g.a2(),
            g.a3(),
            g.a4()
        );
        println!(
            "  运动: 阈值 {} / 轮询 {:?} / 超时 {:?}",
            config.motion.moving_threshold, config.motion.poll_interval, config.motion.timeout
        );
        for joint in &config.joints {
            println!(
                "  {}: 零位 {} {:?} 行程 {}..={}",
                joint.id, joint.zero_offset, joint.direction, joint.min, joint.max
            );
        }
        Ok(())
    }

    fn default_(output: Option<PathBuf>) -> Result<()> {
        let config = ArmConfig::default();
        match output {
            Some(path) => {
                config
                    .save(&path)
                    .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
                println!("✅ 已写入 {}", path.display());
            },
            None => print!("{}", config.to_toml_string()?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm.toml");

        ConfigCommand::Default {
            output: Some(path.clone()),
        }
        .execute()
        .unwrap();
        ConfigCommand::Check { path }.execute().unwrap();
    }

    #[test]
    fn test_check_missing_file() {
        let err = ConfigCommand::Check {
            path: PathBuf::from("/nonexistent/arm.toml"),
        }
        .execute()
        .unwrap_err();
        assert!(err.to_string().contains("配置无效"));
    }
}
