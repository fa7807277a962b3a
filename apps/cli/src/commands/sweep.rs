//! 往返运动命令（模拟总线）
//!
//! 在 `low` 与 `high` 两个编码器位置之间反复运动单个关节，
//! 每次运动都等待到位后再发下一条。Ctrl-C 在下一个轮询周期生效。

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use dxl_sdk::client::SystemClock;
use dxl_sdk::link::{MockBus, MockOpener};
use dxl_sdk::protocol::MX_CENTER_POSITION;
use dxl_sdk::{ArmController, ArmError, CancelToken, JointId};

use super::load_config;

/// 往返运动命令参数
#[derive(Args, Debug)]
pub struct SweepCommand {
    /// 关节 ID
    #[arg(short, long, default_value_t = 1)]
    pub joint: u8,

    /// 低位（编码器值）
    #[arg(long, default_value_t = 400)]
    pub low: u32,

    /// 高位（编码器值）
    #[arg(long, default_value_t = 500)]
    pub high: u32,

    /// 往返次数
    #[arg(short, long, default_value_t = 1)]
    pub cycles: u32,

    /// 模拟舵机每次读取前进的计数
    #[arg(long, default_value_t = 25)]
    pub step: u32,

    /// 轮询间隔（毫秒，覆盖配置）
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// 配置文件
    #[arg(short = 'f', long)]
    pub config: Option<PathBuf>,
}

impl SweepCommand {
    pub fn execute(&self) -> Result<()> {
        if self.step == 0 {
            bail!("step 必须大于 0");
        }
        let mut config = load_config(self.config.as_deref())?;
        if let Some(ms) = self.poll_ms {
            config.motion.poll_interval = Duration::from_millis(ms);
        }

        let joint = JointId(self.joint);
        if !config.joint_ids().contains(&joint) {
            bail!("关节 {} 不在配置中", joint);
        }

        let bus = MockBus::with_servos(config.joint_ids(), MX_CENTER_POSITION);
        for id in config.joint_ids() {
            bus.set_step(id, self.step);
        }

        let cancel = CancelToken::new();
        {
            let cancel = cancel.clone();
            ctrlc::set_handler(move || cancel.cancel()).context("设置 Ctrl-C 处理器失败")?;
        }

        println!("🔌 连接模拟总线 {}...", config.channel.port);
        let mut arm = match ArmController::open(&MockOpener::new(bus.clone()), config, SystemClock) {
            Ok(arm) => arm,
            Err(e) if e.is_fatal() => return Err(e).context("通道初始化失败"),
            Err(e) => return Err(e.into()),
        };

        let result = self.run(&mut arm, joint, &cancel);
        arm.close().context("关闭机械臂失败")?;

        match result {
            Err(ArmError::Cancelled { cycles }) => {
                println!("⏹  已取消（轮询 {cycles} 次）");
                Ok(())
            },
            other => other.map_err(Into::into),
        }
    }

    fn run<L: dxl_sdk::ActuatorLink>(
        &self,
        arm: &mut ArmController<L, SystemClock>,
        joint: JointId,
        cancel: &CancelToken,
    ) -> Result<(), ArmError> {
        for round in 1..=self.cycles {
            for target in [self.high, self.low] {
                let report = arm
                    .motion_mut()
                    .movej_with_cancel(&[joint], &[target], cancel)?;
                info!("round {} reached {} in {} cycles", round, target, report.cycles);
                println!(
                    "✅ [{}/{}] {} -> {} ({} 次轮询, {:?})",
                    round, self.cycles, joint, target, report.cycles, report.elapsed
                );
            }
        }
        Ok(())
    }
}
