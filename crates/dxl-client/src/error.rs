//! 错误类型体系
//!
//! 运动核心的错误分为三类，传播策略不同：
//!
//! - **调用错误**（`InvalidArgument`、`UnreachablePose`）：在任何 I/O 之前返回，无副作用
//! - **写阶段错误**（`Transport`、`ActuatorFault`）：中止本次运动，已发出的写不回滚
//! - **收敛错误**（`MoveTimeout`、`Cancelled`）：轮询阶段的读错误会被容忍，
//!   由超时兜底，避免掉线的舵机让调用方永远等待
//!
//! 只有通道初始化失败（打开端口、设置波特率）被视为致命错误。

use crate::convergence::JointProgress;
use dxl_link::LinkError;
use dxl_protocol::{ActuatorFault, JointId};
use thiserror::Error;

/// 运动核心错误类型
#[derive(Debug, Error)]
pub enum ArmError {
    /// 调用参数非法（长度不一致、未知关节等），未发生任何 I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 链路通信失败
    #[error("Transport error on joint {joint}: {source}")]
    Transport {
        joint: JointId,
        #[source]
        source: LinkError,
    },

    /// 舵机报告故障位（通信本身成功）
    #[error("Actuator fault on joint {joint}: {fault}")]
    ActuatorFault { joint: JointId, fault: ActuatorFault },

    /// 目标点不在工作空间内
    #[error("Unreachable pose ({x:.3}, {y:.3}, {z:.3}): cos(theta3) = {cos_theta3:.4}")]
    UnreachablePose {
        x: f64,
        y: f64,
        z: f64,
        cos_theta3: f64,
    },

    /// 在时间/轮询次数预算内未收敛
    #[error(
        "Move timed out after {elapsed_ms}ms ({cycles} poll cycles), {count} joint(s) pending",
        count = .pending.len()
    )]
    MoveTimeout {
        elapsed_ms: u64,
        cycles: u32,
        /// 未到位的关节及其最后读数
        pending: Vec<JointProgress>,
    },

    /// 被协作式取消
    #[error("Move cancelled after {cycles} poll cycles")]
    Cancelled { cycles: u32 },

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 与具体关节无关的链路错误（打开/关闭通道）
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}

impl ArmError {
    /// 把某个关节上的链路错误归类为 `Transport` 或 `ActuatorFault`
    pub fn from_link(joint: JointId, err: LinkError) -> Self {
        match err {
            LinkError::Fault { fault, .. } => ArmError::ActuatorFault { joint, fault },
            other => ArmError::Transport {
                joint,
                source: other,
            },
        }
    }

    /// 是否为致命错误（需要停止整个进程）
    pub fn is_fatal(&self) -> bool {
        matches!(self, ArmError::Link(err) if err.is_channel_init())
    }

    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        match self {
            ArmError::Transport {
                source: LinkError::Comm { result, .. },
                ..
            } => result.is_transient(),
            ArmError::MoveTimeout { .. } => true,
            _ => false,
        }
    }
}

/// 运动核心的 Result 类型
pub type Result<T> = std::result::Result<T, ArmError>;
