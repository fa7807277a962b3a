//! DXL SDK - 4 自由度舵机机械臂运动核心
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 寄存器表、关节 ID、舵机故障位、通信结果码
//! - **链路层** (`link`): `ActuatorLink` 抽象与模拟总线
//! - **客户端层** (`client`): 运动学、movej 收敛、关节标定、`ArmController`
//!
//! # 快速开始
//!
//! ```rust
//! use dxl_sdk::prelude::*;
//!
//! let solver = KinematicsSolver::new(ArmGeometry::default());
//! let pose = solver.forward_kinematics(Deg(0.0), Deg(0.0), Deg(0.0), Deg(0.0));
//! assert!((pose.z - 286.0).abs() < 1e-9);
//! ```

pub use dxl_client as client;
pub use dxl_link as link;
pub use dxl_protocol as protocol;

pub mod prelude;

// 协议层
pub use protocol::{ActuatorFault, CommResult, JointId, ProtocolError, Register};

// 链路层
pub use link::{ActuatorLink, ChannelConfig, ChannelOpener, LinkError};

// 客户端层（推荐入口）
pub use client::{
    ArmConfig, ArmController, ArmError, ArmGeometry, CancelToken, JointCalibration,
    JointSolution, KinematicsSolver, MotionConfig, MotionCoordinator, MoveReport,
};

use tracing_subscriber::EnvFilter;

/// 默认日志级别（`RUST_LOG` 未设置时）
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 初始化日志
///
/// - 安装 `LogTracer`，把 `log` crate 的记录转发到 `tracing`
/// - 安装 fmt subscriber，过滤规则取自 `RUST_LOG`（缺省为 `info`）
///
/// 可重复调用，已有全局 subscriber 时保持不变。
pub fn init_logger() {
    let _ = tracing_log::LogTracer::init();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
