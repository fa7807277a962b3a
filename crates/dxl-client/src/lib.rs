//! 运动核心
//!
//! 本模块提供 4 自由度舵机机械臂的运动接口，包括：
//! - 正/逆运动学（[`KinematicsSolver`]）
//! - 关节空间同步运动与到位检测（[`MotionCoordinator`]）
//! - 编码器值与关节角的标定（[`JointCalibration`]）
//! - 组合以上各项的 [`ArmController`]
//!
//! 链路层只通过 [`dxl_link::ActuatorLink`] trait 接入，测试时可替换为模拟总线。

pub mod calibration;
pub mod clock;
pub mod config;
pub mod controller;
pub mod convergence;
pub mod error;
pub mod kinematics;
pub mod motion;
pub mod types;

// 重新导出常用类型
pub use calibration::{Direction, JointCalibration};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ArmConfig, DEFAULT_INITIAL_SPEED, JOINT_COUNT};
pub use controller::ArmController;
pub use convergence::JointProgress;
pub use error::{ArmError, Result};
pub use kinematics::{ArmGeometry, JointSolution, KinematicsSolver};
pub use motion::{
    CancelToken, DEFAULT_MOVING_THRESHOLD, MIN_POLL_INTERVAL, MotionConfig, MotionCoordinator,
    MoveReport,
};
pub use types::*;
