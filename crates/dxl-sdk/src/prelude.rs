//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use dxl_sdk::prelude::*;
//! ```

// 客户端层
pub use crate::client::types::*;
pub use crate::client::{
    ArmConfig, ArmController, ArmGeometry, CancelToken, Clock, JointCalibration, JointSolution,
    KinematicsSolver, MotionConfig, MotionCoordinator, MoveReport, SystemClock,
};

// 链路层（常用 Trait）
pub use crate::link::{ActuatorLink, ChannelOpener};

// 错误类型
pub use crate::client::ArmError;
pub use crate::link::LinkError;
pub use crate::protocol::ProtocolError;
