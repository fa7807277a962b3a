//! 公共类型

pub mod pose;
pub mod units;

pub use pose::Pose3D;
pub use units::{Deg, Rad};

// 关节 ID 由协议层定义
pub use dxl_protocol::JointId;

/// 原始编码器位置
pub type JointPosition = u32;
