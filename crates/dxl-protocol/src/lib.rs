//! # DXL Protocol
//!
//! 舵机总线寄存器定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `registers`: 控制表寄存器地址、宽度与取值常量
//! - `status`: 通信结果码与舵机状态字节（故障位域）
//!
//! ## 范围
//!
//! 本 crate 只描述"寄存器是什么"，不负责帧封装、校验和或重传，
//! 这些属于链路层（`dxl-link` 的 `ActuatorLink` 实现者）的职责。

pub mod registers;
pub mod status;

// 重新导出常用类型
pub use registers::*;
pub use status::*;

use std::fmt;
use thiserror::Error;

/// 总线上单个舵机的地址（ID）
///
/// 在机械臂生命周期内保持不变。协议 1.0 的有效范围为 0..=252，
/// 253 为保留值，254 为广播地址。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct JointId(pub u8);

impl JointId {
    /// 广播地址（仅可写，不会有应答）
    pub const BROADCAST: JointId = JointId(0xFE);

    /// 最大的单播地址
    pub const MAX_UNICAST: u8 = 0xFC;

    /// 创建关节 ID（范围检查）
    pub fn new(id: u8) -> Result<Self, ProtocolError> {
        if id > Self::MAX_UNICAST {
            return Err(ProtocolError::InvalidJointId { id });
        }
        Ok(JointId(id))
    }

    /// 获取原始 ID
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID:{:03}", self.0)
    }
}

impl From<u8> for JointId {
    fn from(id: u8) -> Self {
        JointId(id)
    }
}

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid joint id: {id} (max unicast id is 252)")]
    InvalidJointId { id: u8 },

    #[error("Unknown register address: {address}")]
    UnknownRegister { address: u8 },

    #[error("Value {value} does not fit register {register:?} ({width} byte(s))")]
    ValueOutOfRange {
        register: Register,
        width: u8,
        value: u32,
    },

    #[error("Register {register:?} is read-only")]
    ReadOnly { register: Register },

    #[error("Unknown communication result code: {code}")]
    UnknownCommResult { code: i16 },
}
