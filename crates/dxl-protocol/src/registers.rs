//! 控制表寄存器定义
//!
//! 地址对应 MX 系列舵机（协议 1.0）的控制表。不同型号的地址不同，
//! 这里只覆盖运动核心用到的四个寄存器。

use crate::ProtocolError;
use num_enum::TryFromPrimitive;

/// 扭矩使能写入值
pub const TORQUE_ENABLE: u32 = 1;

/// 扭矩失能写入值
pub const TORQUE_DISABLE: u32 = 0;

/// MX 系列编码器分辨率（每圈 tick 数）
pub const MX_TICKS_PER_REV: u32 = 4096;

/// MX 系列编码器中位（0° 对应的原始值）
pub const MX_CENTER_POSITION: u32 = 2048;

/// 关节模式下 Moving Speed 的最大值（0 表示不限速）
pub const MAX_MOVING_SPEED: u16 = 1023;

/// 寄存器宽度（字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWidth {
    /// 1 字节
    Byte = 1,
    /// 2 字节
    Word = 2,
    /// 4 字节
    DWord = 4,
}

impl RegisterWidth {
    /// 字节数
    #[inline]
    pub const fn bytes(self) -> u8 {
        self as u8
    }

    /// 该宽度能容纳的最大无符号值
    pub const fn max_value(self) -> u32 {
        match self {
            RegisterWidth::Byte => u8::MAX as u32,
            RegisterWidth::Word => u16::MAX as u32,
            RegisterWidth::DWord => u32::MAX,
        }
    }
}

/// 控制表寄存器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Register {
    /// 扭矩使能（1 字节）
    TorqueEnable = 24,
    /// 目标位置（4 字节写入）
    GoalPosition = 30,
    /// 运动速度（2 字节）
    MovingSpeed = 32,
    /// 当前位置（4 字节读取，只读）
    PresentPosition = 36,
}

impl Register {
    /// 控制表地址
    #[inline]
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// 读写宽度
    pub const fn width(self) -> RegisterWidth {
        match self {
            Register::TorqueEnable => RegisterWidth::Byte,
            Register::MovingSpeed => RegisterWidth::Word,
            Register::GoalPosition | Register::PresentPosition => RegisterWidth::DWord,
        }
    }

    /// 是否可写
    pub const fn is_writable(self) -> bool {
        !matches!(self, Register::PresentPosition)
    }

    /// 由地址查找寄存器
    pub fn from_address(address: u8) -> Result<Self, ProtocolError> {
        Register::try_from(address).map_err(|_| ProtocolError::UnknownRegister { address })
    }

    /// 检查写入值是否合法（可写且不超出寄存器宽度）
    ///
    /// 注意：这里只检查寄存器宽度，不检查关节行程范围。
    pub fn check_write(self, value: u32) -> Result<(), ProtocolError> {
        if !self.is_writable() {
            return Err(ProtocolError::ReadOnly { register: self });
        }
        let width = self.width();
        if value > width.max_value() {
            return Err(ProtocolError::ValueOutOfRange {
                register: self,
                width: width.bytes(),
                value,
            });
        }
        Ok(())
    }
}
