//! 通信结果与舵机状态字节
//!
//! 一次寄存器读写有两层结果：
//! - **通信结果**（`CommResult`）：报文是否完整往返
//! - **状态字节**（`ActuatorFault`）：往返成功时，舵机在应答中报告的错误位

use bilge::prelude::*;
use num_enum::TryFromPrimitive;
use std::fmt;

use crate::ProtocolError;

/// 通信结果码（与厂商 SDK 的 COMM_* 常量数值一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i16)]
pub enum CommResult {
    /// 收发成功
    Success = 0,
    /// 端口被占用（上一次收发尚未结束）
    PortBusy = -1000,
    /// 发送失败
    TxFail = -1001,
    /// 接收失败
    RxFail = -1002,
    /// 指令包格式错误
    TxError = -2000,
    /// 正在接收
    RxWaiting = -3000,
    /// 接收超时（无应答）
    RxTimeout = -3001,
    /// 应答包损坏（校验失败）
    RxCorrupt = -3002,
    /// 当前协议不支持该操作
    NotAvailable = -9000,
}

impl CommResult {
    /// 由原始结果码解析
    pub fn from_code(code: i16) -> Result<Self, ProtocolError> {
        CommResult::try_from(code).map_err(|_| ProtocolError::UnknownCommResult { code })
    }

    /// 是否成功
    #[inline]
    pub fn is_success(self) -> bool {
        self == CommResult::Success
    }

    /// 重试是否可能成功（瞬时性故障）
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            CommResult::PortBusy
                | CommResult::RxWaiting
                | CommResult::RxTimeout
                | CommResult::RxCorrupt
        )
    }

    /// 描述文本
    pub const fn description(self) -> &'static str {
        match self {
            CommResult::Success => "Tx/Rx result: success",
            CommResult::PortBusy => "Port is in use",
            CommResult::TxFail => "Failed transmit instruction packet",
            CommResult::RxFail => "Failed get status packet",
            CommResult::TxError => "Incorrect instruction packet",
            CommResult::RxWaiting => "Now receiving status packet",
            CommResult::RxTimeout => "There is no status packet",
            CommResult::RxCorrupt => "Incorrect status packet",
            CommResult::NotAvailable => "Protocol does not support this function",
        }
    }
}

impl fmt::Display for CommResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[TxRxResult] {}", self.description())
    }
}

/// 舵机状态字节位域（协议 1.0 应答包 Error 字段）
///
/// - Bit 0: 输入电压异常
/// - Bit 1: 角度超出限位
/// - Bit 2: 过热
/// - Bit 3: 指令值超出范围
/// - Bit 4: 指令包校验和错误
/// - Bit 5: 过载
/// - Bit 6: 未定义指令
/// - Bit 7: 保留
///
/// bilge 默认 LSB first 位序，与协议一致。
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorFault {
    pub input_voltage: bool, // Bit 0
    pub angle_limit: bool,   // Bit 1
    pub overheating: bool,   // Bit 2
    pub range: bool,         // Bit 3
    pub checksum: bool,      // Bit 4
    pub overload: bool,      // Bit 5
    pub instruction: bool,   // Bit 6
    pub reserved: bool,      // Bit 7
}

impl ActuatorFault {
    /// 由应答包中的状态字节构建
    pub fn from_code(code: u8) -> Self {
        ActuatorFault::from(u8::new(code))
    }

    /// 原始状态字节
    pub fn code(self) -> u8 {
        u8::from(self)
    }

    /// 是否无任何错误位
    pub fn is_clear(self) -> bool {
        self.code() == 0
    }

    /// 置位的错误名称列表
    pub fn active(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.input_voltage() {
            names.push("Input voltage error");
        }
        if self.angle_limit() {
            names.push("Angle limit error");
        }
        if self.overheating() {
            names.push("Overheat error");
        }
        if self.range() {
            names.push("Out of range error");
        }
        if self.checksum() {
            names.push("Checksum error");
        }
        if self.overload() {
            names.push("Overload error");
        }
        if self.instruction() {
            names.push("Instruction code error");
        }
        names
    }
}

impl fmt::Display for ActuatorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.active();
        if active.is_empty() {
            write!(f, "[RxPacketError] 0x{:02X}", self.code())
        } else {
            write!(f, "[RxPacketError] {}", active.join(", "))
        }
    }
}
