//! # DXL Link Layer
//!
//! 舵机总线链路抽象。运动核心只通过 [`ActuatorLink`] 访问舵机，
//! 把每一次寄存器读写视为一次可能失败的远程操作。
//!
//! 帧封装、校验和、传输层重试全部由实现者负责；
//! 本 crate 只定义接口、错误分类，以及（`mock` feature 下）一条模拟总线。

use dxl_protocol::{ActuatorFault, CommResult, JointId, ProtocolError, Register};
use thiserror::Error;

pub use dxl_protocol;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBus, MockFailure, MockLink, MockOpener, WriteRecord};

/// 默认串口设备
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// 默认波特率（1 Mbps）
pub const DEFAULT_BAUD_RATE: u32 = 1_000_000;

/// 链路层统一错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    /// 通信失败（报文未能完整往返）
    #[error("Transport error on {id}: {result}")]
    Comm { id: JointId, result: CommResult },

    /// 往返成功，但舵机在应答中报告了错误位
    #[error("Actuator {id} reported fault: {fault}")]
    Fault { id: JointId, fault: ActuatorFault },

    /// 寄存器层面的非法访问
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 通道打开失败
    #[error("Failed to open channel {port}: {reason}")]
    Open { port: String, reason: String },

    /// 波特率设置失败
    #[error("Failed to set baud rate {baud_rate} on {port}")]
    BaudRate { port: String, baud_rate: u32 },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 通道已关闭
    #[error("Channel closed")]
    Closed,
}

impl LinkError {
    /// 是否为舵机报告的故障（相对于通信故障）
    pub fn is_fault(&self) -> bool {
        matches!(self, LinkError::Fault { .. })
    }

    /// 是否为通道初始化失败（打开端口 / 设置波特率）
    pub fn is_channel_init(&self) -> bool {
        matches!(self, LinkError::Open { .. } | LinkError::BaudRate { .. })
    }
}

/// 把厂商 SDK 风格的 `(comm_result, error_byte)` 二元组折叠为 `Result`
///
/// - 通信失败优先：`comm != Success` 时返回 [`LinkError::Comm`]
/// - 通信成功但状态字节非零：返回 [`LinkError::Fault`]
pub fn check_reply(id: JointId, comm: CommResult, status: u8) -> Result<(), LinkError> {
    if !comm.is_success() {
        return Err(LinkError::Comm { id, result: comm });
    }
    let fault = ActuatorFault::from_code(status);
    if !fault.is_clear() {
        return Err(LinkError::Fault { id, fault });
    }
    Ok(())
}

/// 舵机总线链路
///
/// 阻塞、同步。同一时刻只能被一个运动协调器独占（由所有权保证）。
pub trait ActuatorLink {
    /// 写寄存器。宽度由 [`Register::width`] 决定
    fn write_register(&mut self, id: JointId, register: Register, value: u32)
    -> Result<(), LinkError>;

    /// 读寄存器
    fn read_register(&mut self, id: JointId, register: Register) -> Result<u32, LinkError>;

    /// 关闭通道
    fn close(&mut self) -> Result<(), LinkError> {
        Ok(())
    }
}

impl<L: ActuatorLink + ?Sized> ActuatorLink for Box<L> {
    fn write_register(
        &mut self,
        id: JointId,
        register: Register,
        value: u32,
    ) -> Result<(), LinkError> {
        (**self).write_register(id, register, value)
    }

    fn read_register(&mut self, id: JointId, register: Register) -> Result<u32, LinkError> {
        (**self).read_register(id, register)
    }

    fn close(&mut self) -> Result<(), LinkError> {
        (**self).close()
    }
}

/// 通道配置
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
    /// 串口设备（如 "/dev/ttyUSB0"、"COM14"）
    pub port: String,
    /// 波特率
    pub baud_rate: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// 通道打开器（打开端口 + 协商波特率）
///
/// 打开失败对整个进程是致命的，由调用方决定如何退出。
pub trait ChannelOpener {
    type Link: ActuatorLink;

    fn open(&self, config: &ChannelConfig) -> Result<Self::Link, LinkError>;
}
