//! 模拟舵机总线
//!
//! 用于测试与演示，无需硬件。多个 [`MockLink`] 句柄共享同一条 [`MockBus`]，
//! 测试代码可以在把链路交给协调器之后继续检查总线状态。
//!
//! # 行为
//!
//! - 每次读取 `PresentPosition`，舵机向目标位置移动 `step` 个单位
//!   （未设置 `step` 时直接跳到目标位置）
//! - 可以预置读数序列（`push_reads`），优先于运动模拟
//! - 可以注入下一次读/写的通信失败或故障位（`push_read_failure` / `fail_next_write`）
//! - 记录所有写调用，便于断言调用次数与顺序

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use dxl_protocol::{ActuatorFault, CommResult, JointId, ProtocolError, Register, TORQUE_ENABLE};
use parking_lot::Mutex;
use tracing::trace;

use crate::{ActuatorLink, ChannelConfig, ChannelOpener, LinkError};

/// 注入的失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// 通信失败
    Comm(CommResult),
    /// 舵机故障位
    Fault(ActuatorFault),
}

impl MockFailure {
    /// 无应答（最常见的掉线表现）
    pub fn timeout() -> Self {
        MockFailure::Comm(CommResult::RxTimeout)
    }

    /// 过载故障
    pub fn overload() -> Self {
        MockFailure::Fault(ActuatorFault::from_code(0b0010_0000))
    }

    fn into_error(self, id: JointId) -> LinkError {
        match self {
            MockFailure::Comm(result) => LinkError::Comm { id, result },
            MockFailure::Fault(fault) => LinkError::Fault { id, fault },
        }
    }
}

/// 一次被接受的写操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    pub id: JointId,
    pub register: Register,
    pub value: u32,
}

#[derive(Debug, Clone, Copy)]
enum ScriptedRead {
    Position(u32),
    Fail(MockFailure),
}

#[derive(Debug, Clone)]
struct MockServo {
    torque: bool,
    goal: u32,
    present: u32,
    speed: u16,
    step: Option<u32>,
    scripted: VecDeque<ScriptedRead>,
    write_failures: VecDeque<MockFailure>,
    reads: usize,
}

impl MockServo {
    fn new(present: u32) -> Self {
        Self {
            torque: false,
            goal: present,
            present,
            speed: 0,
            step: None,
            scripted: VecDeque::new(),
            write_failures: VecDeque::new(),
            reads: 0,
        }
    }

    fn advance(&mut self) {
        let distance = self.goal.abs_diff(self.present);
        let delta = match self.step {
            Some(step) => step.min(distance),
            None => distance,
        };
        if self.goal > self.present {
            self.present += delta;
        } else {
            self.present -= delta;
        }
    }
}

#[derive(Debug, Default)]
struct BusState {
    servos: BTreeMap<JointId, MockServo>,
    writes: Vec<WriteRecord>,
    write_attempts: usize,
    read_attempts: usize,
    closed: bool,
}

/// 模拟总线（克隆即共享）
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl MockBus {
    /// 创建空总线
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建挂载了若干舵机的总线，所有舵机初始位于 `present`
    pub fn with_servos(ids: impl IntoIterator<Item = JointId>, present: u32) -> Self {
        let bus = Self::new();
        for id in ids {
            bus.add_servo(id, present);
        }
        bus
    }

    /// 挂载一个舵机
    pub fn add_servo(&self, id: JointId, present: u32) {
        self.state.lock().servos.insert(id, MockServo::new(present));
    }

    /// 获取一个链路句柄
    pub fn link(&self) -> MockLink {
        MockLink { bus: self.clone() }
    }

    /// 设置每次读取时的移动步长
    pub fn set_step(&self, id: JointId, step: u32) {
        if let Some(servo) = self.state.lock().servos.get_mut(&id) {
            servo.step = Some(step);
        }
    }

    /// 直接设置当前位置（模拟外力推动）
    pub fn set_present(&self, id: JointId, present: u32) {
        if let Some(servo) = self.state.lock().servos.get_mut(&id) {
            servo.present = present;
        }
    }

    /// 预置 `PresentPosition` 读数序列
    pub fn push_reads(&self, id: JointId, positions: impl IntoIterator<Item = u32>) {
        if let Some(servo) = self.state.lock().servos.get_mut(&id) {
            servo
                .scripted
                .extend(positions.into_iter().map(ScriptedRead::Position));
        }
    }

    /// 预置一次读取失败（排在已预置的读数之后）
    pub fn push_read_failure(&self, id: JointId, failure: MockFailure) {
        if let Some(servo) = self.state.lock().servos.get_mut(&id) {
            servo.scripted.push_back(ScriptedRead::Fail(failure));
        }
    }

    /// 让该舵机的下一次写操作失败
    pub fn fail_next_write(&self, id: JointId, failure: MockFailure) {
        if let Some(servo) = self.state.lock().servos.get_mut(&id) {
            servo.write_failures.push_back(failure);
        }
    }

    /// 被接受的写操作
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().writes.clone()
    }

    /// 写调用总次数（包括失败的）
    pub fn write_attempts(&self) -> usize {
        self.state.lock().write_attempts
    }

    /// 读调用总次数（包括失败的）
    pub fn read_attempts(&self) -> usize {
        self.state.lock().read_attempts
    }

    /// 某个舵机被读取的次数
    pub fn read_count(&self, id: JointId) -> usize {
        self.state.lock().servos.get(&id).map_or(0, |s| s.reads)
    }

    pub fn goal(&self, id: JointId) -> Option<u32> {
        self.state.lock().servos.get(&id).map(|s| s.goal)
    }

    pub fn present(&self, id: JointId) -> Option<u32> {
        self.state.lock().servos.get(&id).map(|s| s.present)
    }

    pub fn speed(&self, id: JointId) -> Option<u16> {
        self.state.lock().servos.get(&id).map(|s| s.speed)
    }

    pub fn torque_enabled(&self, id: JointId) -> Option<bool> {
        self.state.lock().servos.get(&id).map(|s| s.torque)
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// 模拟总线上的链路句柄
#[derive(Debug, Clone)]
pub struct MockLink {
    bus: MockBus,
}

impl MockLink {
    /// 所属总线
    pub fn bus(&self) -> &MockBus {
        &self.bus
    }
}

impl ActuatorLink for MockLink {
    fn write_register(
        &mut self,
        id: JointId,
        register: Register,
        value: u32,
    ) -> Result<(), LinkError> {
        let mut state = self.bus.state.lock();
        state.write_attempts += 1;

        if state.closed {
            return Err(LinkError::Closed);
        }
        register.check_write(value)?;

        let Some(servo) = state.servos.get_mut(&id) else {
            return Err(LinkError::Comm {
                id,
                result: CommResult::RxTimeout,
            });
        };
        if let Some(failure) = servo.write_failures.pop_front() {
            return Err(failure.into_error(id));
        }

        match register {
            Register::TorqueEnable => servo.torque = value == TORQUE_ENABLE,
            Register::GoalPosition => servo.goal = value,
            Register::MovingSpeed => servo.speed = value as u16,
            Register::PresentPosition => {
                return Err(ProtocolError::ReadOnly { register }.into());
            },
        }
        trace!("mock write {} {:?} <- {}", id, register, value);
        state.writes.push(WriteRecord {
            id,
            register,
            value,
        });
        Ok(())
    }

    fn read_register(&mut self, id: JointId, register: Register) -> Result<u32, LinkError> {
        let mut state = self.bus.state.lock();
        state.read_attempts += 1;

        if state.closed {
            return Err(LinkError::Closed);
        }
        let Some(servo) = state.servos.get_mut(&id) else {
            return Err(LinkError::Comm {
                id,
                result: CommResult::RxTimeout,
            });
        };

        match register {
            Register::TorqueEnable => Ok(servo.torque as u32),
            Register::GoalPosition => Ok(servo.goal),
            Register::MovingSpeed => Ok(servo.speed as u32),
            Register::PresentPosition => {
                servo.reads += 1;
                match servo.scripted.pop_front() {
                    Some(ScriptedRead::Position(position)) => {
                        servo.present = position;
                        Ok(position)
                    },
                    Some(ScriptedRead::Fail(failure)) => Err(failure.into_error(id)),
                    None => {
                        servo.advance();
                        Ok(servo.present)
                    },
                }
            },
        }
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.bus.state.lock().closed = true;
        Ok(())
    }
}

/// 在模拟总线上"打开"通道
#[derive(Debug, Clone)]
pub struct MockOpener {
    bus: MockBus,
}

impl MockOpener {
    pub fn new(bus: MockBus) -> Self {
        Self { bus }
    }
}

impl ChannelOpener for MockOpener {
    type Link = MockLink;

    fn open(&self, config: &ChannelConfig) -> Result<MockLink, LinkError> {
        if config.port.is_empty() {
            return Err(LinkError::Open {
                port: config.port.clone(),
                reason: "empty port name".to_string(),
            });
        }
        if config.baud_rate == 0 {
            return Err(LinkError::BaudRate {
                port: config.port.clone(),
                baud_rate: config.baud_rate,
            });
        }
        self.bus.state.lock().closed = false;
        Ok(self.bus.link())
    }
}
