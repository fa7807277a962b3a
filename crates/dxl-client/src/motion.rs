//! 运动协调器
//!
//! [`MotionCoordinator`] 独占一条 [`ActuatorLink`]，负责：
//!
//! - `movej`：下发一组关节目标并轮询直到全部到位
//! - 扭矩使能 / 失能
//! - 运动速度设置
//!
//! # movej 的两个阶段
//!
//! 1. **写阶段**：按调用顺序逐个写 `GoalPosition`。任意一次写失败立即中止，
//!    已经写出的目标不回滚（舵机可能已经开始运动）。
//! 2. **轮询阶段**：每个周期顺序读取所有尚未到位关节的 `PresentPosition`。
//!    `|target − present| <= moving_threshold` 即视为到位，且不再重复读取。
//!    读失败只记录告警，该关节下个周期重读。一轮扫描结束时全部到位即成功。
//!
//! 轮询阶段受时间预算、周期上限和 [`CancelToken`] 三重约束，绝不会无限等待。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use dxl_link::ActuatorLink;
use dxl_protocol::{MAX_MOVING_SPEED, Register, TORQUE_DISABLE, TORQUE_ENABLE};

use crate::clock::{Clock, SystemClock};
use crate::config::millis;
use crate::convergence::{ConvergenceState, JointProgress};
use crate::error::{ArmError, Result};
use crate::types::{JointId, JointPosition};

/// 默认到位阈值（编码器单位）
pub const DEFAULT_MOVING_THRESHOLD: u32 = 20;

/// 轮询间隔下限（配置为 0 时按此值休眠）
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// movej 轮询参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// 到位阈值（含边界）
    pub moving_threshold: u32,
    /// 轮询周期间隔（不低于 [`MIN_POLL_INTERVAL`]）
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
    /// 轮询阶段的总时间预算
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    /// 轮询周期上限（`None` 表示只受时间约束）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cycles: Option<u32>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            moving_threshold: DEFAULT_MOVING_THRESHOLD,
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(10),
            max_cycles: None,
        }
    }
}

/// 协作式取消令牌
///
/// 克隆共享同一个标志，可以从其他线程（如 Ctrl-C 处理器）设置。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// 清除取消标志，以便复用
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// movej 成功后的报告
#[derive(Debug, Clone, Serialize)]
pub struct MoveReport {
    /// 轮询周期数
    pub cycles: u32,
    /// 轮询阶段耗时
    #[serde(with = "millis")]
    pub elapsed: Duration,
    /// 每个关节的最终进度（调用顺序）
    pub joints: Vec<JointProgress>,
}

/// 运动协调器
///
/// 同一条链路同一时刻只能有一个协调器：协调器按值持有链路，
/// 所有命令都需要 `&mut self`。
///
/// 不要在 movej 进行中（例如从另一个协调器实例）失能扭矩，
/// 否则轮询会一直等到超时。
pub struct MotionCoordinator<L: ActuatorLink, C: Clock = SystemClock> {
    link: L,
    clock: C,
    known: BTreeSet<JointId>,
    config: MotionConfig,
}

impl<L: ActuatorLink> MotionCoordinator<L, SystemClock> {
    /// 创建协调器
    ///
    /// `joints` 是本链路上已知的关节集合；命令中出现集合外的 ID 会被拒绝。
    pub fn new(link: L, joints: impl IntoIterator<Item = JointId>, config: MotionConfig) -> Self {
        Self::with_clock(link, joints, config, SystemClock)
    }
}

impl<L: ActuatorLink, C: Clock> MotionCoordinator<L, C> {
    /// 使用自定义时钟创建协调器
    pub fn with_clock(
        link: L,
        joints: impl IntoIterator<Item = JointId>,
        config: MotionConfig,
        clock: C,
    ) -> Self {
        Self {
            link,
            clock,
            known: joints.into_iter().collect(),
            config,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MotionConfig {
        &mut self.config
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// 已知关节（升序）
    pub fn known_joints(&self) -> impl Iterator<Item = JointId> + '_ {
        self.known.iter().copied()
    }

    /// 交还链路
    pub fn into_link(self) -> L {
        self.link
    }

    /// 关节空间运动（阻塞直到全部到位）
    ///
    /// # 错误
    ///
    /// - `ArmError::InvalidArgument`: 参数非法，未发生任何 I/O
    /// - `ArmError::Transport` / `ArmError::ActuatorFault`: 写阶段失败
    /// - `ArmError::MoveTimeout`: 轮询阶段超出时间或周期预算
    pub fn movej(&mut self, joints: &[JointId], targets: &[JointPosition]) -> Result<MoveReport> {
        self.run_movej(joints, targets, None)
    }

    /// 可取消的 movej
    ///
    /// 令牌在每个轮询周期开始时检查一次；被取消时返回 `ArmError::Cancelled`。
    /// 已下发的目标不会撤回，舵机会继续运动到目标位置。
    pub fn movej_with_cancel(
        &mut self,
        joints: &[JointId],
        targets: &[JointPosition],
        cancel: &CancelToken,
    ) -> Result<MoveReport> {
        self.run_movej(joints, targets, Some(cancel))
    }

    fn run_movej(
        &mut self,
        joints: &[JointId],
        targets: &[JointPosition],
        cancel: Option<&CancelToken>,
    ) -> Result<MoveReport> {
        self.validate_move(joints, targets)?;

        debug!("movej {:?} -> {:?}", joints, targets);
        for (&joint, &target) in joints.iter().zip(targets) {
            self.link
                .write_register(joint, Register::GoalPosition, target)
                .map_err(|e| {
                    error!("Failed to write goal position {} to {}: {}", target, joint, e);
                    ArmError::from_link(joint, e)
                })?;
        }

        let mut state = ConvergenceState::new(joints, targets, self.config.moving_threshold);
        let start = self.clock.now();
        let mut cycles: u32 = 0;

        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                info!("movej cancelled after {} poll cycles", cycles);
                return Err(ArmError::Cancelled { cycles });
            }

            cycles += 1;
            let pending = state.pending_ids();
            trace!("poll cycle {}: pending {:?}", cycles, pending.as_slice());
            for joint in pending {
                match self.link.read_register(joint, Register::PresentPosition) {
                    Ok(present) => {
                        if state.observe(joint, present) {
                            trace!("{} reached (present {})", joint, present);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read present position of {}: {}", joint, e);
                        state.record_failure(joint);
                    },
                }
            }

            let elapsed = self.clock.now().saturating_duration_since(start);
            if state.all_reached() {
                debug!("movej converged in {} cycles ({:?})", cycles, elapsed);
                return Ok(MoveReport {
                    cycles,
                    elapsed,
                    joints: state.into_progress(),
                });
            }

            let cycle_cap_hit = self.config.max_cycles.is_some_and(|max| cycles >= max);
            if cycle_cap_hit || elapsed >= self.config.timeout {
                let pending = state.pending();
                warn!(
                    "movej timed out after {} cycles ({:?}), pending: {:?}",
                    cycles,
                    elapsed,
                    pending.iter().map(|p| p.joint).collect::<Vec<_>>()
                );
                return Err(ArmError::MoveTimeout {
                    elapsed_ms: elapsed.as_millis() as u64,
                    cycles,
                    pending,
                });
            }

            let remaining = self.config.timeout.saturating_sub(elapsed);
            let interval = self.config.poll_interval.max(MIN_POLL_INTERVAL);
            self.clock.sleep(interval.min(remaining));
        }
    }

    fn validate_move(&self, joints: &[JointId], targets: &[JointPosition]) -> Result<()> {
        if joints.len() != targets.len() {
            return Err(ArmError::InvalidArgument(format!(
                "{} joints but {} targets",
                joints.len(),
                targets.len()
            )));
        }
        if joints.is_empty() {
            return Err(ArmError::InvalidArgument("empty joint list".to_string()));
        }
        let mut seen = BTreeSet::new();
        for &joint in joints {
            if !seen.insert(joint) {
                return Err(ArmError::InvalidArgument(format!("duplicate joint {joint}")));
            }
        }
        self.check_known(joints)
    }

    fn check_known(&self, joints: &[JointId]) -> Result<()> {
        match joints.iter().find(|j| !self.known.contains(j)) {
            Some(joint) => Err(ArmError::InvalidArgument(format!("unknown joint {joint}"))),
            None => Ok(()),
        }
    }

    /// 使能扭矩
    ///
    /// 每个关节都会尝试；失败逐个记录，返回第一个失败。
    pub fn enable_torque(&mut self, joints: &[JointId]) -> Result<()> {
        self.write_torque(joints, TORQUE_ENABLE)
    }

    /// 失能扭矩（手臂会在重力下松垂）
    pub fn disable_torque(&mut self, joints: &[JointId]) -> Result<()> {
        self.write_torque(joints, TORQUE_DISABLE)
    }

    fn write_torque(&mut self, joints: &[JointId], value: u32) -> Result<()> {
        self.check_known(joints)?;

        let action = if value == TORQUE_ENABLE { "enable" } else { "disable" };
        let mut first_error = None;
        for &joint in joints {
            match self.link.write_register(joint, Register::TorqueEnable, value) {
                Ok(()) => info!("Torque {}d on {}", action, joint),
                Err(e) => {
                    error!("Failed to {} torque on {}: {}", action, joint, e);
                    first_error.get_or_insert(ArmError::from_link(joint, e));
                },
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// 设置运动速度（0..=1023，0 表示舵机最大速度）
    ///
    /// 写失败不致命：记录告警，返回写失败的关节列表。
    pub fn set_speed(&mut self, joints: &[JointId], speed: u16) -> Result<Vec<JointId>> {
        if speed > MAX_MOVING_SPEED {
            return Err(ArmError::InvalidArgument(format!(
                "speed {speed} exceeds {MAX_MOVING_SPEED}"
            )));
        }
        self.check_known(joints)?;

        let mut failed = Vec::new();
        for &joint in joints {
            if let Err(e) = self.link.write_register(joint, Register::MovingSpeed, speed as u32) {
                warn!("Failed to set speed {} on {}: {}", speed, joint, e);
                failed.push(joint);
            }
        }
        debug!("Speed {} applied to {} joint(s)", speed, joints.len() - failed.len());
        Ok(failed)
    }

    /// 读取当前位置（任一读失败即返回错误）
    pub fn read_positions(&mut self, joints: &[JointId]) -> Result<Vec<JointPosition>> {
        self.check_known(joints)?;
        joints
            .iter()
            .map(|&joint| {
                self.link
                    .read_register(joint, Register::PresentPosition)
                    .map_err(|e| ArmError::from_link(joint, e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use dxl_link::{MockBus, MockFailure, MockLink, WriteRecord};

    const IDS: [JointId; 4] = [JointId(1), JointId(2), JointId(3), JointId(4)];

    fn coordinator(bus: &MockBus) -> MotionCoordinator<MockLink, ManualClock> {
        MotionCoordinator::with_clock(bus.link(), IDS, MotionConfig::default(), ManualClock::new())
    }

    #[test]
    fn test_movej_immediate_convergence() {
        let bus = MockBus::with_servos(IDS, 2048);
        let mut arm = coordinator(&bus);

        let report = arm.movej(&[JointId(1), JointId(2)], &[400, 500]).unwrap();
        assert_eq!(report.cycles, 1);
        assert_eq!(report.joints.len(), 2);
        assert!(report.joints.iter().all(|p| p.reached));
        assert_eq!(bus.present(JointId(1)), Some(400));
        assert_eq!(arm.clock().sleep_count(), 0);
    }

    #[test]
    fn test_movej_writes_in_order() {
        let bus = MockBus::with_servos(IDS, 0);
        let mut arm = coordinator(&bus);
        arm.movej(&[JointId(3), JointId(1)], &[30, 10]).unwrap();

        let writes = bus.writes();
        assert_eq!(
            writes,
            vec![
                WriteRecord {
                    id: JointId(3),
                    register: Register::GoalPosition,
                    value: 30
                },
                WriteRecord {
                    id: JointId(1),
                    register: Register::GoalPosition,
                    value: 10
                },
            ]
        );
    }

    #[test]
    fn test_movej_argument_errors_do_no_io() {
        let bus = MockBus::with_servos(IDS, 0);
        let mut arm = coordinator(&bus);

        let cases: [(&[JointId], &[u32]); 4] = [
            (&[JointId(1), JointId(2)], &[1]),
            (&[], &[]),
            (&[JointId(1), JointId(1)], &[1, 2]),
            (&[JointId(7)], &[1]),
        ];
        for (joints, targets) in cases {
            assert!(matches!(
                arm.movej(joints, targets),
                Err(ArmError::InvalidArgument(_))
            ));
        }
        assert_eq!(bus.write_attempts(), 0);
        assert_eq!(bus.read_attempts(), 0);
    }

    #[test]
    fn test_movej_slow_joint_polls_only_pending() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.set_step(JointId(2), 100);
        let mut arm = coordinator(&bus);

        let report = arm.movej(&[JointId(1), JointId(2)], &[500, 500]).unwrap();
        // 关节 2 每次读前进 100：400 仍在阈值外，第 5 次读到 500
        assert_eq!(report.cycles, 5);
        assert_eq!(bus.read_count(JointId(1)), 1);
        assert_eq!(bus.read_count(JointId(2)), 5);
        assert_eq!(arm.clock().sleep_count(), 4);
        assert_eq!(arm.clock().total_slept(), Duration::from_millis(40));
    }

    #[test]
    fn test_movej_zero_poll_interval_still_sleeps() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.set_step(JointId(1), 100);
        let mut arm = coordinator(&bus);
        arm.config_mut().poll_interval = Duration::ZERO;

        let report = arm.movej(&[JointId(1)], &[500]).unwrap();
        assert_eq!(report.cycles, 5);
        assert_eq!(arm.clock().sleep_count(), 4);
        assert_eq!(arm.clock().total_slept(), MIN_POLL_INTERVAL * 4);
    }

    #[test]
    fn test_movej_write_failure_aborts() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.fail_next_write(JointId(2), MockFailure::timeout());
        let mut arm = coordinator(&bus);

        let err = arm
            .movej(&[JointId(1), JointId(2), JointId(3)], &[10, 20, 30])
            .unwrap_err();
        assert!(matches!(err, ArmError::Transport { joint: JointId(2), .. }));
        // 第一个写已生效，不回滚；第三个未尝试
        assert_eq!(bus.goal(JointId(1)), Some(10));
        assert_eq!(bus.write_attempts(), 2);
        assert_eq!(bus.read_attempts(), 0);
    }

    #[test]
    fn test_movej_write_fault_classified() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.fail_next_write(JointId(1), MockFailure::overload());
        let mut arm = coordinator(&bus);

        let err = arm.movej(&[JointId(1)], &[10]).unwrap_err();
        assert!(matches!(err, ArmError::ActuatorFault { joint: JointId(1), .. }));
    }

    #[test]
    fn test_movej_tolerates_read_failures() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.push_read_failure(JointId(1), MockFailure::timeout());
        bus.push_read_failure(JointId(1), MockFailure::overload());
        let mut arm = coordinator(&bus);

        let report = arm.movej(&[JointId(1)], &[300]).unwrap();
        assert_eq!(report.cycles, 3);
        assert_eq!(report.joints[0].failed_reads, 2);
        assert_eq!(report.joints[0].last_observed, Some(300));
    }

    #[test]
    fn test_movej_timeout_reports_pending() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.set_step(JointId(1), 1);
        let mut arm = coordinator(&bus);
        arm.config_mut().timeout = Duration::from_millis(100);

        let err = arm.movej(&[JointId(1), JointId(2)], &[1000, 5]).unwrap_err();
        match err {
            ArmError::MoveTimeout {
                elapsed_ms,
                cycles,
                pending,
            } => {
                assert_eq!(elapsed_ms, 100);
                assert_eq!(cycles, 11);
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].joint, JointId(1));
                assert_eq!(pending[0].last_observed, Some(11));
            },
            other => panic!("Expected MoveTimeout, got {other:?}"),
        }
    }

    #[test]
    fn test_movej_cycle_cap() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.set_step(JointId(1), 1);
        let mut arm = coordinator(&bus);
        arm.config_mut().max_cycles = Some(3);

        let err = arm.movej(&[JointId(1)], &[1000]).unwrap_err();
        assert!(matches!(err, ArmError::MoveTimeout { cycles: 3, .. }));
        assert_eq!(bus.read_count(JointId(1)), 3);
    }

    #[test]
    fn test_movej_cancel_before_first_cycle() {
        let bus = MockBus::with_servos(IDS, 0);
        let mut arm = coordinator(&bus);
        let token = CancelToken::new();
        token.cancel();

        let err = arm.movej_with_cancel(&[JointId(1)], &[100], &token).unwrap_err();
        assert!(matches!(err, ArmError::Cancelled { cycles: 0 }));
        // 写阶段仍然执行
        assert_eq!(bus.goal(JointId(1)), Some(100));
        assert_eq!(bus.read_attempts(), 0);

        token.reset();
        assert!(arm.movej_with_cancel(&[JointId(1)], &[100], &token).is_ok());
    }

    #[test]
    fn test_torque_attempts_every_joint() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.fail_next_write(JointId(2), MockFailure::timeout());
        let mut arm = coordinator(&bus);

        let err = arm.enable_torque(&IDS).unwrap_err();
        assert!(matches!(err, ArmError::Transport { joint: JointId(2), .. }));
        assert_eq!(bus.write_attempts(), 4);
        assert_eq!(bus.torque_enabled(JointId(1)), Some(true));
        assert_eq!(bus.torque_enabled(JointId(2)), Some(false));
        assert_eq!(bus.torque_enabled(JointId(4)), Some(true));

        arm.disable_torque(&IDS).unwrap();
        assert!(IDS.iter().all(|&id| bus.torque_enabled(id) == Some(false)));
    }

    #[test]
    fn test_set_speed_non_fatal() {
        let bus = MockBus::with_servos(IDS, 0);
        bus.fail_next_write(JointId(3), MockFailure::timeout());
        let mut arm = coordinator(&bus);

        let failed = arm.set_speed(&IDS, 20).unwrap();
        assert_eq!(failed, vec![JointId(3)]);
        assert_eq!(bus.speed(JointId(1)), Some(20));
        assert_eq!(bus.speed(JointId(3)), Some(0));
    }

    #[test]
    fn test_set_speed_rejects_out_of_range() {
        let bus = MockBus::with_servos(IDS, 0);
        let mut arm = coordinator(&bus);

        assert!(matches!(
            arm.set_speed(&IDS, 1024),
            Err(ArmError::InvalidArgument(_))
        ));
        assert_eq!(bus.write_attempts(), 0);
        assert!(arm.set_speed(&IDS, 1023).unwrap().is_empty());
    }

    #[test]
    fn test_read_positions() {
        let bus = MockBus::with_servos(IDS, 2048);
        bus.push_reads(JointId(3), [1000]);
        let mut arm = coordinator(&bus);

        assert_eq!(
            arm.read_positions(&[JointId(1), JointId(3)]).unwrap(),
            vec![2048, 1000]
        );

        bus.push_read_failure(JointId(1), MockFailure::timeout());
        assert!(matches!(
            arm.read_positions(&[JointId(1)]),
            Err(ArmError::Transport { .. })
        ));
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!token.is_cancelled());
        other.cancel();
        assert!(token.is_cancelled());
    }
}
