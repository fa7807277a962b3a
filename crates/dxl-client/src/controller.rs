//! 机械臂控制器
//!
//! 把运动协调器、运动学求解器和关节标定组合成一个显式构造的对象：
//!
//! ```rust
//! use dxl_client::{ArmConfig, ArmController};
//! use dxl_client::types::Deg;
//! use dxl_link::MockBus;
//!
//! let config = ArmConfig::default();
//! let bus = MockBus::with_servos(config.joint_ids(), 2048);
//! let mut arm = ArmController::connect(bus.link(), config)?;
//!
//! arm.movep(93.0, 0.0, 143.0, Deg(0.0))?;
//! let pose = arm.current_pose()?;
//! arm.close()?;
//! # Ok::<(), dxl_client::ArmError>(())
//! ```

use tracing::{error, info, warn};

use dxl_link::{ActuatorLink, ChannelOpener};

use crate::calibration::JointCalibration;
use crate::clock::{Clock, SystemClock};
use crate::config::ArmConfig;
use crate::error::{ArmError, Result};
use crate::kinematics::{JointSolution, KinematicsSolver};
use crate::motion::{CancelToken, MotionCoordinator, MoveReport};
use crate::types::{Deg, JointId, JointPosition, Pose3D, Rad};

/// 4 自由度机械臂控制器
///
/// 关节按运动学顺序（基座、肩、肘、腕）排列，与配置中的 `joints` 一致。
pub struct ArmController<L: ActuatorLink, C: Clock = SystemClock> {
    motion: MotionCoordinator<L, C>,
    solver: KinematicsSolver,
    joints: Vec<JointCalibration>,
    ids: Vec<JointId>,
}

impl<L: ActuatorLink> ArmController<L, SystemClock> {
    /// 在已打开的链路上连接机械臂
    ///
    /// 使能所有关节的扭矩并设置初始速度。速度写失败只记录告警。
    pub fn connect(link: L, config: ArmConfig) -> Result<Self> {
        Self::connect_with_clock(link, config, SystemClock)
    }
}

impl<C: Clock> ArmController<Box<dyn ActuatorLink>, C> {
    /// 打开通道并连接（通道打开失败返回 `ArmError::Link`，属于致命错误）
    pub fn open<O>(opener: &O, config: ArmConfig, clock: C) -> Result<Self>
    where
        O: ChannelOpener,
        O::Link: 'static,
    {
        let link = opener.open(&config.channel).map_err(|e| {
            error!("Failed to open {}: {}", config.channel.port, e);
            ArmError::Link(e)
        })?;
        info!(
            "Channel {} opened at {} bps",
            config.channel.port, config.channel.baud_rate
        );
        Self::connect_with_clock(Box::new(link), config, clock)
    }
}

impl<L: ActuatorLink, C: Clock> ArmController<L, C> {
    /// 使用自定义时钟连接
    ///
    /// 扭矩使能失败时会失能所有关节并关闭链路，再返回第一个错误。
    pub fn connect_with_clock(link: L, config: ArmConfig, clock: C) -> Result<Self> {
        config.validate()?;

        let ids = config.joint_ids();
        let mut motion = MotionCoordinator::with_clock(link, ids.iter().copied(), config.motion, clock);

        let prepared = motion
            .enable_torque(&ids)
            .and_then(|()| motion.set_speed(&ids, config.initial_speed));
        let failed = match prepared {
            Ok(failed) => failed,
            Err(e) => {
                error!("Arm connect failed: {}", e);
                if let Err(cleanup) = Self::shutdown(motion, &ids) {
                    warn!("Cleanup after failed connect: {}", cleanup);
                }
                return Err(e);
            },
        };
        if !failed.is_empty() {
            warn!("Initial speed not applied to {:?}", failed);
        }
        info!("Arm connected ({} joints)", ids.len());

        Ok(Self {
            motion,
            solver: KinematicsSolver::new(config.geometry),
            joints: config.joints,
            ids,
        })
    }

    pub fn solver(&self) -> &KinematicsSolver {
        &self.solver
    }

    pub fn motion(&self) -> &MotionCoordinator<L, C> {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut MotionCoordinator<L, C> {
        &mut self.motion
    }

    pub fn joints(&self) -> &[JointCalibration] {
        &self.joints
    }

    pub fn joint_ids(&self) -> &[JointId] {
        &self.ids
    }

    /// 所有关节的 movej（目标按运动学顺序）
    pub fn movej(&mut self, targets: &[JointPosition]) -> Result<MoveReport> {
        self.motion.movej(&self.ids, targets)
    }

    /// 指定关节的 movej
    pub fn movej_joints(
        &mut self,
        joints: &[JointId],
        targets: &[JointPosition],
    ) -> Result<MoveReport> {
        self.motion.movej(joints, targets)
    }

    pub fn movej_with_cancel(
        &mut self,
        targets: &[JointPosition],
        cancel: &CancelToken,
    ) -> Result<MoveReport> {
        self.motion.movej_with_cancel(&self.ids, targets, cancel)
    }

    /// 笛卡尔目标 → 各关节编码器目标
    ///
    /// 腕关节角 `wrist` 由调用方指定；位置 `(x, y, z)` 是腕关节中心。
    pub fn joint_targets(&self, x: f64, y: f64, z: f64, wrist: Deg) -> Result<Vec<JointPosition>> {
        let solution = self.solver.inverse_kinematics(x, y, z)?;
        let angles = [
            solution.base,
            solution.shoulder,
            solution.elbow,
            wrist.to_rad(),
        ];
        self.joints
            .iter()
            .zip(angles)
            .map(|(calibration, angle)| calibration.to_raw(angle))
            .collect()
    }

    /// 笛卡尔空间运动
    ///
    /// 逆解失败时不发生任何 I/O。
    pub fn movep(&mut self, x: f64, y: f64, z: f64, wrist: Deg) -> Result<MoveReport> {
        let targets = self.joint_targets(x, y, z, wrist)?;
        info!("movep ({:.1}, {:.1}, {:.1}) -> {:?}", x, y, z, targets);
        self.movej(&targets)
    }

    /// 正运动学
    pub fn forward_kinematics(&self, t1: Deg, t2: Deg, t3: Deg, t4: Deg) -> Pose3D {
        self.solver.forward_kinematics(t1, t2, t3, t4)
    }

    /// 读取当前关节角
    pub fn joint_angles(&mut self) -> Result<Vec<Rad>> {
        let positions = self.motion.read_positions(&self.ids)?;
        Ok(self
            .joints
            .iter()
            .zip(positions)
            .map(|(calibration, raw)| calibration.to_angle(raw))
            .collect())
    }

    /// 当前末端位姿（读取位置 → 关节角 → 正运动学）
    pub fn current_pose(&mut self) -> Result<Pose3D> {
        match self.joint_angles()?.as_slice() {
            &[base, shoulder, elbow, wrist] => Ok(self.solver.forward_kinematics_rad(
                &JointSolution {
                    base,
                    shoulder,
                    elbow,
                },
                wrist,
            )),
            other => Err(ArmError::Config(format!(
                "expected 4 joint angles, got {}",
                other.len()
            ))),
        }
    }

    /// 设置所有关节的速度，返回写失败的关节
    pub fn set_speed(&mut self, speed: u16) -> Result<Vec<JointId>> {
        self.motion.set_speed(&self.ids, speed)
    }

    pub fn enable_torque(&mut self) -> Result<()> {
        self.motion.enable_torque(&self.ids)
    }

    pub fn disable_torque(&mut self) -> Result<()> {
        self.motion.disable_torque(&self.ids)
    }

    /// 失能扭矩并关闭通道
    ///
    /// 扭矩失能失败时仍会关闭通道，返回第一个错误。
    pub fn close(self) -> Result<()> {
        let Self { motion, ids, .. } = self;
        Self::shutdown(motion, &ids)
    }

    fn shutdown(mut motion: MotionCoordinator<L, C>, ids: &[JointId]) -> Result<()> {
        let torque = motion.disable_torque(ids);
        let closed = motion.link_mut().close().map_err(ArmError::Link);
        info!("Arm closed");
        torque.and(closed)
    }
}
