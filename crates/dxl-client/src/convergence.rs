//! 单次 movej 的收敛状态
//!
//! 每个关节一条 [`JointProgress`]。到位标志是“粘滞”的：一旦某次读数落入阈值，
//! 该关节在本次运动中不再被读取。

use serde::Serialize;
use smallvec::SmallVec;

use crate::types::{JointId, JointPosition};

/// 单个关节的收敛进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JointProgress {
    pub joint: JointId,
    pub target: JointPosition,
    /// 最近一次成功读到的当前位置
    pub last_observed: Option<JointPosition>,
    pub reached: bool,
    /// 轮询阶段累计的读失败次数
    pub failed_reads: u32,
}

impl JointProgress {
    pub fn new(joint: JointId, target: JointPosition) -> Self {
        Self {
            joint,
            target,
            last_observed: None,
            reached: false,
            failed_reads: 0,
        }
    }

    /// 与目标的距离（尚无读数时为 `None`）
    pub fn error(&self) -> Option<u32> {
        self.last_observed.map(|present| present.abs_diff(self.target))
    }
}

/// 一次 movej 内所有关节的收敛状态
///
/// 在 movej 内创建，返回时被消费（转为报告或超时错误）。
#[derive(Debug)]
pub(crate) struct ConvergenceState {
    joints: SmallVec<[JointProgress; 4]>,
    threshold: u32,
}

impl ConvergenceState {
    pub(crate) fn new(joints: &[JointId], targets: &[JointPosition], threshold: u32) -> Self {
        Self {
            joints: joints
                .iter()
                .zip(targets)
                .map(|(&joint, &target)| JointProgress::new(joint, target))
                .collect(),
            threshold,
        }
    }

    /// 本轮需要读取的关节（尚未到位）
    pub(crate) fn pending_ids(&self) -> SmallVec<[JointId; 4]> {
        self.joints
            .iter()
            .filter(|p| !p.reached)
            .map(|p| p.joint)
            .collect()
    }

    /// 记录一次成功读数，返回该关节是否因此到位
    pub(crate) fn observe(&mut self, joint: JointId, present: JointPosition) -> bool {
        let threshold = self.threshold;
        match self.joints.iter_mut().find(|p| p.joint == joint) {
            Some(progress) => {
                progress.last_observed = Some(present);
                if present.abs_diff(progress.target) <= threshold {
                    progress.reached = true;
                }
                progress.reached
            },
            None => false,
        }
    }

    /// 记录一次读失败
    pub(crate) fn record_failure(&mut self, joint: JointId) {
        if let Some(progress) = self.joints.iter_mut().find(|p| p.joint == joint) {
            progress.failed_reads += 1;
        }
    }

    pub(crate) fn all_reached(&self) -> bool {
        self.joints.iter().all(|p| p.reached)
    }

    pub(crate) fn pending(&self) -> Vec<JointProgress> {
        self.joints.iter().filter(|p| !p.reached).cloned().collect()
    }

    pub(crate) fn into_progress(self) -> Vec<JointProgress> {
        self.joints.into_vec()
    }
}
