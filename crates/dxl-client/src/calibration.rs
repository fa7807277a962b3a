//! 关节标定
//!
//! 编码器原始值与关节角之间的仿射映射：
//!
//! ```text
//! raw = zero_offset + direction · angle · ticks_per_rev / 2π
//! ```
//!
//! `min` / `max` 记录舵机的机械行程，只用于查询（[`JointCalibration::within_travel`]），
//! movej 不会据此拒绝目标。

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use dxl_protocol::{MX_CENTER_POSITION, MX_TICKS_PER_REV};

use crate::error::{ArmError, Result};
use crate::types::{JointId, JointPosition, Rad};

/// 编码器计数方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 关节角增大时编码器值增大
    #[default]
    Normal,
    /// 关节角增大时编码器值减小
    Reversed,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Normal => 1.0,
            Direction::Reversed => -1.0,
        }
    }
}

/// 单个关节的标定参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointCalibration {
    pub id: JointId,
    /// 关节角为 0 时的编码器值
    #[serde(default = "default_zero_offset")]
    pub zero_offset: JointPosition,
    #[serde(default)]
    pub direction: Direction,
    /// 每圈编码器计数
    #[serde(default = "default_ticks_per_rev")]
    pub ticks_per_rev: u32,
    /// 行程下限（编码器值）
    #[serde(default)]
    pub min: JointPosition,
    /// 行程上限（编码器值）
    #[serde(default = "default_max")]
    pub max: JointPosition,
}

fn default_zero_offset() -> JointPosition {
    MX_CENTER_POSITION
}

fn default_ticks_per_rev() -> u32 {
    MX_TICKS_PER_REV
}

fn default_max() -> JointPosition {
    MX_TICKS_PER_REV - 1
}

impl JointCalibration {
    /// MX 系列默认标定：4096 计数/圈，中点 2048 为零位，行程 0..=4095
    pub fn mx(id: JointId) -> Self {
        Self {
            id,
            zero_offset: default_zero_offset(),
            direction: Direction::Normal,
            ticks_per_rev: default_ticks_per_rev(),
            min: 0,
            max: default_max(),
        }
    }

    pub fn ticks_per_rad(&self) -> f64 {
        self.ticks_per_rev as f64 / TAU
    }

    /// 关节角 → 编码器值（四舍五入）
    ///
    /// # 错误
    ///
    /// - `ArmError::InvalidArgument`: 角度非有限值，或换算结果无法用编码器值表示
    pub fn to_raw(&self, angle: Rad) -> Result<JointPosition> {
        let raw = self.zero_offset as f64 + self.direction.sign() * angle.0 * self.ticks_per_rad();
        let rounded = raw.round();
        if !rounded.is_finite() || rounded < 0.0 || rounded > u32::MAX as f64 {
            return Err(ArmError::InvalidArgument(format!(
                "angle {} on {} maps to unrepresentable position {:.1}",
                angle, self.id, raw
            )));
        }
        Ok(rounded as JointPosition)
    }

    /// 编码器值 → 关节角
    pub fn to_angle(&self, raw: JointPosition) -> Rad {
        let ticks = raw as f64 - self.zero_offset as f64;
        Rad(self.direction.sign() * ticks / self.ticks_per_rad())
    }

    /// 编码器值是否在机械行程内
    pub fn within_travel(&self, raw: JointPosition) -> bool {
        (self.min..=self.max).contains(&raw)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.id.raw() > JointId::MAX_UNICAST {
            return Err(ArmError::Config(format!("joint id {} is not a unicast id", self.id)));
        }
        if self.ticks_per_rev == 0 {
            return Err(ArmError::Config(format!("{}: ticks_per_rev must be positive", self.id)));
        }
        if self.min > self.max {
            return Err(ArmError::Config(format!(
                "{}: travel min {} exceeds max {}",
                self.id, self.min, self.max
            )));
        }
        Ok(())
    }
}
