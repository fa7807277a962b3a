//! 笛卡尔位置

use serde::{Deserialize, Serialize};
use std::fmt;

/// 末端执行器的三维位置，长度单位与 [`ArmGeometry`](crate::ArmGeometry) 一致
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Pose3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Pose3D { x, y, z }
    }

    /// 到另一点的欧氏距离
    pub fn distance_to(&self, other: &Pose3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// 三个分量是否都是有限值
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Pose3D {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Pose3D { x, y, z }
    }
}

impl fmt::Display for Pose3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}
