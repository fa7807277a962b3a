//! 正/逆运动学
//!
//! 4 自由度串联臂：基座绕 z 轴旋转（θ1），肩、肘、腕三个俯仰关节（θ2..θ4）
//! 位于同一竖直平面内。
//!
//! ```text
//!            a3         a4
//!     elbow o-------o-------> tool
//!          /       wrist
//!      a2 /
//!        /
//!  shoulder o   (高度 d1)
//!        |
//!   base =====  θ1 绕 z 轴
//! ```
//!
//! # 角度约定
//!
//! - θ2 = 0 时上臂竖直向上（肩部仰角 α = θ2 + π/2）
//! - θ3、θ4 是相对于前一连杆的转角
//!
//! # 逆解分支
//!
//! 二连杆平面逆解有两个几何解。这里只实现 θ3 = −acos(cosθ3) 的一支
//! （本库称为 elbow-down）。另一支（θ3 = +acos(cosθ3)，φ1 取负）未实现。

use serde::{Deserialize, Serialize};

use crate::error::{ArmError, Result};
use crate::types::{Deg, Pose3D, Rad};

/// cosθ3 超出 [-1, 1] 的容差
const COS_TOLERANCE: f64 = 1e-9;

/// 判定奇异（r ≈ 0、c ≈ 0）的阈值
const SINGULARITY_EPS: f64 = 1e-9;

/// 机械臂几何参数（构造后不可变）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeometryRepr", into = "GeometryRepr")]
pub struct ArmGeometry {
    d1: f64,
    a2: f64,
    a3: f64,
    a4: f64,
}

#[derive(Serialize, Deserialize)]
struct GeometryRepr {
    d1: f64,
    a2: f64,
    a3: f64,
    a4: f64,
}

impl TryFrom<GeometryRepr> for ArmGeometry {
    type Error = ArmError;

    fn try_from(repr: GeometryRepr) -> Result<Self> {
        ArmGeometry::new(repr.d1, repr.a2, repr.a3, repr.a4)
    }
}

impl From<ArmGeometry> for GeometryRepr {
    fn from(g: ArmGeometry) -> Self {
        GeometryRepr {
            d1: g.d1,
            a2: g.a2,
            a3: g.a3,
            a4: g.a4,
        }
    }
}

impl ArmGeometry {
    /// 创建几何参数
    ///
    /// # 参数
    ///
    /// - `d1`: 肩关节相对基座的高度
    /// - `a2`: 上臂长度（必须 > 0）
    /// - `a3`: 前臂长度（必须 > 0）
    /// - `a4`: 腕部到末端的长度
    ///
    /// # 错误
    ///
    /// - `ArmError::Config`: 参数非有限值、`a2`/`a3` 不为正，或 `d1`/`a4` 为负
    pub fn new(d1: f64, a2: f64, a3: f64, a4: f64) -> Result<Self> {
        for (name, value) in [("d1", d1), ("a2", a2), ("a3", a3), ("a4", a4)] {
            if !value.is_finite() {
                return Err(ArmError::Config(format!("geometry {name} must be finite")));
            }
        }
        if a2 <= 0.0 || a3 <= 0.0 {
            return Err(ArmError::Config(
                "geometry link lengths a2 and a3 must be positive".to_string(),
            ));
        }
        if d1 < 0.0 || a4 < 0.0 {
            return Err(ArmError::Config(
                "geometry d1 and a4 must not be negative".to_string(),
            ));
        }
        Ok(Self { d1, a2, a3, a4 })
    }

    pub fn d1(&self) -> f64 {
        self.d1
    }

    pub fn a2(&self) -> f64 {
        self.a2
    }

    pub fn a3(&self) -> f64 {
        self.a3
    }

    pub fn a4(&self) -> f64 {
        self.a4
    }
}

impl Default for ArmGeometry {
    /// 默认几何：d1=50, a2=93, a3=93, a4=50
    fn default() -> Self {
        Self {
            d1: 50.0,
            a2: 93.0,
            a3: 93.0,
            a4: 50.0,
        }
    }
}

/// 逆解结果（弧度）
///
/// 只包含前三个关节；腕关节（θ4）是调用方自由指定的参数。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointSolution {
    /// θ1：基座旋转
    pub base: Rad,
    /// θ2：肩部俯仰
    pub shoulder: Rad,
    /// θ3：肘部俯仰
    pub elbow: Rad,
}

impl JointSolution {
    /// 转换为角度 `[θ1, θ2, θ3]`
    pub fn to_degrees(&self) -> [Deg; 3] {
        [
            self.base.to_deg(),
            self.shoulder.to_deg(),
            self.elbow.to_deg(),
        ]
    }
}

/// 运动学求解器
///
/// 纯函数，无内部状态，可随意复制。
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicsSolver {
    geometry: ArmGeometry,
}

impl KinematicsSolver {
    pub fn new(geometry: ArmGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    /// 正运动学（角度输入）
    ///
    /// 对任何有限输入都不会失败；输入是否在舵机行程内由调用方负责。
    ///
    /// # 示例
    ///
    /// ```rust
    /// use dxl_client::{ArmGeometry, KinematicsSolver};
    /// use dxl_client::types::Deg;
    ///
    /// let solver = KinematicsSolver::new(ArmGeometry::default());
    /// let pose = solver.forward_kinematics(Deg(0.0), Deg(0.0), Deg(0.0), Deg(0.0));
    /// // 全部关节归零时手臂竖直向上：d1 + a2 + a3 + a4
    /// assert!((pose.z - 286.0).abs() < 1e-9);
    /// ```
    pub fn forward_kinematics(&self, theta1: Deg, theta2: Deg, theta3: Deg, theta4: Deg) -> Pose3D {
        self.forward_rad(theta1.to_rad(), theta2.to_rad(), theta3.to_rad(), theta4.to_rad())
    }

    /// 正运动学（逆解结果 + 腕关节角）
    pub fn forward_kinematics_rad(&self, solution: &JointSolution, wrist: Rad) -> Pose3D {
        self.forward_rad(solution.base, solution.shoulder, solution.elbow, wrist)
    }

    /// 腕关节中心位置（不含 a4 连杆）
    ///
    /// 逆运动学求解的正是这个点。
    pub fn wrist_position(&self, solution: &JointSolution) -> Pose3D {
        let g = &self.geometry;
        let alpha = solution.shoulder.0 + std::f64::consts::FRAC_PI_2;
        let beta = alpha + solution.elbow.0;

        let rho = g.a2 * alpha.cos() + g.a3 * beta.cos();
        let height = g.d1 + g.a2 * alpha.sin() + g.a3 * beta.sin();
        Pose3D::new(
            rho * solution.base.cos(),
            rho * solution.base.sin(),
            height,
        )
    }

    fn forward_rad(&self, theta1: Rad, theta2: Rad, theta3: Rad, theta4: Rad) -> Pose3D {
        let g = &self.geometry;

        // 各连杆相对水平面的仰角
        let alpha = theta2.0 + std::f64::consts::FRAC_PI_2;
        let beta = alpha + theta3.0;
        let gamma = beta + theta4.0;

        // 竖直平面内的径向距离与高度
        let rho = g.a2 * alpha.cos() + g.a3 * beta.cos() + g.a4 * gamma.cos();
        let height = g.d1 + g.a2 * alpha.sin() + g.a3 * beta.sin() + g.a4 * gamma.sin();

        Pose3D::new(rho * theta1.cos(), rho * theta1.sin(), height)
    }

    /// 计算 cosθ3（不做范围检查）
    fn cos_theta3(&self, r: f64, s: f64) -> f64 {
        let g = &self.geometry;
        (r * r + s * s - g.a2 * g.a2 - g.a3 * g.a3) / (2.0 * g.a2 * g.a3)
    }

    /// 逆运动学
    ///
    /// 求解使腕关节中心位于 `(x, y, z)` 的 θ1..θ3。
    ///
    /// # 错误
    ///
    /// - `ArmError::UnreachablePose`: 目标点到肩关节的距离不在
    ///   `[|a2 − a3|, a2 + a3]` 内（或输入非有限值）。不返回部分结果。
    ///
    /// # 奇异位形
    ///
    /// - `x = y = 0`（基座奇异）：θ1 取 0
    /// - 目标与肩关节重合（仅 `a2 = a3` 时可达）：φ1 取 0
    pub fn inverse_kinematics(&self, x: f64, y: f64, z: f64) -> Result<JointSolution> {
        let g = &self.geometry;

        let r = (x * x + y * y).sqrt();
        let s = z - g.d1;
        let c = (r * r + s * s).sqrt();

        let cos_theta3 = self.cos_theta3(r, s);
        if !cos_theta3.is_finite() || cos_theta3.abs() > 1.0 + COS_TOLERANCE {
            return Err(ArmError::UnreachablePose {
                x,
                y,
                z,
                cos_theta3,
            });
        }
        let cos_theta3 = cos_theta3.clamp(-1.0, 1.0);

        let theta1 = if r < SINGULARITY_EPS { 0.0 } else { y.atan2(x) };

        let phi1 = if c < SINGULARITY_EPS {
            0.0
        } else {
            ((g.a2 * g.a2 + c * c - g.a3 * g.a3) / (2.0 * g.a2 * c))
                .clamp(-1.0, 1.0)
                .acos()
        };
        let phi2 = s.atan2(r);

        let theta2 = -(std::f64::consts::FRAC_PI_2 - phi1 - phi2);
        let theta3 = -cos_theta3.acos();

        Ok(JointSolution {
            base: Rad(theta1),
            shoulder: Rad(theta2),
            elbow: Rad(theta3),
        })
    }

    /// 工作空间环的内外半径（以肩关节为圆心）
    pub fn workspace_bounds(&self) -> (f64, f64) {
        let g = &self.geometry;
        ((g.a2 - g.a3).abs(), g.a2 + g.a3)
    }

    /// 目标点是否可达
    pub fn is_reachable(&self, x: f64, y: f64, z: f64) -> bool {
        self.inverse_kinematics(x, y, z).is_ok()
    }
}
