//! 关节角单位
//!
//! 运动学内部用弧度（[`Rad`]），对外接口接受角度（[`Deg`]）：
//!
//! ```rust
//! use dxl_client::types::{Deg, Rad};
//!
//! let elbow: Rad = Deg(-90.0).into();
//! assert!((elbow.0 + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// 弧度
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rad(pub f64);

/// 角度
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deg(pub f64);

impl Rad {
    #[inline]
    pub fn to_deg(self) -> Deg {
        Deg(self.0.to_degrees())
    }

    #[inline]
    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    #[inline]
    pub fn cos(self) -> f64 {
        self.0.cos()
    }
}

impl Deg {
    #[inline]
    pub fn to_rad(self) -> Rad {
        Rad(self.0.to_radians())
    }
}

impl From<Deg> for Rad {
    fn from(deg: Deg) -> Self {
        deg.to_rad()
    }
}

impl From<Rad> for Deg {
    fn from(rad: Rad) -> Self {
        rad.to_deg()
    }
}

impl fmt::Display for Rad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

impl fmt::Display for Deg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_joint_angle_conversions() {
        assert!((Deg(180.0).to_rad().0 - PI).abs() < 1e-12);
        assert!((Rad(-FRAC_PI_2).to_deg().0 + 90.0).abs() < 1e-12);

        let shoulder: Deg = Rad(FRAC_PI_2).into();
        assert!((shoulder.0 - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_trig_on_rad() {
        let base = Deg(30.0).to_rad();
        assert!((base.sin() - 0.5).abs() < 1e-12);
        assert!((base.cos() - 3f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rad(1.0).to_string(), "1.0000 rad");
        assert_eq!(Deg(-45.0).to_string(), "-45.00°");
    }
}
