//! 运动学命令

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use dxl_sdk::KinematicsSolver;
use dxl_sdk::client::types::{Deg, Pose3D};

use super::load_config;

/// 正运动学命令参数
#[derive(Args, Debug)]
pub struct FkCommand {
    /// 基座角（度）
    #[arg(allow_hyphen_values = true)]
    pub t1: f64,
    /// 肩部角（度）
    #[arg(allow_hyphen_values = true)]
    pub t2: f64,
    /// 肘部角（度）
    #[arg(allow_hyphen_values = true)]
    pub t3: f64,
    /// 腕部角（度）
    #[arg(allow_hyphen_values = true)]
    pub t4: f64,

    /// 配置文件（几何参数）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl FkCommand {
    pub fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let solver = KinematicsSolver::new(config.geometry);
        let pose = solver.forward_kinematics(Deg(self.t1), Deg(self.t2), Deg(self.t3), Deg(self.t4));

        if self.json {
            println!("{}", serde_json::to_string_pretty(&pose)?);
        } else {
            println!("{pose}");
        }
        Ok(())
    }
}

/// 逆运动学命令参数
#[derive(Args, Debug)]
pub struct IkCommand {
    #[arg(allow_hyphen_values = true)]
    pub x: f64,
    #[arg(allow_hyphen_values = true)]
    pub y: f64,
    #[arg(allow_hyphen_values = true)]
    pub z: f64,

    /// 腕部角（度），只影响编码器目标
    #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub wrist: f64,

    /// 配置文件（几何参数 + 关节标定）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON 输出
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct IkOutput {
    target: Pose3D,
    /// θ1..θ4（度）
    angles_deg: [f64; 4],
    /// 各关节编码器目标
    raw_targets: Vec<u32>,
}

impl IkCommand {
    pub fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let solver = KinematicsSolver::new(config.geometry);

        let solution = solver
            .inverse_kinematics(self.x, self.y, self.z)
            .with_context(|| format!("逆解失败: ({}, {}, {})", self.x, self.y, self.z))?;
        let [base, shoulder, elbow] = solution.to_degrees();
        let wrist = Deg(self.wrist);

        let raw_targets = config
            .joints
            .iter()
            .zip([base, shoulder, elbow, wrist])
            .map(|(calibration, angle)| calibration.to_raw(angle.to_rad()))
            .collect::<Result<Vec<_>, _>>()?;

        let output = IkOutput {
            target: Pose3D::new(self.x, self.y, self.z),
            angles_deg: [base.0, shoulder.0, elbow.0, wrist.0],
            raw_targets,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("目标腕心: {}", output.target);
            for (i, (angle, raw)) in output.angles_deg.iter().zip(&output.raw_targets).enumerate() {
                println!("  J{}: {:>8.2}°  raw {}", i + 1, angle, raw);
            }
        }
        Ok(())
    }
}
