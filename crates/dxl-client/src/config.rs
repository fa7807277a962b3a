//! 机械臂配置（TOML）
//!
//! ```toml
//! initial_speed = 20
//!
//! [channel]
//! port = "/dev/ttyUSB0"
//! baud_rate = 1000000
//!
//! [geometry]
//! d1 = 50.0
//! a2 = 93.0
//! a3 = 93.0
//! a4 = 50.0
//!
//! [motion]
//! moving_threshold = 20
//! poll_interval_ms = 10
//! timeout_ms = 10000
//!
//! [[joints]]
//! id = 1
//! zero_offset = 2048
//! direction = "normal"
//! ```
//!
//! 所有字段都有默认值；缺省的 `joints` 为 ID 1..=4 的 MX 默认标定。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use dxl_link::ChannelConfig;
use dxl_protocol::MAX_MOVING_SPEED;

use crate::calibration::JointCalibration;
use crate::error::{ArmError, Result};
use crate::kinematics::ArmGeometry;
use crate::motion::MotionConfig;
use crate::types::JointId;

/// 关节数（4 自由度）
pub const JOINT_COUNT: usize = 4;

/// 默认运动速度
pub const DEFAULT_INITIAL_SPEED: u16 = 20;

/// `Duration` 以毫秒整数序列化
pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// 完整的机械臂配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// 连接时设置的运动速度
    pub initial_speed: u16,
    pub channel: ChannelConfig,
    pub geometry: ArmGeometry,
    pub motion: MotionConfig,
    /// 按运动学顺序（基座、肩、肘、腕）排列
    pub joints: Vec<JointCalibration>,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            initial_speed: DEFAULT_INITIAL_SPEED,
            channel: ChannelConfig::default(),
            geometry: ArmGeometry::default(),
            motion: MotionConfig::default(),
            joints: (1..=JOINT_COUNT as u8)
                .map(|id| JointCalibration::mx(JointId(id)))
                .collect(),
        }
    }
}

impl ArmConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ArmConfig = toml::from_str(content)
            .map_err(|e| ArmError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ArmError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ArmError::Config(format!("serialize: {e}")))
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        fs::write(path, content)
            .map_err(|e| ArmError::Config(format!("failed to write {}: {e}", path.display())))
    }

    /// 关节 ID（运动学顺序）
    pub fn joint_ids(&self) -> Vec<JointId> {
        self.joints.iter().map(|j| j.id).collect()
    }

    /// 校验配置
    ///
    /// 几何参数在反序列化时已经校验。
    pub fn validate(&self) -> Result<()> {
        if self.joints.len() != JOINT_COUNT {
            return Err(ArmError::Config(format!(
                "expected {JOINT_COUNT} joints, found {}",
                self.joints.len()
            )));
        }
        let mut seen = BTreeSet::new();
        for joint in &self.joints {
            joint.validate()?;
            if !seen.insert(joint.id) {
                return Err(ArmError::Config(format!("duplicate joint {}", joint.id)));
            }
        }
        if self.initial_speed > MAX_MOVING_SPEED {
            return Err(ArmError::Config(format!(
                "initial_speed {} exceeds {MAX_MOVING_SPEED}",
                self.initial_speed
            )));
        }
        if self.motion.poll_interval.is_zero() {
            return Err(ArmError::Config("poll_interval_ms must be positive".to_string()));
        }
        if self.channel.port.is_empty() {
            return Err(ArmError::Config("channel port must not be empty".to_string()));
        }
        if self.channel.baud_rate == 0 {
            return Err(ArmError::Config("channel baud_rate must be positive".to_string()));
        }
        Ok(())
    }
}
