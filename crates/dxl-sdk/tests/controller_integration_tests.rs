//! ArmController 端到端测试（模拟总线）

use dxl_sdk::client::types::{Deg, Pose3D};
use dxl_sdk::client::{JOINT_COUNT, ManualClock};
use dxl_sdk::link::{MockBus, MockOpener};
use dxl_sdk::{ArmConfig, ArmController, ArmError, JointId, JointSolution, LinkError};
use std::io::Write;

const CONFIG: &str = r#"
initial_speed = 50

[channel]
port = "COM14"

[motion]
moving_threshold = 2
poll_interval_ms = 5
timeout_ms = 2000

[[joints]]
id = 1
[[joints]]
id = 2
[[joints]]
id = 3
direction = "reversed"
[[joints]]
id = 4
"#;

fn load_config() -> ArmConfig {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    ArmConfig::load(file.path()).unwrap()
}

#[test]
fn test_config_file_to_motion() {
    let config = load_config();
    assert_eq!(config.joints.len(), JOINT_COUNT);
    assert_eq!(config.channel.baud_rate, 1_000_000);

    let bus = MockBus::with_servos(config.joint_ids(), 2048);
    // 每次读取前进 64 个计数，模拟真实舵机的有限速度
    for id in config.joint_ids() {
        bus.set_step(id, 64);
    }
    let opener = MockOpener::new(bus.clone());
    let mut arm = ArmController::open(&opener, config, ManualClock::new()).unwrap();

    for id in 1..=4 {
        assert_eq!(bus.torque_enabled(JointId(id)), Some(true));
        assert_eq!(bus.speed(JointId(id)), Some(50));
    }

    let target = Pose3D::new(120.0, 40.0, 100.0);
    let report = arm.movep(target.x, target.y, target.z, Deg(-30.0)).unwrap();
    assert!(report.cycles > 1);

    // 编码器量化误差内回到目标腕心
    let angles = arm.joint_angles().unwrap();
    let solution = JointSolution {
        base: angles[0],
        shoulder: angles[1],
        elbow: angles[2],
    };
    let wrist = arm.solver().wrist_position(&solution);
    assert!(wrist.distance_to(&target) < 1.0, "wrist at {wrist}");
    assert!((angles[3].to_deg().0 + 30.0).abs() < 0.1);

    // 反向关节：肘部弯曲为负角，编码器值大于中点
    assert!(bus.goal(JointId(3)).unwrap() > 2048);

    arm.close().unwrap();
    assert!(bus.is_closed());
    assert_eq!(bus.torque_enabled(JointId(1)), Some(false));
}

#[test]
fn test_current_pose_matches_forward_kinematics() {
    let config = ArmConfig::default();
    let bus = MockBus::with_servos(config.joint_ids(), 2048);
    let mut arm = ArmController::connect_with_clock(bus.link(), config, ManualClock::new()).unwrap();

    // 基座 +90°（3072），其余归零
    arm.movej(&[3072, 2048, 2048, 2048]).unwrap();
    let pose = arm.current_pose().unwrap();
    let expected = arm.forward_kinematics(Deg(90.0), Deg(0.0), Deg(0.0), Deg(0.0));
    assert!(pose.distance_to(&expected) < 1e-9);
    assert!((pose.z - 286.0).abs() < 1e-9);
}

#[test]
fn test_unreachable_movep_has_no_side_effects() {
    let config = ArmConfig::default();
    let bus = MockBus::with_servos(config.joint_ids(), 2048);
    let mut arm = ArmController::connect_with_clock(bus.link(), config, ManualClock::new()).unwrap();
    let writes = bus.write_attempts();
    let reads = bus.read_attempts();

    assert!(matches!(
        arm.movep(0.0, 0.0, 1000.0, Deg(0.0)),
        Err(ArmError::UnreachablePose { .. })
    ));
    assert_eq!(bus.write_attempts(), writes);
    assert_eq!(bus.read_attempts(), reads);
}

#[test]
fn test_channel_open_failure_is_fatal() {
    let mut config = ArmConfig::default();
    config.channel.baud_rate = 0;
    let opener = MockOpener::new(MockBus::new());

    let err = ArmController::open(&opener, config, ManualClock::new()).err().expect("open should fail");
    assert!(matches!(err, ArmError::Link(LinkError::BaudRate { .. })));
    assert!(err.is_fatal());
}

#[test]
fn test_speed_failures_are_reported_not_raised() {
    let config = ArmConfig::default();
    let bus = MockBus::with_servos(config.joint_ids(), 2048);
    let mut arm = ArmController::connect_with_clock(bus.link(), config, ManualClock::new()).unwrap();

    bus.fail_next_write(JointId(4), dxl_sdk::link::MockFailure::timeout());
    assert_eq!(arm.set_speed(100).unwrap(), vec![JointId(4)]);
    assert_eq!(bus.speed(JointId(1)), Some(100));
}

#[test]
fn test_init_logger_is_idempotent() {
    dxl_sdk::init_logger();
    dxl_sdk::init_logger();
    log::info!("forwarded through LogTracer");
    tracing::info!("direct tracing event");
}
