use attitude_rig::{ConfigError, RotorModel, SimConfig, Simulation};

fn rejected_parameter(config: &SimConfig) -> &'static str {
    match config.validate() {
        Err(ConfigError::InvalidParameter { name, .. }) => name,
        other => panic!("expected an invalid parameter, got {other:?}"),
    }
}

#[test]
fn test_partial_document() {
    let source = r#"
        (
            estimator: (kp: 3.0),
            dynamics: (use_sine: true, sine_frequency_hz: 2.0),
            rotor: (model: Physics),
            control: (use_fixed_dt: true, fixed_dt: 0.002),
            history: (window_seconds: 30.0),
        )
    "#;

    let config = SimConfig::from_ron_str(source).unwrap();

    assert_eq!(config.estimator.kp, 3.0);
    assert_eq!(config.estimator.ki, 0.05);
    assert!(config.dynamics.use_sine);
    assert_eq!(config.dynamics.sine_frequency_hz, 2.0);
    assert_eq!(config.dynamics.time_constant, 1.0);
    assert_eq!(config.rotor.model, RotorModel::Physics);
    assert!(config.control.use_fixed_dt);
    assert_eq!(config.control.fixed_dt, 0.002);
    assert_eq!(config.history.window_seconds, 30.0);
    assert_eq!(config.history.sample_interval, 0.05);
    assert!(config.validate().is_ok());
}

#[test]
fn test_ron_round_trip() {
    let mut config = SimConfig::default();
    config.sensor.gyro_bias.x = 0.01;
    config.vehicle.inertia.z = 0.12;
    config.bus_voltage = 11.1;

    let text = config.to_ron_string().unwrap();
    let parsed = SimConfig::from_ron_str(&text).unwrap();

    assert_eq!(parsed, config);
}

#[test]
fn test_parse_error() {
    let result = SimConfig::from_ron_str("(estimator: (kp: \"fast\"))");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_missing_file() {
    let result = SimConfig::from_path("does/not/exist.ron");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_validation_rules() {
    let mut config = SimConfig::default();
    config.sensor.gravity = 0.0;
    assert_eq!(rejected_parameter(&config), "sensor.gravity");

    let mut config = SimConfig::default();
    config.estimator.kp = f64::NAN;
    assert_eq!(rejected_parameter(&config), "estimator.kp");

    let mut config = SimConfig::default();
    config.rotor.thrust_coefficient = -1e-4;
    assert_eq!(rejected_parameter(&config), "rotor.thrust_coefficient");

    let mut config = SimConfig::default();
    config.vehicle.inertia.y = 0.0;
    assert_eq!(rejected_parameter(&config), "vehicle.inertia");

    let mut config = SimConfig::default();
    config.control.fixed_dt = 1.0;
    assert_eq!(rejected_parameter(&config), "control.fixed_dt");

    let mut config = SimConfig::default();
    config.control.time_scale = -1.0;
    assert_eq!(rejected_parameter(&config), "control.time_scale");

    let mut config = SimConfig::default();
    config.history.window_seconds = 0.0;
    assert_eq!(rejected_parameter(&config), "history.window_seconds");

    let mut config = SimConfig::default();
    config.bus_voltage = 0.0;
    assert_eq!(rejected_parameter(&config), "bus_voltage");
}

#[test]
fn test_error_message_names_parameter() {
    let mut config = SimConfig::default();
    config.vehicle.mass = -2.0;

    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("vehicle.mass"), "{message}");
    assert!(message.contains("-2"), "{message}");
}

#[test]
fn test_simulation_applies_config() {
    let source = "(bus_voltage: 22.2, control: (time_scale: 0.5))";
    let mut config = SimConfig::from_ron_str(source).unwrap();
    config.initial_rate_deg_s.z = 90.0;
    let mut sim = Simulation::new(config).unwrap();

    sim.step(0.02);

    let state = sim.state();
    assert_eq!(state.power.bus_voltage, 22.2);
    assert_eq!(state.timing.last_dt, 0.01);
    // One first-order quaternion step turns by 2·atan(ω·dt/2), just short of ω·dt
    let expected_yaw = 2.0 * (0.5 * 90f64.to_radians() * 0.01).atan();
    assert!((state.attitude.euler.yaw - expected_yaw).abs() < 1e-12);
    assert!((state.attitude.euler.yaw.to_degrees() - 0.9).abs() < 1e-4);
}
