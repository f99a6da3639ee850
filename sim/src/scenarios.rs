//! Scenario definitions.
//!
//! Each scenario is a named configuration of targets and sensors.
//! All scenarios are deterministic given the same seed.

use crate::sensor_sim::SimSensor;
use crate::target::{MotionSpec, Target};
use sensor_models::{Camera, CameraParams, Lidar, LidarParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which pre-defined scenario to load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// 2 targets crossing paths, lidar + camera
    Crossing,
    /// 3 parallel targets, single lidar
    Convoy,
    /// 2 targets in moderate clutter
    ClutterField,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub name: String,
    pub kind: ScenarioKind,
    pub seed: u64,
    /// Cycle period (seconds)
    pub dt: f64,
    /// Number of cycles to run
    pub cycles: usize,
    pub targets: Vec<Target>,
    pub sensors: Vec<SimSensor>,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Crossing => Self::crossing(seed),
            ScenarioKind::Convoy => Self::convoy(seed),
            ScenarioKind::ClutterField => Self::clutter_field(seed),
        }
    }

    fn crossing(seed: u64) -> Self {
        let targets = vec![
            target(0, [-100.0, 0.0, 0.0], [10.0, 0.0, 0.0]),
            target(1, [0.0, -100.0, 0.0], [0.0, 10.0, 0.0]),
        ];
        let sensors = vec![
            lidar_sensor(LidarParams::default(), 0.95, 0.0),
            camera_sensor(
                CameraParams {
                    mount: [0.0, -150.0, 0.0],
                    yaw: std::f64::consts::FRAC_PI_2,
                    az_half: 1.2,
                    el_half: 0.5,
                    ..Default::default()
                },
                0.9,
            ),
        ];
        Self {
            name: "crossing".into(),
            kind: ScenarioKind::Crossing,
            seed,
            dt: 0.5,
            cycles: 40,
            targets,
            sensors,
        }
    }

    fn convoy(seed: u64) -> Self {
        let targets = (0..3)
            .map(|i| {
                target(
                    i,
                    [-120.0, -30.0 + 30.0 * i as f64, 0.0],
                    [15.0, 0.0, 0.0],
                )
            })
            .collect();
        let sensors = vec![lidar_sensor(LidarParams::default(), 0.95, 0.0)];
        Self {
            name: "convoy".into(),
            kind: ScenarioKind::Convoy,
            seed,
            dt: 0.5,
            cycles: 30,
            targets,
            sensors,
        }
    }

    fn clutter_field(seed: u64) -> Self {
        let targets = vec![
            target(0, [-80.0, 40.0, 0.0], [8.0, -2.0, 0.0]),
            target(1, [60.0, -60.0, 0.0], [-6.0, 5.0, 0.0]),
        ];
        let sensors = vec![lidar_sensor(LidarParams::default(), 0.85, 3.0)];
        Self {
            name: "clutter-field".into(),
            kind: ScenarioKind::ClutterField,
            seed,
            dt: 0.5,
            cycles: 50,
            targets,
            sensors,
        }
    }
}

fn target(id: u64, pos: [f64; 3], vel: [f64; 3]) -> Target {
    Target {
        id,
        state: [pos[0], pos[1], pos[2], vel[0], vel[1], vel[2]],
        motion: MotionSpec::ConstantVelocity,
        appear_at: None,
        disappear_at: None,
    }
}

fn lidar_sensor(params: LidarParams, p_detection: f64, clutter_mean: f64) -> SimSensor {
    let lidar = Lidar::new("lidar0", params);
    let noise_cov = lidar.noise_cov();
    let noise_std = lidar.params.sigma.to_vec();
    SimSensor {
        model: Arc::new(lidar),
        noise_std,
        noise_cov,
        p_detection,
        clutter_mean,
        clutter_region: 150.0,
    }
}

fn camera_sensor(params: CameraParams, p_detection: f64) -> SimSensor {
    let camera = Camera::new("cam0", params);
    let noise_cov = camera.noise_cov();
    let noise_std = vec![camera.params.sigma_az, camera.params.sigma_el];
    SimSensor {
        model: Arc::new(camera),
        noise_std,
        noise_cov,
        p_detection,
        clutter_mean: 0.0,
        clutter_region: 150.0,
    }
}
