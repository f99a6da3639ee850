//! `sim` — Scenario simulator: target trajectories, noisy sensor
//! measurements, replay logs.

pub mod replay;
pub mod scenarios;
pub mod sensor_sim;
pub mod target;

pub use replay::{load_replay, save_replay, ReplayLog};
pub use scenarios::{Scenario, ScenarioKind};
pub use sensor_sim::{SensorSimulator, SimSensor};
pub use target::{MotionSpec, Target};
