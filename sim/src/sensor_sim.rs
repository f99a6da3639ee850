//! Measurement simulator.
//!
//! Generates per-cycle measurement sets from ground-truth targets through the
//! real sensor capabilities, with:
//! - detection probability (1 − P_D misses)
//! - additive measurement noise
//! - Poisson clutter (false alarms) scattered over the surveillance region
//! - field-of-view culling via the sensor model itself

use crate::target::Target;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracker_core::types::{DMat, DVec, Measurement, SensorModel, StateVec};

/// One simulated sensor: the model the tracker sees plus simulation-only
/// detection statistics.
#[derive(Clone, Debug)]
pub struct SimSensor {
    pub model: Arc<dyn SensorModel>,
    /// Noise std per measurement axis
    pub noise_std: Vec<f64>,
    /// Noise covariance R attached to produced measurements
    pub noise_cov: DMat,
    /// Probability of detection per target per cycle
    pub p_detection: f64,
    /// Mean number of clutter returns per cycle
    pub clutter_mean: f64,
    /// Half-extent of the square clutter region around the origin (meters)
    pub clutter_region: f64,
}

impl SimSensor {
    /// Attach a measurement for this sensor.
    pub fn measurement(&self, z: DVec, t: f64) -> Measurement {
        Measurement::new(z, self.noise_cov.clone(), Arc::clone(&self.model), t)
    }
}

/// Generates measurement sets from a set of targets.
pub struct SensorSimulator {
    pub sensors: Vec<SimSensor>,
    rng: ChaCha8Rng,
}

impl SensorSimulator {
    pub fn new(sensors: Vec<SimSensor>, seed: u64) -> Self {
        Self {
            sensors,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate one sensor's frame. Each frame is meant to be consumed as
    /// its own tracking cycle: a track absorbs at most one measurement per
    /// cycle, so sensors report one at a time.
    pub fn generate_for(&mut self, sensor_idx: usize, targets: &[Target], t: f64) -> Vec<Measurement> {
        let sensor = self.sensors[sensor_idx].clone();
        let mut measurements = Vec::new();

        // True detections
        for target in targets {
            if !target.is_active(t) {
                continue;
            }
            let state = StateVec::from(target.state);
            if !sensor.model.in_fov(&state) {
                continue;
            }
            if self.rng.gen::<f64>() > sensor.p_detection {
                continue;
            }

            let mut z = sensor.model.expected(&state);
            for (axis, std) in sensor.noise_std.iter().enumerate() {
                // Uniform ±std as a cheap stand-in for Gaussian noise.
                z[axis] += self.rng.gen::<f64>() * std * 2.0 - std;
            }
            measurements.push(sensor.measurement(z, t));
        }

        // Clutter: Poisson count via product-of-uniforms inversion,
        // scattered uniformly over the region, then pushed through the
        // sensor model so clutter looks like real returns.
        let n_clutter = self.poisson(sensor.clutter_mean);
        for _ in 0..n_clutter {
            let half = sensor.clutter_region;
            let cstate = StateVec::new(
                self.rng.gen::<f64>() * 2.0 * half - half,
                self.rng.gen::<f64>() * 2.0 * half - half,
                self.rng.gen::<f64>() * 2.0,
                0.0,
                0.0,
                0.0,
            );
            if sensor.model.in_fov(&cstate) {
                let z = sensor.model.expected(&cstate);
                measurements.push(sensor.measurement(z, t));
            }
        }

        measurements
    }

    /// All sensors' frames concatenated (convenience for tests and benches).
    pub fn generate(&mut self, targets: &[Target], t: f64) -> Vec<Measurement> {
        let mut measurements = Vec::new();
        for idx in 0..self.sensors.len() {
            measurements.extend(self.generate_for(idx, targets, t));
        }
        measurements
    }

    fn poisson(&mut self, lambda: f64) -> usize {
        if lambda <= 0.0 {
            return 0;
        }
        let threshold = (-lambda).exp();
        let mut n = 0usize;
        let mut prod = self.rng.gen::<f64>();
        while prod > threshold && n < 50 {
            prod *= self.rng.gen::<f64>();
            n += 1;
        }
        n
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::MotionSpec;
    use sensor_models::{Lidar, LidarParams};

    fn lidar_sim_sensor(p_detection: f64, clutter_mean: f64) -> SimSensor {
        let lidar = Lidar::new("lidar0", LidarParams::default());
        let noise_cov = lidar.noise_cov();
        let sigma = lidar.params.sigma.to_vec();
        SimSensor {
            model: Arc::new(lidar),
            noise_std: sigma,
            noise_cov,
            p_detection,
            clutter_mean,
            clutter_region: 200.0,
        }
    }

    fn one_target() -> Vec<Target> {
        vec![Target {
            id: 0,
            state: [50.0, 20.0, 0.0, 1.0, 0.0, 0.0],
            motion: MotionSpec::ConstantVelocity,
            appear_at: None,
            disappear_at: None,
        }]
    }

    #[test]
    fn certain_detection_no_clutter_yields_one_measurement() {
        let mut sim = SensorSimulator::new(vec![lidar_sim_sensor(1.0, 0.0)], 7);
        let meas = sim.generate(&one_target(), 0.0);
        assert_eq!(meas.len(), 1);
        // Noise is bounded by ±std per axis.
        let z = &meas[0].z;
        assert!((z[0] - 50.0).abs() <= 0.3 + 1e-9);
        assert!((z[1] - 20.0).abs() <= 0.3 + 1e-9);
    }

    #[test]
    fn inactive_target_is_never_seen() {
        let mut sim = SensorSimulator::new(vec![lidar_sim_sensor(1.0, 0.0)], 7);
        let mut targets = one_target();
        targets[0].appear_at = Some(10.0);
        assert!(sim.generate(&targets, 0.0).is_empty());
    }

    #[test]
    fn same_seed_is_deterministic() {
        let targets = one_target();
        let run = |seed| {
            let mut sim = SensorSimulator::new(vec![lidar_sim_sensor(0.7, 1.5)], seed);
            (0..20)
                .flat_map(|t| sim.generate(&targets, t as f64))
                .map(|m| m.z.as_slice().to_vec())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }
}
