//! Kalman filtering: predict and update steps.
//!
//! # Design choices
//! - Constant-velocity (CV) motion model, linear predict.
//! - Updates are linearized through the sensor's measurement Jacobian, so
//!   nonlinear modalities (bearing cameras) reuse the same update path.
//! - All math is done in `f64` via `nalgebra`.
//!
//! ## State vector
//! x = [px, py, pz, vx, vy, vz]ᵀ  (6-dimensional)
//!
//! ## CV transition model
//! F = I₆ + dt * [[0₃ I₃]; [0₃ 0₃]]
//! i.e. px += vx*dt, etc.

use crate::error::TrackerError;
use crate::track::Track;
use crate::types::{DMat, DVec, Measurement, StateCov, StateVec};
use nalgebra::Matrix6;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Filter capability consumed by the association core.
///
/// Implementations must guarantee an invertible innovation covariance for
/// every (track, measurement) pair they are handed; a singular S is a
/// contract violation surfaced as [`TrackerError::SingularInnovationCovariance`].
pub trait Filter {
    /// Propagate state and covariance forward by `dt` seconds.
    fn predict(&self, track: &mut Track, dt: f64);

    /// Innovation γ = z − h(x): residual between the actual measurement and
    /// the measurement predicted from the track state.
    fn innovation(&self, track: &Track, meas: &Measurement) -> DVec;

    /// Innovation covariance S = H·P·Hᵀ + R for the given Jacobian.
    fn innovation_covariance(&self, track: &Track, meas: &Measurement, h: &DMat) -> DMat;

    /// Incorporate the measurement into the track, mutating state and
    /// covariance in place.
    fn update(&self, track: &mut Track, meas: &Measurement) -> Result<(), TrackerError>;
}

// ---------------------------------------------------------------------------
// Extended Kalman filter, CV motion model
// ---------------------------------------------------------------------------

/// Configuration for the CV-model filter.
#[derive(Clone, Debug)]
pub struct EkfConfig {
    /// Process noise std (acceleration, m/s²). Higher = more maneuvering allowed.
    pub process_noise_std: f64,
}

impl Default for EkfConfig {
    fn default() -> Self {
        Self {
            process_noise_std: 2.0,
        }
    }
}

/// Extended Kalman filter over a 6-state CV model.
#[derive(Clone, Debug, Default)]
pub struct ExtendedKalmanFilter {
    pub config: EkfConfig,
}

impl ExtendedKalmanFilter {
    pub fn new(config: EkfConfig) -> Self {
        Self { config }
    }

    /// State transition matrix F for timestep dt.
    pub fn transition_matrix(dt: f64) -> Matrix6<f64> {
        let mut f = Matrix6::<f64>::identity();
        // position += velocity * dt
        f[(0, 3)] = dt;
        f[(1, 4)] = dt;
        f[(2, 5)] = dt;
        f
    }

    /// Process noise matrix Q for timestep dt.
    /// Discrete white noise acceleration model (DWNA).
    fn process_noise(dt: f64, q_std: f64) -> Matrix6<f64> {
        let q = q_std * q_std; // variance
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        // Q_pos = q·dt⁴/4,  Q_pos_vel = q·dt³/2,  Q_vel = q·dt²
        let mut qm = Matrix6::<f64>::zeros();
        for i in 0..3usize {
            qm[(i, i)] = q * dt4 / 4.0;
            qm[(i + 3, i + 3)] = q * dt2;
            qm[(i, i + 3)] = q * dt3 / 2.0;
            qm[(i + 3, i)] = q * dt3 / 2.0;
        }
        qm
    }

    fn cov_dynamic(cov: &StateCov) -> DMat {
        DMat::from_fn(6, 6, |r, c| cov[(r, c)])
    }
}

impl Filter for ExtendedKalmanFilter {
    fn predict(&self, track: &mut Track, dt: f64) {
        let f = Self::transition_matrix(dt);
        let q = Self::process_noise(dt, self.config.process_noise_std);
        track.state = f * track.state;
        track.cov = f * track.cov * f.transpose() + q;
    }

    fn innovation(&self, track: &Track, meas: &Measurement) -> DVec {
        &meas.z - meas.sensor.expected(&track.state)
    }

    fn innovation_covariance(&self, track: &Track, meas: &Measurement, h: &DMat) -> DMat {
        let p = Self::cov_dynamic(&track.cov);
        h * &p * h.transpose() + &meas.noise_cov
    }

    fn update(&self, track: &mut Track, meas: &Measurement) -> Result<(), TrackerError> {
        let dim = meas.sensor.dim();
        if meas.z.len() != dim {
            return Err(TrackerError::DimensionMismatch {
                sensor: meas.sensor.name().to_string(),
                expected: dim,
                got: meas.z.len(),
            });
        }

        let h = meas.sensor.jacobian(&track.state);
        let gamma = self.innovation(track, meas);
        let s = self.innovation_covariance(track, meas, &h);

        // Kalman gain K = P·Hᵀ·S⁻¹ (LU for numerical stability)
        let s_inv =
            s.lu()
                .try_inverse()
                .ok_or_else(|| TrackerError::SingularInnovationCovariance {
                    track: track.id,
                    sensor: meas.sensor.name().to_string(),
                })?;
        let p = Self::cov_dynamic(&track.cov);
        let k = &p * h.transpose() * &s_inv;

        // x' = x + K·γ
        let correction = &k * &gamma;
        let new_state = StateVec::from_fn(|r, _| track.state[r] + correction[r]);

        // Joseph form: P' = (I−KH)·P·(I−KH)ᵀ + K·R·Kᵀ
        let i_kh = DMat::identity(6, 6) - &k * &h;
        let new_p = &i_kh * &p * i_kh.transpose() + &k * &meas.noise_cov * k.transpose();

        track.state = new_state;
        track.cov = StateCov::from_fn(|r, c| new_p[(r, c)]);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
