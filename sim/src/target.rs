//! Ground-truth target trajectories.

use serde::{Deserialize, Serialize};

/// Describes how a target moves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MotionSpec {
    /// Constant velocity: no acceleration.
    ConstantVelocity,
    /// Constant acceleration. `ax, ay, az` in m/s².
    ConstantAccel { ax: f64, ay: f64, az: f64 },
}

/// A simulated target with ground-truth state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Target {
    /// Unique target ID (used for metrics)
    pub id: u64,
    /// True state [px, py, pz, vx, vy, vz]
    pub state: [f64; 6],
    /// Motion model for this target
    pub motion: MotionSpec,
    /// Target appears after this time (no measurements before)
    pub appear_at: Option<f64>,
    /// Target disappears after this time
    pub disappear_at: Option<f64>,
}

impl Target {
    /// Propagate true state by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        let s = &mut self.state;
        match self.motion {
            MotionSpec::ConstantVelocity => {
                s[0] += s[3] * dt;
                s[1] += s[4] * dt;
                s[2] += s[5] * dt;
            }
            MotionSpec::ConstantAccel { ax, ay, az } => {
                s[0] += s[3] * dt + 0.5 * ax * dt * dt;
                s[1] += s[4] * dt + 0.5 * ay * dt * dt;
                s[2] += s[5] * dt + 0.5 * az * dt * dt;
                s[3] += ax * dt;
                s[4] += ay * dt;
                s[5] += az * dt;
            }
        }
    }

    /// True if the target is active at time `t`.
    pub fn is_active(&self, t: f64) -> bool {
        if let Some(appear) = self.appear_at {
            if t < appear {
                return false;
            }
        }
        if let Some(disappear) = self.disappear_at {
            if t >= disappear {
                return false;
            }
        }
        true
    }
}
