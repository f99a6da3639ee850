//! Tracking quality metrics: RMSE position/velocity, precision/recall,
//! ID-switch count against simulated ground truth.

use crate::types::{StateVec, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ground-truth state of one target at a given time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroundTruth {
    /// True target ID (from the simulator)
    pub target_id: u64,
    pub time: f64,
    pub state: [f64; 6],
}

/// Accumulated metric statistics over an evaluation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackingMetrics {
    /// Number of frames evaluated
    pub n_frames: u64,
    /// Total number of matched (track, target) pairs evaluated
    pub n_matched: u64,
    /// Sum of squared position errors (for RMSE)
    pub sum_sq_pos_err: f64,
    /// Sum of squared velocity errors (for RMSE)
    pub sum_sq_vel_err: f64,
    /// Tracks matched to a target
    pub true_positives: u64,
    /// Tracks with no target nearby
    pub false_positives: u64,
    /// Targets with no track nearby
    pub false_negatives: u64,
    /// Times a target's matched track identity changed between frames
    pub id_switches: u64,
    /// Which track last covered each target (for ID-switch detection)
    #[serde(skip)]
    last_assignment: HashMap<u64, TrackId>,
}

impl TrackingMetrics {
    /// Root-mean-square position error (meters).
    pub fn rmse_position(&self) -> f64 {
        if self.n_matched == 0 {
            return 0.0;
        }
        (self.sum_sq_pos_err / self.n_matched as f64).sqrt()
    }

    /// Root-mean-square velocity error (m/s).
    pub fn rmse_velocity(&self) -> f64 {
        if self.n_matched == 0 {
            return 0.0;
        }
        (self.sum_sq_vel_err / self.n_matched as f64).sqrt()
    }

    /// Precision = TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        let denom = (self.true_positives + self.false_positives) as f64;
        if denom == 0.0 {
            1.0
        } else {
            self.true_positives as f64 / denom
        }
    }

    /// Recall = TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        let denom = (self.true_positives + self.false_negatives) as f64;
        if denom == 0.0 {
            1.0
        } else {
            self.true_positives as f64 / denom
        }
    }

    /// Accumulate one frame: greedily match tracks to ground-truth targets by
    /// euclidean position distance within `match_radius` meters.
    pub fn accumulate(
        &mut self,
        track_states: &[(TrackId, StateVec)],
        ground_truths: &[GroundTruth],
        match_radius: f64,
    ) {
        self.n_frames += 1;

        // All candidate (track, target) pairs inside the radius.
        let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
        for (i, (_, state)) in track_states.iter().enumerate() {
            for (j, gt) in ground_truths.iter().enumerate() {
                let dx = state[0] - gt.state[0];
                let dy = state[1] - gt.state[1];
                let dz = state[2] - gt.state[2];
                let dist = (dx * dx + dy * dy + dz * dz).sqrt();
                if dist <= match_radius {
                    candidates.push((i, j, dist));
                }
            }
        }
        candidates.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut track_used = vec![false; track_states.len()];
        let mut target_used = vec![false; ground_truths.len()];
        for (i, j, dist) in candidates {
            if track_used[i] || target_used[j] {
                continue;
            }
            track_used[i] = true;
            target_used[j] = true;

            let (track_id, state) = &track_states[i];
            let gt = &ground_truths[j];
            self.n_matched += 1;
            self.true_positives += 1;
            self.sum_sq_pos_err += dist * dist;
            let dvx = state[3] - gt.state[3];
            let dvy = state[4] - gt.state[4];
            let dvz = state[5] - gt.state[5];
            self.sum_sq_vel_err += dvx * dvx + dvy * dvy + dvz * dvz;

            match self.last_assignment.insert(gt.target_id, *track_id) {
                Some(prev) if prev != *track_id => self.id_switches += 1,
                _ => {}
            }
        }

        self.false_positives += track_used.iter().filter(|&&u| !u).count() as u64;
        self.false_negatives += target_used.iter().filter(|&&u| !u).count() as u64;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
