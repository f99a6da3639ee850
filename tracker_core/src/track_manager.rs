//! Track lifecycle management: score accumulation, confirmation, deletion,
//! and birth of new tracks from unassigned measurements.
//!
//! # Policy
//! - **Score**: each update adds 1/window, each missed opportunity while
//!   visible subtracts 1/window, clamped to [0, 1].
//! - **Confirmation**: a tentative track is confirmed once its score reaches
//!   the confirmation threshold.
//! - **Deletion**: a confirmed track is deleted when its score decays below
//!   the confirmed threshold; a tentative track below the tentative
//!   threshold, or any track whose positional variance has blown up, goes
//!   the same way.
//! - **Birth**: each unassigned measurement whose sensor observes position
//!   directly spawns a tentative track. Bearing-only measurements never do.

use crate::track::{Track, TrackStatus};
use crate::types::{Measurement, StateCov, StateVec, TrackId};

/// Track-manager capability consumed by the orchestration loop.
pub trait TrackManage {
    /// Called once for every track that received a measurement update.
    fn on_track_updated(&mut self, track: &mut Track);

    /// Called once per cycle after all matches are consumed, with the final
    /// unassigned index sets and the full measurement list. May create,
    /// delete, or change the lifecycle status of tracks.
    fn run_cycle_end(
        &mut self,
        tracks: &mut Vec<Track>,
        unassigned_tracks: &[usize],
        unassigned_meas: &[usize],
        measurements: &[Measurement],
    );
}

/// Configuration for the score-based manager.
#[derive(Clone, Debug)]
pub struct TrackManagerConfig {
    /// Score window: one hit or miss moves the score by 1/window
    pub window: u32,
    /// Score at which a tentative track becomes confirmed
    pub confirm_threshold: f64,
    /// Confirmed track deleted below this score
    pub delete_confirmed: f64,
    /// Tentative track deleted below this score
    pub delete_tentative: f64,
    /// Any track deleted once P[0,0] or P[1,1] exceeds this variance (m²)
    pub max_pos_variance: f64,
    /// Initial position uncertainty for births (1σ, meters), used where the
    /// seeding measurement carries no noise information
    pub init_pos_std: f64,
    /// Initial velocity uncertainty for births (1σ, m/s)
    pub init_vel_std: f64,
}

impl Default for TrackManagerConfig {
    fn default() -> Self {
        Self {
            window: 6,
            confirm_threshold: 0.8,
            delete_confirmed: 0.6,
            delete_tentative: 0.1,
            max_pos_variance: 400.0,
            init_pos_std: 10.0,
            init_vel_std: 5.0,
        }
    }
}

/// Score-based track manager.
#[derive(Clone, Debug, Default)]
pub struct ScoreTrackManager {
    pub config: TrackManagerConfig,
    next_id: u64,
}

impl ScoreTrackManager {
    pub fn new(config: TrackManagerConfig) -> Self {
        Self { config, next_id: 0 }
    }

    fn next_track_id(&mut self) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    fn step(&self) -> f64 {
        1.0 / f64::from(self.config.window)
    }

    /// Create a tentative track seeded by an unassigned measurement.
    fn birth_track(&mut self, meas: &Measurement, position: nalgebra::Vector3<f64>) -> Track {
        let id = self.next_track_id();
        let state = StateVec::new(position[0], position[1], position[2], 0.0, 0.0, 0.0);

        let ps = self.config.init_pos_std * self.config.init_pos_std;
        let vs = self.config.init_vel_std * self.config.init_vel_std;
        let mut cov = StateCov::from_diagonal(&StateVec::new(ps, ps, ps, vs, vs, vs));
        // A positional sensor's noise is a better prior than the configured
        // default for the position block.
        if meas.noise_cov.nrows() == 3 && meas.noise_cov.ncols() == 3 {
            for r in 0..3 {
                for c in 0..3 {
                    cov[(r, c)] = meas.noise_cov[(r, c)];
                }
            }
        }

        tracing::debug!(track = %id, sensor = meas.sensor.name(), "track born");
        Track::new(id, state, cov, self.step(), meas.timestamp)
    }

    fn should_delete(&self, track: &Track) -> bool {
        let below = match track.status {
            TrackStatus::Confirmed => track.score < self.config.delete_confirmed,
            TrackStatus::Tentative => track.score < self.config.delete_tentative,
            TrackStatus::Deleted => true,
        };
        below
            || track.cov[(0, 0)] > self.config.max_pos_variance
            || track.cov[(1, 1)] > self.config.max_pos_variance
    }
}

impl TrackManage for ScoreTrackManager {
    fn on_track_updated(&mut self, track: &mut Track) {
        track.score = (track.score + self.step()).min(1.0);
        if track.status == TrackStatus::Tentative && track.score >= self.config.confirm_threshold {
            track.status = TrackStatus::Confirmed;
            tracing::debug!(track = %track.id, score = track.score, "track confirmed");
        }
    }

    fn run_cycle_end(
        &mut self,
        tracks: &mut Vec<Track>,
        unassigned_tracks: &[usize],
        unassigned_meas: &[usize],
        measurements: &[Measurement],
    ) {
        // Decay scores of tracks that got no measurement while at least one
        // sensor of this cycle could have seen them. Out-of-view tracks are
        // left alone; a miss there carries no information.
        for &ti in unassigned_tracks {
            let track = &mut tracks[ti];
            let visible = measurements
                .iter()
                .any(|m| m.sensor.in_fov(&track.state));
            if visible {
                track.score = (track.score - self.step()).max(0.0);
            }
        }

        // Deletion pass.
        for track in tracks.iter_mut() {
            if track.status != TrackStatus::Deleted && self.should_delete(track) {
                tracing::debug!(track = %track.id, score = track.score, "track deleted");
                track.status = TrackStatus::Deleted;
            }
        }
        tracks.retain(|t| t.status != TrackStatus::Deleted);

        // Birth pass: only sensors that observe position can seed a state.
        for &mi in unassigned_meas {
            let meas = &measurements[mi];
            if let Some(position) = meas.sensor.position(&meas.z) {
                let track = self.birth_track(meas, position);
                tracks.push(track);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
