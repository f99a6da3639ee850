//! Track: state, covariance, score, status, history.

use crate::types::{StateCov, StateVec, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum length of the track state history (for diagnostics and display).
const HISTORY_LEN: usize = 1024;

/// Lifecycle status of a track. Owned and mutated only by the track manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Not yet confirmed — may be spurious
    Tentative,
    /// Score stayed high long enough to be trusted
    Confirmed,
    /// Marked for removal
    Deleted,
}

/// A single persistently tracked object.
#[derive(Clone, Debug)]
pub struct Track {
    /// Unique identifier, stable across cycles
    pub id: TrackId,
    /// Estimated state vector [px, py, pz, vx, vy, vz]
    pub state: StateVec,
    /// State estimation covariance
    pub cov: StateCov,
    /// Confidence accumulator in [0, 1], maintained by the track manager
    pub score: f64,
    /// Lifecycle status
    pub status: TrackStatus,
    /// Time the state estimate refers to (advanced by predict)
    pub epoch: f64,
    /// Time of the last measurement update
    pub last_updated: f64,
    /// Time of birth
    pub born_at: f64,
    /// Past state snapshots (most recent last)
    pub history: VecDeque<StateVec>,
}

impl Track {
    /// Create a new tentative track from an initial state estimate.
    pub fn new(id: TrackId, state: StateVec, cov: StateCov, score: f64, birth_time: f64) -> Self {
        let mut history = VecDeque::with_capacity(HISTORY_LEN);
        history.push_back(state);
        Self {
            id,
            state,
            cov,
            score,
            status: TrackStatus::Tentative,
            epoch: birth_time,
            last_updated: birth_time,
            born_at: birth_time,
            history,
        }
    }

    /// Push a new state snapshot to the history ring-buffer.
    pub fn push_history(&mut self) {
        if self.history.len() >= HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(self.state);
    }

    /// 2D projected [x, y] position.
    pub fn position_2d(&self) -> (f64, f64) {
        (self.state[0], self.state[1])
    }

    /// 2D velocity [vx, vy].
    pub fn velocity_2d(&self) -> (f64, f64) {
        (self.state[3], self.state[4])
    }
}
