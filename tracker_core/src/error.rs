//! Error type for contract violations inside the tracking core.

use crate::types::TrackId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The filter produced a non-invertible innovation covariance. The cost
    /// matrix built from it would be unreliable, so the whole cycle aborts.
    #[error("singular innovation covariance for track {track} ({sensor} measurement)")]
    SingularInnovationCovariance { track: TrackId, sensor: String },

    /// Observation vector length does not match the sensor's declared
    /// measurement dimension.
    #[error("measurement dimension mismatch: sensor {sensor} declares {expected}, got {got}")]
    DimensionMismatch {
        sensor: String,
        expected: usize,
        got: usize,
    },
}
