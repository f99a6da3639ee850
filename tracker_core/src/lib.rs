//! `tracker_core` — Core single-nearest-neighbor multi-object tracking.
//!
//! # Module layout
//! - [`types`]         — Fundamental types (IDs, state vectors, measurements, sensor trait)
//! - [`error`]         — Contract-violation errors
//! - [`track`]         — Track struct, score, lifecycle status
//! - [`filter`]        — Kalman filter capability (predict / innovation / update)
//! - [`chi2`]          — Chi-square quantile for gating thresholds
//! - [`gating`]        — Chi-square gate over Mahalanobis distances
//! - [`association`]   — Cost matrix construction and greedy nearest-neighbor matching
//! - [`track_manager`] — Score-based confirmation / deletion / birth logic
//! - [`pipeline`]      — Full per-cycle orchestrator
//! - [`metrics`]       — RMSE, precision/recall, ID switches

pub mod association;
pub mod chi2;
pub mod error;
pub mod filter;
pub mod gating;
pub mod metrics;
pub mod pipeline;
pub mod track;
pub mod track_manager;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use association::{statistical_distance, Association, Associator};
pub use error::TrackerError;
pub use filter::{EkfConfig, ExtendedKalmanFilter, Filter};
pub use gating::{Gate, DEFAULT_CONFIDENCE};
pub use pipeline::{CycleSummary, Pipeline, PipelineConfig};
pub use track::{Track, TrackStatus};
pub use track_manager::{ScoreTrackManager, TrackManage, TrackManagerConfig};
pub use types::{DMat, DVec, Measurement, SensorModel, StateCov, StateVec, TrackId};
