//! Pipeline orchestrator: one full tracking cycle.
//!
//! # Processing steps per cycle
//! 1. Predict all live tracks to the cycle epoch
//! 2. Build the gated cost matrix over tracks × measurements
//! 3. Drain matches strictly sequentially (each extraction observes the
//!    matrix after the previous row/column deletion)
//! 4. Filter-update each matched track in place, skipping pairs whose
//!    sensor no longer sees the track
//! 5. Hand the final unassigned sets to the track manager for score decay,
//!    deletion and births
//!
//! The cycle is single-threaded and strictly sequential: every match
//! mutates shared track state before the next one is computed.

use crate::association::{Association, Associator};
use crate::error::TrackerError;
use crate::filter::{EkfConfig, ExtendedKalmanFilter, Filter};
use crate::gating::{Gate, DEFAULT_CONFIDENCE};
use crate::track::{Track, TrackStatus};
use crate::track_manager::{ScoreTrackManager, TrackManage, TrackManagerConfig};
use crate::types::{Measurement, TrackId};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the tracking pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Gating confidence level (chi-square CDF probability)
    pub gate_confidence: f64,
    /// Filter motion-model config
    pub filter: EkfConfig,
    /// Track management config
    pub manager: TrackManagerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gate_confidence: DEFAULT_CONFIDENCE,
            filter: EkfConfig::default(),
            manager: TrackManagerConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle summary
// ---------------------------------------------------------------------------

/// What happened during one cycle, for logging and evaluation.
#[derive(Clone, Debug, Default)]
pub struct CycleSummary {
    /// Accepted (track id, measurement index) pairs, in extraction order
    pub matches: Vec<(TrackId, usize)>,
    /// Pairs consumed but skipped because the track left the sensor's view
    pub fov_skips: usize,
    /// Track indices (into the cycle's track list) left unmatched
    pub unassigned_tracks: Vec<usize>,
    /// Measurement indices left unmatched
    pub unassigned_meas: Vec<usize>,
    /// Tracks created by the manager at cycle end
    pub births: usize,
    /// Tracks removed by the manager at cycle end
    pub deletions: usize,
    /// Live tracks after the cycle
    pub track_count: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The main tracking pipeline. Owns the track pool, the filter and the
/// track manager; generic over both capabilities so tests can substitute
/// instrumented implementations.
pub struct Pipeline<F = ExtendedKalmanFilter, M = ScoreTrackManager>
where
    F: Filter,
    M: TrackManage,
{
    pub config: PipelineConfig,
    pub tracks: Vec<Track>,
    pub filter: F,
    pub manager: M,
    associator: Associator,
}

impl Pipeline {
    /// Pipeline with the default filter and score-based manager.
    pub fn new(config: PipelineConfig) -> Self {
        let filter = ExtendedKalmanFilter::new(config.filter.clone());
        let manager = ScoreTrackManager::new(config.manager.clone());
        Self::with_parts(config, filter, manager)
    }
}

impl<F, M> Pipeline<F, M>
where
    F: Filter,
    M: TrackManage,
{
    /// Pipeline with caller-supplied filter and manager capabilities.
    pub fn with_parts(config: PipelineConfig, filter: F, manager: M) -> Self {
        let associator = Associator::new(Gate::new(config.gate_confidence));
        Self {
            config,
            tracks: Vec::new(),
            filter,
            manager,
            associator,
        }
    }

    /// Run one tracking cycle over the given measurement set.
    ///
    /// Empty track or measurement lists are normal; the cycle degenerates to
    /// score bookkeeping and births. A singular innovation covariance aborts
    /// the cycle with an error since the cost matrix would be unreliable.
    pub fn process_cycle(
        &mut self,
        measurements: &[Measurement],
        time: f64,
    ) -> Result<CycleSummary, TrackerError> {
        // Step 1: predict.
        for track in &mut self.tracks {
            if track.status != TrackStatus::Deleted {
                let dt = time - track.epoch;
                if dt > 0.0 {
                    self.filter.predict(track, dt);
                    track.epoch = time;
                }
            }
        }

        // Step 2: gated cost matrix.
        let mut association: Association =
            self.associator
                .associate(&self.tracks, measurements, &self.filter)?;

        let mut summary = CycleSummary::default();
        let mut skipped: Vec<(usize, usize)> = Vec::new();

        // Step 3-4: drain matches one at a time.
        while let Some((ti, mi)) = association.next_pair() {
            let meas = &measurements[mi];
            let track = &mut self.tracks[ti];

            if !meas.sensor.in_fov(&track.state) {
                // The pair is consumed, but the update is not applied; both
                // sides go back to the unassigned bookkeeping below.
                tracing::debug!(
                    track = %track.id,
                    sensor = meas.sensor.name(),
                    "matched track outside sensor field of view, skipping update"
                );
                skipped.push((ti, mi));
                summary.fov_skips += 1;
                continue;
            }

            self.filter.update(track, meas)?;
            track.last_updated = time;
            track.push_history();
            self.manager.on_track_updated(track);
            tracing::debug!(
                track = %track.id,
                sensor = meas.sensor.name(),
                measurement = mi,
                "track updated"
            );
            summary.matches.push((track.id, mi));
        }

        let (mut unassigned_tracks, mut unassigned_meas) = association.into_unassigned();
        for (ti, mi) in skipped {
            insert_sorted(&mut unassigned_tracks, ti);
            insert_sorted(&mut unassigned_meas, mi);
        }

        if summary.matches.is_empty() && !self.tracks.is_empty() && !measurements.is_empty() {
            tracing::debug!(
                tracks = self.tracks.len(),
                measurements = measurements.len(),
                "no associations this cycle"
            );
        }

        // Step 5: track management.
        let before: HashSet<TrackId> = self.tracks.iter().map(|t| t.id).collect();
        self.manager.run_cycle_end(
            &mut self.tracks,
            &unassigned_tracks,
            &unassigned_meas,
            measurements,
        );
        let after: HashSet<TrackId> = self.tracks.iter().map(|t| t.id).collect();
        summary.births = after.difference(&before).count();
        summary.deletions = before.difference(&after).count();
        summary.track_count = self.tracks.len();
        summary.unassigned_tracks = unassigned_tracks;
        summary.unassigned_meas = unassigned_meas;

        Ok(summary)
    }

    /// Clear all tracks.
    pub fn reset(&mut self) {
        self.tracks.clear();
    }
}

/// Insert `value` into an ascending list, keeping it sorted.
fn insert_sorted(list: &mut Vec<usize>, value: usize) {
    let pos = list.partition_point(|&v| v < value);
    list.insert(pos, value);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{measurement, xy3_sensor};
    use crate::types::{DMat, DVec, Measurement, StateCov};
    use std::cell::Cell;

    // Filter wrapper that counts update calls.
    #[derive(Default)]
    struct CountingFilter {
        inner: ExtendedKalmanFilter,
        updates: Cell<usize>,
    }

    impl Filter for CountingFilter {
        fn predict(&self, track: &mut Track, dt: f64) {
            self.inner.predict(track, dt);
        }
        fn innovation(&self, track: &Track, meas: &Measurement) -> DVec {
            self.inner.innovation(track, meas)
        }
        fn innovation_covariance(&self, track: &Track, meas: &Measurement, h: &DMat) -> DMat {
            self.inner.innovation_covariance(track, meas, h)
        }
        fn update(&self, track: &mut Track, meas: &Measurement) -> Result<(), TrackerError> {
            self.updates.set(self.updates.get() + 1);
            self.inner.update(track, meas)
        }
    }

    // Manager that records every call.
    #[derive(Default)]
    struct RecordingManager {
        updated: Vec<TrackId>,
        cycle_ends: Vec<(Vec<usize>, Vec<usize>, usize)>,
    }

    impl TrackManage for RecordingManager {
        fn on_track_updated(&mut self, track: &mut Track) {
            self.updated.push(track.id);
        }
        fn run_cycle_end(
            &mut self,
            _tracks: &mut Vec<Track>,
            unassigned_tracks: &[usize],
            unassigned_meas: &[usize],
            measurements: &[Measurement],
        ) {
            self.cycle_ends.push((
                unassigned_tracks.to_vec(),
                unassigned_meas.to_vec(),
                measurements.len(),
            ));
        }
    }

    #[test]
    fn out_of_view_match_is_skipped_and_restored() {
        // An otherwise-perfect match whose sensor reports the track out of
        // view: no filter update, no manager notification, both sides end
        // up unassigned.
        let mut pipeline = Pipeline::with_parts(
            PipelineConfig::default(),
            CountingFilter::default(),
            RecordingManager::default(),
        );
        pipeline
            .tracks
            .push(crate::testutil::track_at(10.0, 10.0));

        let sensor = xy3_sensor("lidar", false);
        let meas = vec![measurement(&sensor, &[10.0, 10.0, 0.0], 1.0, 1.0)];
        let summary = pipeline.process_cycle(&meas, 1.0).unwrap();

        assert!(summary.matches.is_empty());
        assert_eq!(summary.fov_skips, 1);
        assert_eq!(summary.unassigned_tracks, vec![0]);
        assert_eq!(summary.unassigned_meas, vec![0]);
        assert_eq!(pipeline.filter.updates.get(), 0, "no filter update");
        assert!(pipeline.manager.updated.is_empty(), "no manager callback");
        // The manager still sees both as unassigned at cycle end.
        assert_eq!(pipeline.manager.cycle_ends, vec![(vec![0], vec![0], 1)]);
    }

    #[test]
    fn in_view_match_updates_track_and_notifies_manager() {
        let mut pipeline = Pipeline::with_parts(
            PipelineConfig::default(),
            CountingFilter::default(),
            RecordingManager::default(),
        );
        pipeline.tracks.push(crate::testutil::track_at(5.0, 5.0));

        let sensor = xy3_sensor("lidar", true);
        let meas = vec![measurement(&sensor, &[5.2, 4.9, 0.0], 1.0, 1.0)];
        let summary = pipeline.process_cycle(&meas, 1.0).unwrap();

        assert_eq!(summary.matches.len(), 1);
        assert_eq!(pipeline.filter.updates.get(), 1);
        assert_eq!(pipeline.manager.updated, vec![TrackId(0)]);
        assert!(summary.unassigned_tracks.is_empty());
        assert!(summary.unassigned_meas.is_empty());
    }

    #[test]
    fn empty_measurement_list_is_not_an_error() {
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        pipeline.tracks.push(crate::testutil::track_at(0.0, 0.0));
        let summary = pipeline.process_cycle(&[], 1.0).unwrap();
        assert!(summary.matches.is_empty());
        assert_eq!(summary.unassigned_tracks, vec![0]);
        assert_eq!(summary.track_count, 1, "no decay without any sensor data");
    }

    #[test]
    fn singular_covariance_aborts_the_cycle() {
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let mut track = crate::testutil::track_at(0.0, 0.0);
        track.cov = StateCov::zeros();
        pipeline.tracks.push(track);

        let sensor = xy3_sensor("lidar", true);
        let meas = vec![measurement(&sensor, &[0.0, 0.0, 0.0], 0.0, 0.0)];
        assert!(pipeline.process_cycle(&meas, 0.0).is_err());
    }

    #[test]
    fn full_cycle_births_then_tracks() {
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let sensor = xy3_sensor("lidar", true);

        // First cycle: two unassigned measurements become two tentative tracks.
        let meas0 = vec![
            measurement(&sensor, &[100.0, 200.0, 0.0], 1.0, 0.0),
            measurement(&sensor, &[300.0, 400.0, 0.0], 1.0, 0.0),
        ];
        let s0 = pipeline.process_cycle(&meas0, 0.0).unwrap();
        assert_eq!(s0.births, 2);
        assert_eq!(s0.track_count, 2);

        // Following cycles: the same two targets drift slowly; the existing
        // tracks absorb them instead of spawning new ones.
        for t in 1..=6 {
            let dt = t as f64;
            let meas = vec![
                measurement(&sensor, &[100.0 + dt, 200.0, 0.0], 1.0, dt),
                measurement(&sensor, &[300.0 + dt, 400.0, 0.0], 1.0, dt),
            ];
            let s = pipeline.process_cycle(&meas, dt).unwrap();
            assert_eq!(s.matches.len(), 2);
            assert_eq!(s.births, 0);
            assert_eq!(s.track_count, 2);
        }

        // Scores accumulated: both confirmed by now.
        assert!(pipeline
            .tracks
            .iter()
            .all(|t| t.status == TrackStatus::Confirmed));
    }

    #[test]
    fn insert_sorted_keeps_order() {
        let mut v = vec![1, 4, 7];
        insert_sorted(&mut v, 5);
        insert_sorted(&mut v, 0);
        insert_sorted(&mut v, 9);
        assert_eq!(v, vec![0, 1, 4, 5, 7, 9]);
    }
}
