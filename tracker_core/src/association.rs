//! Data association: Mahalanobis distances, gated cost matrix, and greedy
//! single-nearest-neighbor matching.
//!
//! # Algorithm
//! 1. For every (track, measurement) pair, compute the statistical distance
//!    γᵀ S⁻¹ γ and gate it; passing pairs fill an N×M cost matrix, failing
//!    pairs stay at infinity.
//! 2. Repeatedly extract the globally smallest finite cell, delete its row
//!    and column, and remove the matched track and measurement from the
//!    unassigned lists. Ties break on the first occurrence in row-major
//!    scan order, so the result is deterministic.
//! 3. Stop when the matrix is empty in either dimension or fully infeasible.
//!
//! Greedy extraction is not guaranteed jointly optimal; it matches the
//! cheapest remaining pair first, which is the intended policy here.

use crate::error::TrackerError;
use crate::filter::Filter;
use crate::gating::Gate;
use crate::track::Track;
use crate::types::{DMat, Measurement};

/// Mahalanobis distance between a track and a measurement: γᵀ S⁻¹ γ with the
/// Jacobian evaluated at the track's current state.
///
/// A singular innovation covariance violates the filter's contract and is
/// surfaced as an error rather than being patched over with a pseudo-inverse.
pub fn statistical_distance(
    track: &Track,
    meas: &Measurement,
    filter: &dyn Filter,
) -> Result<f64, TrackerError> {
    let h = meas.sensor.jacobian(&track.state);
    let gamma = filter.innovation(track, meas);
    let s = filter.innovation_covariance(track, meas, &h);
    let s_inv = s
        .lu()
        .try_inverse()
        .ok_or_else(|| TrackerError::SingularInnovationCovariance {
            track: track.id,
            sensor: meas.sensor.name().to_string(),
        })?;
    Ok(gamma.dot(&(&s_inv * &gamma)))
}

/// Builds gated cost matrices over track and measurement lists.
#[derive(Clone, Debug, Default)]
pub struct Associator {
    pub gate: Gate,
}

impl Associator {
    pub fn new(gate: Gate) -> Self {
        Self { gate }
    }

    /// Evaluate every pair and produce the drainable association state.
    ///
    /// Empty track or measurement lists are not an error; the resulting
    /// association simply yields no pairs.
    pub fn associate(
        &self,
        tracks: &[Track],
        measurements: &[Measurement],
        filter: &dyn Filter,
    ) -> Result<Association, TrackerError> {
        let n = tracks.len();
        let m = measurements.len();
        let mut matrix = DMat::from_element(n, m, f64::INFINITY);

        for (i, track) in tracks.iter().enumerate() {
            for (j, meas) in measurements.iter().enumerate() {
                let dist = statistical_distance(track, meas, filter)?;
                if self.gate.accepts(dist, meas.sensor.as_ref()) {
                    matrix[(i, j)] = dist;
                }
            }
        }

        Ok(Association {
            matrix,
            unassigned_tracks: (0..n).collect(),
            unassigned_meas: (0..m).collect(),
        })
    }
}

/// Drainable association state: the cost matrix plus the unassigned index
/// lists it is kept in lockstep with.
///
/// Matrix rows and columns map positionally onto the *current* contents of
/// `unassigned_tracks` / `unassigned_meas`, not onto original list positions;
/// every extraction removes one row, one column, and the two matching list
/// entries together.
#[derive(Clone, Debug)]
pub struct Association {
    matrix: DMat,
    /// Original track indices still unmatched, ascending
    pub unassigned_tracks: Vec<usize>,
    /// Original measurement indices still unmatched, ascending
    pub unassigned_meas: Vec<usize>,
}

impl Association {
    /// Current (rows, cols) of the cost matrix.
    pub fn matrix_shape(&self) -> (usize, usize) {
        (self.matrix.nrows(), self.matrix.ncols())
    }

    /// Globally minimum finite cell, first occurrence in row-major order.
    fn argmin(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..self.matrix.nrows() {
            for j in 0..self.matrix.ncols() {
                let v = self.matrix[(i, j)];
                if v.is_finite() && best.map_or(true, |(_, _, b)| v < b) {
                    best = Some((i, j, v));
                }
            }
        }
        best.map(|(i, j, _)| (i, j))
    }

    /// Extract the closest remaining pair as original (track, measurement)
    /// indices, shrinking the matrix and the unassigned lists.
    ///
    /// Returns `None` once the matrix is empty in either dimension or every
    /// remaining cell is infeasible; whatever is left in the unassigned
    /// lists is final.
    pub fn next_pair(&mut self) -> Option<(usize, usize)> {
        if self.matrix.nrows() == 0 || self.matrix.ncols() == 0 {
            return None;
        }
        let (row, col) = self.argmin()?;

        let track_idx = self.unassigned_tracks[row];
        let meas_idx = self.unassigned_meas[col];

        let matrix = std::mem::replace(&mut self.matrix, DMat::zeros(0, 0));
        self.matrix = matrix.remove_row(row).remove_column(col);

        // Removal is by value: matrix-local positions shift as rows and
        // columns disappear, original indices do not.
        self.unassigned_tracks.retain(|&t| t != track_idx);
        self.unassigned_meas.retain(|&m| m != meas_idx);

        Some((track_idx, meas_idx))
    }

    /// Consume into the final unassigned index lists.
    pub fn into_unassigned(self) -> (Vec<usize>, Vec<usize>) {
        (self.unassigned_tracks, self.unassigned_meas)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ExtendedKalmanFilter;
    use crate::testutil::{measurement, track_at, xy_sensor};
    use approx::assert_abs_diff_eq;

    fn drain(mut assoc: Association) -> (Vec<(usize, usize)>, Vec<usize>, Vec<usize>) {
        let mut pairs = Vec::new();
        while let Some(pair) = assoc.next_pair() {
            pairs.push(pair);
        }
        let (ut, um) = assoc.into_unassigned();
        (pairs, ut, um)
    }

    #[test]
    fn distance_is_normalized_squared_residual() {
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        // P_xy = I, R = I  =>  S = 2I, distance = |γ|²/2
        let track = track_at(0.0, 0.0);
        let meas = measurement(&sensor, &[3.0, 4.0], 1.0, 0.0);
        let d = statistical_distance(&track, &meas, &filter).unwrap();
        assert_abs_diff_eq!(d, 25.0 / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn singular_covariance_aborts_association() {
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        let mut track = track_at(0.0, 0.0);
        track.cov.fill(0.0);
        let meas = measurement(&sensor, &[0.1, 0.1], 0.0, 0.0);

        let err = Associator::default()
            .associate(&[track], &[meas], &filter)
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::SingularInnovationCovariance { .. }
        ));
    }

    #[test]
    fn one_close_pair_matches() {
        // Scenario: 1 track, 1 measurement, distance below gate.
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        let tracks = vec![track_at(10.0, 10.0)];
        let meas = vec![measurement(&sensor, &[10.5, 10.2], 1.0, 0.0)];

        let assoc = Associator::default()
            .associate(&tracks, &meas, &filter)
            .unwrap();
        let (pairs, ut, um) = drain(assoc);
        assert_eq!(pairs, vec![(0, 0)]);
        assert!(ut.is_empty());
        assert!(um.is_empty());
    }

    #[test]
    fn gated_out_pair_stays_unassigned() {
        // Scenario: tiny covariance, large residual — distance above gate.
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        let mut track = track_at(0.0, 0.0);
        track.cov *= 1e-4;
        let meas = vec![measurement(&sensor, &[50.0, 50.0], 1e-4, 0.0)];

        let assoc = Associator::default()
            .associate(&[track], &meas, &filter)
            .unwrap();
        let (pairs, ut, um) = drain(assoc);
        assert!(pairs.is_empty());
        assert_eq!(ut, vec![0]);
        assert_eq!(um, vec![0]);
    }

    #[test]
    fn greedy_takes_global_minimum_first() {
        // Scenario: track 0 closest to measurement 1, track 1 closest to
        // measurement 0; the globally smallest cell goes first, then the
        // remaining cell — greedy, not jointly optimal.
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        let tracks = vec![track_at(0.0, 0.0), track_at(4.0, 0.0)];
        let meas = vec![
            measurement(&sensor, &[3.0, 0.0], 1.0, 0.0), // nearest to track 1
            measurement(&sensor, &[0.1, 0.0], 1.0, 0.0), // nearest to track 0
        ];

        let assoc = Associator::default()
            .associate(&tracks, &meas, &filter)
            .unwrap();
        let (pairs, ut, um) = drain(assoc);
        // (0, 1) is the global minimum, leaving (1, 0) as the only option.
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
        assert!(ut.is_empty());
        assert!(um.is_empty());
    }

    #[test]
    fn no_tracks_means_all_measurements_unassigned() {
        // Scenario: 0 tracks, 3 measurements.
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        let meas: Vec<Measurement> = (0..3)
            .map(|i| measurement(&sensor, &[i as f64, 0.0], 1.0, 0.0))
            .collect();

        let assoc = Associator::default().associate(&[], &meas, &filter).unwrap();
        let (pairs, ut, um) = drain(assoc);
        assert!(pairs.is_empty());
        assert!(ut.is_empty());
        assert_eq!(um, vec![0, 1, 2]);
    }

    #[test]
    fn conservation_and_monotonic_shrink() {
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        let tracks: Vec<_> = (0..4).map(|i| track_at(20.0 * i as f64, 0.0)).collect();
        let meas: Vec<_> = (0..3)
            .map(|j| measurement(&sensor, &[20.0 * j as f64 + 0.5, 0.3], 1.0, 0.0))
            .collect();

        let mut assoc = Associator::default()
            .associate(&tracks, &meas, &filter)
            .unwrap();
        let mut pairs = Vec::new();
        let (mut rows, mut cols) = assoc.matrix_shape();
        assert_eq!((rows, cols), (4, 3));

        while let Some(pair) = assoc.next_pair() {
            let (r, c) = assoc.matrix_shape();
            assert_eq!(r, rows - 1, "rows shrink by exactly one");
            assert_eq!(c, cols - 1, "cols shrink by exactly one");
            rows = r;
            cols = c;
            assert!(!assoc.unassigned_tracks.contains(&pair.0));
            assert!(!assoc.unassigned_meas.contains(&pair.1));
            pairs.push(pair);
        }

        let (ut, um) = assoc.into_unassigned();
        assert!(pairs.len() <= 3);
        assert_eq!(pairs.len() + ut.len(), 4);
        assert_eq!(pairs.len() + um.len(), 3);
    }

    #[test]
    fn every_yielded_pair_passes_the_gate() {
        let filter = ExtendedKalmanFilter::default();
        let gate = Gate::new(0.995);
        let sensor = xy_sensor("lidar", true);
        let tracks: Vec<_> = (0..3).map(|i| track_at(10.0 * i as f64, 5.0)).collect();
        let meas: Vec<_> = vec![
            measurement(&sensor, &[0.4, 5.1], 1.0, 0.0),
            measurement(&sensor, &[500.0, 500.0], 1.0, 0.0), // hopeless
            measurement(&sensor, &[20.3, 4.8], 1.0, 0.0),
        ];

        let assoc = Associator::new(gate.clone())
            .associate(&tracks, &meas, &filter)
            .unwrap();
        let (pairs, _, um) = drain(assoc);
        for &(ti, mi) in &pairs {
            let d = statistical_distance(&tracks[ti], &meas[mi], &filter).unwrap();
            assert!(gate.accepts(d, meas[mi].sensor.as_ref()));
        }
        assert!(um.contains(&1), "hopeless measurement stays unassigned");
    }

    #[test]
    fn deterministic_across_invocations() {
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        let tracks: Vec<_> = (0..5).map(|i| track_at(7.0 * i as f64, 3.0)).collect();
        let meas: Vec<_> = (0..5)
            .map(|j| measurement(&sensor, &[7.0 * j as f64 + 0.2, 2.9], 1.0, 0.0))
            .collect();

        let associator = Associator::default();
        let run = || {
            let assoc = associator.associate(&tracks, &meas, &filter).unwrap();
            drain(assoc).0
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn ties_break_in_row_major_order() {
        // Two identical tracks, two identical measurements: all four cells
        // hold the same distance. The first cell in row-then-column order
        // must win each round.
        let filter = ExtendedKalmanFilter::default();
        let sensor = xy_sensor("lidar", true);
        let tracks = vec![track_at(0.0, 0.0), track_at(0.0, 0.0)];
        let meas = vec![
            measurement(&sensor, &[1.0, 1.0], 1.0, 0.0),
            measurement(&sensor, &[1.0, 1.0], 1.0, 0.0),
        ];

        let assoc = Associator::default()
            .associate(&tracks, &meas, &filter)
            .unwrap();
        let (pairs, _, _) = drain(assoc);
        assert_eq!(pairs, vec![(0, 0), (1, 1)]);
    }
}
