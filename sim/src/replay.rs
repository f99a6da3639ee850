//! Replay: serialize/deserialize simulation logs for offline analysis.
//!
//! Measurements carry live sensor handles, so the log stores raw observation
//! vectors plus the index of the producing sensor within the scenario's
//! sensor list; reconstruction reattaches the handles from a freshly built
//! scenario.

use crate::scenarios::ScenarioKind;
use crate::sensor_sim::SimSensor;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracker_core::types::{DVec, Measurement};

/// A full recorded simulation log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayLog {
    pub scenario: ScenarioKind,
    pub name: String,
    pub seed: u64,
    pub dt: f64,
    /// All measurement frames in chronological order
    pub frames: Vec<RecordedFrame>,
    /// Ground-truth target states, one entry per frame
    pub ground_truth: Vec<GroundTruthFrame>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub time: f64,
    pub measurements: Vec<RecordedMeasurement>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedMeasurement {
    /// Index of the producing sensor in the scenario's sensor list
    pub sensor: usize,
    pub z: Vec<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroundTruthFrame {
    pub time: f64,
    pub targets: Vec<TargetState>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetState {
    pub id: u64,
    pub state: [f64; 6],
}

impl RecordedFrame {
    /// Record a frame, mapping each measurement back to its sensor index by
    /// handle identity.
    pub fn record(time: f64, measurements: &[Measurement], sensors: &[SimSensor]) -> Self {
        let recorded = measurements
            .iter()
            .map(|m| {
                let sensor = sensors
                    .iter()
                    .position(|s| std::sync::Arc::ptr_eq(&s.model, &m.sensor))
                    .unwrap_or(0);
                RecordedMeasurement {
                    sensor,
                    z: m.z.as_slice().to_vec(),
                }
            })
            .collect();
        Self {
            time,
            measurements: recorded,
        }
    }

    /// Rebuild live measurements against a scenario's sensor list.
    pub fn to_measurements(&self, sensors: &[SimSensor]) -> Vec<Measurement> {
        self.measurements
            .iter()
            .map(|r| {
                let sensor = &sensors[r.sensor];
                sensor.measurement(DVec::from_row_slice(&r.z), self.time)
            })
            .collect()
    }
}

/// Save a replay log to a JSON file.
pub fn save_replay(log: &ReplayLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a replay log from a JSON file.
pub fn load_replay(path: &Path) -> anyhow::Result<ReplayLog> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let log: ReplayLog = serde_json::from_reader(reader)?;
    Ok(log)
}
