//! Replay: serialize/deserialize recorded runs and play them back as sources.

use anyhow::Context;
use hud_core::source::{InertialSource, IterSource, SourcePoll};
use hud_core::{EulerAngles, InertialSample, Track};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A full recorded run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayLog {
    pub scenario_name: String,
    pub seed: u64,
    /// Seconds between camera frames
    pub frame_period: f64,
    /// One entry per camera frame, in chronological order
    pub frames: Vec<ReplayFrame>,
}

/// Everything the HUD received during one frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub time: f64,
    pub tracks: Vec<Track>,
    /// Inertial samples that arrived since the previous frame
    pub samples: Vec<InertialSample>,
    /// Simulated head attitude at `time`, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truth: Option<EulerAngles>,
}

impl ReplayLog {
    pub fn duration(&self) -> f64 {
        self.frames.last().map_or(0.0, |f| f.time)
    }

    pub fn sample_count(&self) -> usize {
        self.frames.iter().map(|f| f.samples.len()).sum()
    }

    /// Track batches, one per frame, then `Closed`.
    pub fn track_source(&self) -> IterSource<std::vec::IntoIter<Vec<Track>>> {
        let batches: Vec<Vec<Track>> = self.frames.iter().map(|f| f.tracks.clone()).collect();
        IterSource::new(batches.into_iter())
    }

    /// Inertial samples grouped by frame (see [`ReplayInertialSource`]).
    pub fn inertial_source(&self) -> ReplayInertialSource {
        ReplayInertialSource {
            groups: self.frames.iter().map(|f| f.samples.clone()).collect(),
            group: 0,
            pos: 0,
        }
    }
}

/// Plays back one frame's samples per drain: yields the current group, then
/// reports `Empty` once and moves on to the next group. `Closed` after the
/// last group.
#[derive(Clone, Debug)]
pub struct ReplayInertialSource {
    groups: Vec<Vec<InertialSample>>,
    group: usize,
    pos: usize,
}

impl InertialSource for ReplayInertialSource {
    fn poll_sample(&mut self) -> SourcePoll<InertialSample> {
        let Some(current) = self.groups.get(self.group) else {
            return SourcePoll::Closed;
        };
        match current.get(self.pos) {
            Some(sample) => {
                self.pos += 1;
                SourcePoll::Ready(*sample)
            }
            None => {
                self.group += 1;
                self.pos = 0;
                SourcePoll::Empty
            }
        }
    }
}

/// Save a replay log to a JSON file.
pub fn save_replay(log: &ReplayLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating replay {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a replay log from a JSON file.
pub fn load_replay(path: &Path) -> anyhow::Result<ReplayLog> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening replay {}", path.display()))?;
    let reader = BufReader::new(file);
    let log: ReplayLog = serde_json::from_reader(reader)
        .with_context(|| format!("parsing replay {}", path.display()))?;
    Ok(log)
}
