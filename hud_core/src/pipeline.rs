//! Frame driver: one HUD refresh per track batch.
//!
//! # Steps per frame
//! 1. Batch-drain pending inertial samples into the estimator (bounded per frame)
//! 2. Read the attitude (absent until the estimator is ready)
//! 3. Render the track batch onto a fresh canvas
//!
//! The driver owns the renderer, the estimator and the motion classifier
//! exclusively; nothing is shared between frames except the attitude state.

use crate::{
    canvas::RadarCanvas,
    config::HudConfig,
    error::HudResult,
    orientation::{DrainStats, OrientationEstimator},
    renderer::{MotionClassifier, RadarRenderer, SpeedThreshold},
    source::{InertialSource, SourcePoll, TrackSource},
    types::{EulerAngles, InertialSample, Track},
};
use std::time::Instant;
use tracing::{debug, warn};

/// Outputs of one frame.
#[derive(Clone, Debug)]
pub struct HudFrame {
    /// Zero-based frame counter
    pub index: u64,
    pub canvas: RadarCanvas,
    /// `None` until the estimator has a sample or a bound source
    pub attitude: Option<EulerAngles>,
    /// Tracks drawn this frame
    pub track_count: usize,
    pub samples_integrated: usize,
    pub samples_rejected: usize,
    /// Wall-clock time spent rendering
    pub render_time_us: u64,
}

/// Renderer + estimator + classifier, driven once per frame.
pub struct HudPipeline {
    renderer: RadarRenderer,
    estimator: OrientationEstimator,
    classifier: Box<dyn MotionClassifier + Send + Sync>,
    /// Batch redrawn when the track source has nothing new
    last_tracks: Vec<Track>,
    frames: u64,
}

impl HudPipeline {
    /// Build from a full configuration with the default speed classifier.
    pub fn new(config: &HudConfig) -> HudResult<Self> {
        Self::with_classifier(config, SpeedThreshold::default())
    }

    pub fn with_classifier<C>(config: &HudConfig, classifier: C) -> HudResult<Self>
    where
        C: MotionClassifier + Send + Sync + 'static,
    {
        let renderer = RadarRenderer::new(config.display.clone())?;
        let estimator = OrientationEstimator::new(config.estimator)?;
        debug!(mode = estimator.mode(), "hud pipeline ready");
        Ok(Self {
            renderer,
            estimator,
            classifier: Box::new(classifier),
            last_tracks: Vec::new(),
            frames: 0,
        })
    }

    pub fn renderer(&self) -> &RadarRenderer {
        &self.renderer
    }

    pub fn estimator(&self) -> &OrientationEstimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut OrientationEstimator {
        &mut self.estimator
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Integrate `samples`, then render `tracks`.
    pub fn step(&mut self, tracks: &[Track], samples: &[InertialSample]) -> HudFrame {
        let stats = self.estimator.integrate_all(samples);
        self.last_tracks.clear();
        self.last_tracks.extend_from_slice(tracks);
        self.finish_frame(stats)
    }

    /// Drain `inertial`, pull one batch from `tracks`, render.
    ///
    /// An empty track source redraws the previous batch; a closed one ends
    /// the stream with `None`. An inertial source that is not streaming yet
    /// only delays the attitude readout.
    pub fn poll<T, I>(&mut self, tracks: &mut T, inertial: &mut I) -> Option<HudFrame>
    where
        T: TrackSource + ?Sized,
        I: InertialSource + ?Sized,
    {
        let stats = if inertial.is_ready() {
            if let Err(e) = self.estimator.bind(&*inertial) {
                warn!(error = %e, "binding inertial source");
            }
            self.estimator.drain(inertial).unwrap_or_default()
        } else {
            DrainStats::default()
        };

        match tracks.poll_tracks() {
            SourcePoll::Ready(batch) => self.last_tracks = batch,
            SourcePoll::Empty => {}
            SourcePoll::Closed => {
                debug!(frames = self.frames, "track source closed");
                return None;
            }
        }
        Some(self.finish_frame(stats))
    }

    fn finish_frame(&mut self, stats: DrainStats) -> HudFrame {
        let t0 = Instant::now();
        let canvas = self.renderer.render(&self.last_tracks, &*self.classifier);
        let render_time_us = t0.elapsed().as_micros() as u64;

        let frame = HudFrame {
            index: self.frames,
            canvas,
            attitude: self.estimator.attitude().ok(),
            track_count: self.last_tracks.len(),
            samples_integrated: stats.integrated,
            samples_rejected: stats.rejected,
            render_time_us,
        };
        self.frames += 1;
        frame
    }
}
