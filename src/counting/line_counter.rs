//! Single-threaded per-frame counting loop.

use log::debug;

use crate::config::CounterConfig;
use crate::counting::aggregator::{CountAggregator, CountSnapshot, CountsHandle};
use crate::counting::crossing::{CrossingDetector, CrossingEvent, CrossingSubscriber};
use crate::counting::zone::{Zone, ZoneOccupancy};
use crate::error::{ConfigError, TrackingError};
use crate::filter::DetectionFilter;
use crate::tracker::{Detection, Track, TrackManager};

/// Outcome of one processed frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub frame_id: u64,
    /// Detections dropped before tracking
    pub rejected: usize,
    pub crossings: Vec<CrossingEvent>,
    /// Tracks that left the active set this frame
    pub retired: Vec<Track>,
    /// One entry per configured zone, in configuration order
    pub occupancy: Vec<ZoneOccupancy>,
}

/// Turns per-frame detections into de-duplicated crossing counts.
///
/// Each call to [`process_frame`](Self::process_frame) runs filter, track
/// update, crossing test, aggregation and zone occupancy to completion
/// before returning.
pub struct LineCounter {
    filter: DetectionFilter,
    tracks: TrackManager,
    crossings: CrossingDetector,
    counts: CountAggregator,
    zones: Vec<Zone>,
    subscribers: Vec<Box<dyn CrossingSubscriber + Send>>,
}

impl LineCounter {
    pub fn new(config: CounterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            filter: DetectionFilter::new(&config.detections),
            crossings: CrossingDetector::new(
                config.boundaries.iter().map(|b| b.build()).collect(),
            ),
            zones: config.zones.iter().map(|z| z.build()).collect(),
            tracks: TrackManager::new(config.tracker),
            counts: CountAggregator::new(),
            subscribers: Vec::new(),
        })
    }

    /// Register an additional receiver of crossing events.
    pub fn subscribe(&mut self, subscriber: impl CrossingSubscriber + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Process one frame of detections.
    ///
    /// Malformed detections are dropped and counted in the report. An error
    /// is only returned when association breaks its contract, in which case
    /// the frame is not counted.
    pub fn process_frame(
        &mut self,
        detections: Vec<Detection>,
    ) -> Result<FrameReport, TrackingError> {
        let (detections, rejected) = self.filter.apply(detections);
        let update = self.tracks.update(&detections)?;

        let crossings = self.crossings.evaluate(&mut self.tracks);
        self.counts.record_all(&crossings);
        for event in &crossings {
            for subscriber in self.subscribers.iter_mut() {
                subscriber.on_crossing(event);
            }
        }

        let occupancy = self
            .zones
            .iter()
            .map(|zone| zone.occupancy(self.tracks.confirmed()))
            .collect();

        if !crossings.is_empty() {
            debug!(
                "frame {}: {} crossings, totals {:?}",
                update.frame_id,
                crossings.len(),
                self.counts.snapshot()
            );
        }

        Ok(FrameReport {
            frame_id: update.frame_id,
            rejected,
            crossings,
            retired: update.retired,
            occupancy,
        })
    }

    pub fn tracks(&self) -> &TrackManager {
        &self.tracks
    }

    pub fn boundaries(&self) -> &CrossingDetector {
        &self.crossings
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn frame_id(&self) -> u64 {
        self.tracks.frame_id()
    }

    /// Current totals.
    pub fn snapshot(&self) -> CountSnapshot {
        self.counts.snapshot()
    }

    /// Read handle that can be moved to another thread.
    pub fn counts(&self) -> CountsHandle {
        self.counts.handle()
    }
}
