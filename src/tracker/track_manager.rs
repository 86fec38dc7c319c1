//! Per-frame track lifecycle: predict, associate, update, create, retire.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::TrackingError;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::Rect;
use crate::tracker::track::{Track, TrackId};
use crate::tracker::track_state::TrackState;

/// Configuration for the [`TrackManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum IoU between a prediction and a detection for them to match
    pub min_iou: f32,
    /// Consecutive matches before a tentative track is confirmed
    pub min_hits: u32,
    /// Frames without a match after which a track is retired
    pub max_age: u32,
    /// Number of recent centers kept per track
    pub history_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_iou: 0.3,
            min_hits: 3,
            max_age: 20,
            history_len: 32,
        }
    }
}

/// What happened to the track set during one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameUpdate {
    pub frame_id: u64,
    /// Tracks that matched a detection this frame
    pub matched: Vec<TrackId>,
    /// Tracks created from unmatched detections
    pub created: Vec<TrackId>,
    /// Tracks that left the active set, in their final state
    pub retired: Vec<Track>,
}

/// Owner of the active track set.
pub struct TrackManager {
    tracks: Vec<Track>,
    frame_id: u64,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
}

impl TrackManager {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: Vec::new(),
            frame_id: 0,
            config,
            kalman_filter: KalmanFilter::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Index of the last processed frame, starting at 1.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Active tracks in creation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.track_id() == track_id)
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &Track> {
        self.tracks
            .iter()
            .filter(|t| t.state() == TrackState::Confirmed)
    }

    /// Mutable view for the crossing detector. The slice cannot grow or shrink.
    pub(crate) fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    /// Advance the track set by one frame.
    ///
    /// Detections must already be validated. An error means the assignment
    /// contract was broken and the frame was not applied past prediction.
    pub fn update(&mut self, detections: &[Detection]) -> Result<FrameUpdate, TrackingError> {
        self.frame_id += 1;
        let frame_id = self.frame_id;
        let mut retired = Vec::new();

        // Step 1: Predict every track into the current frame
        for track in self.tracks.iter_mut() {
            track.predict(&self.kalman_filter);
        }
        self.retire_corrupted(&mut retired);

        // Step 2: Associate predictions with detections
        let track_rects: Vec<Rect> = self.tracks.iter().map(Track::rect).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::associate(&track_rects, &det_rects, self.config.min_iou)?;

        debug!(
            "frame {}: {} tracks, {} detections, {} matched",
            frame_id,
            track_rects.len(),
            det_rects.len(),
            matches.len()
        );

        // Step 3: Update matched tracks
        let mut matched = Vec::with_capacity(matches.len());
        for (itracked, idet) in matches {
            let track = &mut self.tracks[itracked];
            let was_tentative = track.state() == TrackState::Tentative;
            track.update(
                &detections[idet],
                &self.kalman_filter,
                frame_id,
                self.config.min_hits,
            );
            if was_tentative && track.state() == TrackState::Confirmed {
                info!(
                    "track {} confirmed at frame {} as {}",
                    track.track_id(),
                    frame_id,
                    track.object_type()
                );
            }
            matched.push(track.track_id());
        }

        // Step 4: Age unmatched tracks
        for itracked in unmatched_tracks {
            self.tracks[itracked].mark_missed(self.config.max_age);
        }

        // Step 5: Init new tracks
        let mut created = Vec::with_capacity(unmatched_detections.len());
        for idet in unmatched_detections {
            let track = Track::new(
                &detections[idet],
                &self.kalman_filter,
                frame_id,
                self.config.history_len,
            );
            created.push(track.track_id());
            self.tracks.push(track);
        }

        // Step 6: Drop corrupted and expired tracks
        self.retire_corrupted(&mut retired);
        let (expired, active): (Vec<Track>, Vec<Track>) = self
            .tracks
            .drain(..)
            .partition(|t| !t.state().is_active());
        self.tracks = active;
        for track in &expired {
            debug!(
                "track {} retired after {} missed frames",
                track.track_id(),
                track.time_since_update()
            );
        }
        retired.extend(expired);

        Ok(FrameUpdate {
            frame_id,
            matched,
            created,
            retired,
        })
    }

    fn retire_corrupted(&mut self, retired: &mut Vec<Track>) {
        if self.tracks.iter().all(Track::is_finite) {
            return;
        }
        let (corrupted, healthy): (Vec<Track>, Vec<Track>) =
            self.tracks.drain(..).partition(|t| !t.is_finite());
        self.tracks = healthy;
        for mut track in corrupted {
            warn!(
                "track {} has a non-finite state at frame {}, retiring it",
                track.track_id(),
                self.frame_id
            );
            track.mark_retired();
            retired.push(track);
        }
    }
}
