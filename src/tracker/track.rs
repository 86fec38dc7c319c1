//! A single tracked object.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Point2;
use ndarray::{Array1, Array2};

use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{Detection, ObjectType};
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

pub type TrackId = u64;

/// Process-wide identity source. Never reset, so identities are never reused.
static TRACK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_track_id() -> TrackId {
    TRACK_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// The type a track was counted as, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossingRecord {
    pub object_type: ObjectType,
    pub frame_id: u64,
}

/// Single object track.
///
/// Owned by the [`TrackManager`](crate::TrackManager). Everything outside
/// the tracker reads it through accessors; the crossing flag is the only
/// state the counting side may set.
#[derive(Debug, Clone)]
pub struct Track {
    track_id: TrackId,
    state: TrackState,
    score: f32,
    start_frame: u64,
    /// Frame of the last matched detection
    frame_id: u64,
    hits: u32,
    hit_streak: u32,
    time_since_update: u32,
    mean: Array1<f64>,
    covariance: Array2<f64>,
    last_label: ObjectType,
    label_votes: BTreeMap<ObjectType, u32>,
    history: VecDeque<Point2<f32>>,
    history_len: usize,
    /// Centers of the previous and latest matched detections
    measured: (Point2<f32>, Point2<f32>),
    /// Measured center at the last crossing test while confirmed
    crossing_anchor: Option<Point2<f32>>,
    crossing: Option<CrossingRecord>,
}

impl Track {
    /// Start a tentative track from an unmatched detection.
    pub(crate) fn new(
        det: &Detection,
        kalman_filter: &KalmanFilter,
        frame_id: u64,
        history_len: usize,
    ) -> Self {
        let (mean, covariance) = kalman_filter.initiate(measurement(&det.bbox));
        let mut label_votes = BTreeMap::new();
        label_votes.insert(det.label.clone(), 1);
        let center = det.bbox.center();

        let mut track = Self {
            track_id: next_track_id(),
            state: TrackState::Tentative,
            score: det.score,
            start_frame: frame_id,
            frame_id,
            hits: 1,
            hit_streak: 1,
            time_since_update: 0,
            mean,
            covariance,
            last_label: det.label.clone(),
            label_votes,
            history: VecDeque::with_capacity(history_len),
            history_len,
            measured: (center, center),
            crossing_anchor: None,
            crossing: None,
        };
        track.push_center();
        track
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Confidence of the last matched detection.
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    /// Frame of the last matched detection.
    pub fn end_frame(&self) -> u64 {
        self.frame_id
    }

    /// Total number of matched detections, including the first one.
    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn hit_streak(&self) -> u32 {
        self.hit_streak
    }

    /// Consecutive frames without a matched detection.
    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    /// Current estimated box.
    pub fn rect(&self) -> Rect {
        Rect::from_center(
            self.mean[0] as f32,
            self.mean[1] as f32,
            self.mean[2] as f32,
            self.mean[3] as f32,
        )
    }

    /// Estimated velocity of the box center, in pixels per frame.
    pub fn velocity(&self) -> (f32, f32) {
        (self.mean[4] as f32, self.mean[5] as f32)
    }

    /// Recent centers, oldest first. One entry per frame the track was alive.
    pub fn history(&self) -> &VecDeque<Point2<f32>> {
        &self.history
    }

    /// Center of the latest matched detection.
    pub fn measured_center(&self) -> Point2<f32> {
        self.measured.1
    }

    /// The step to test against the boundaries this frame.
    ///
    /// Only a confirmed track matched in the current frame has one. It runs
    /// from the measured center at the previous test, or from the previous
    /// detection on the first test, to the latest detection. Frames spent
    /// Lost in between are spanned by a single step.
    pub(crate) fn crossing_step(&self) -> Option<(Point2<f32>, Point2<f32>)> {
        if self.state != TrackState::Confirmed || self.time_since_update > 0 {
            return None;
        }
        let (prev, curr) = self.measured;
        Some((self.crossing_anchor.unwrap_or(prev), curr))
    }

    /// Mark the latest detection as tested.
    pub(crate) fn advance_crossing_anchor(&mut self) {
        self.crossing_anchor = Some(self.measured.1);
    }

    /// Label of the most recent matched detection.
    pub fn last_label(&self) -> &ObjectType {
        &self.last_label
    }

    /// Majority label over all matched detections.
    ///
    /// Ties go to the most recent label, then to the smallest label.
    pub fn object_type(&self) -> &ObjectType {
        let best = self.label_votes.values().copied().max().unwrap_or(0);
        if self.label_votes.get(&self.last_label).copied() == Some(best) {
            return &self.last_label;
        }
        self.label_votes
            .iter()
            .find(|(_, votes)| **votes == best)
            .map(|(label, _)| label)
            .unwrap_or(&self.last_label)
    }

    pub fn crossing(&self) -> Option<&CrossingRecord> {
        self.crossing.as_ref()
    }

    pub fn is_counted(&self) -> bool {
        self.crossing.is_some()
    }

    /// Set the crossing flag. Returns `false` if it was already set.
    pub(crate) fn record_crossing(&mut self, object_type: ObjectType, frame_id: u64) -> bool {
        if self.crossing.is_some() {
            return false;
        }
        self.crossing = Some(CrossingRecord {
            object_type,
            frame_id,
        });
        true
    }

    /// Project the state to the current frame.
    pub(crate) fn predict(&mut self, kalman_filter: &KalmanFilter) {
        let mut mean = self.mean.clone();
        if self.state == TrackState::Lost {
            // Coasting tracks keep moving but stop growing or shrinking.
            mean[6] = 0.0;
            mean[7] = 0.0;
        }
        let (mean, covariance) = kalman_filter.predict(&mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
    }

    /// Fold a matched detection into the track.
    pub(crate) fn update(
        &mut self,
        det: &Detection,
        kalman_filter: &KalmanFilter,
        frame_id: u64,
        min_hits: u32,
    ) {
        match kalman_filter.update(&self.mean, &self.covariance, measurement(&det.bbox)) {
            Some((mean, covariance)) => {
                self.mean = mean;
                self.covariance = covariance;
            }
            None => self.mean.fill(f64::NAN),
        }

        self.frame_id = frame_id;
        self.score = det.score;
        self.hits += 1;
        self.hit_streak += 1;
        self.time_since_update = 0;
        self.last_label = det.label.clone();
        self.measured = (self.measured.1, det.bbox.center());
        *self.label_votes.entry(det.label.clone()).or_insert(0) += 1;

        match self.state {
            TrackState::Tentative if self.hit_streak >= min_hits => {
                self.state = TrackState::Confirmed;
            }
            TrackState::Lost => self.state = TrackState::Confirmed,
            _ => {}
        }
        self.push_center();
    }

    /// Record a frame without a matched detection.
    pub(crate) fn mark_missed(&mut self, max_age: u32) {
        self.hit_streak = 0;
        self.time_since_update += 1;
        if self.state == TrackState::Confirmed {
            self.state = TrackState::Lost;
        }
        if self.time_since_update > max_age {
            self.state = TrackState::Retired;
        }
        self.push_center();
    }

    pub(crate) fn mark_retired(&mut self) {
        self.state = TrackState::Retired;
    }

    /// Whether the filter state is still usable.
    pub(crate) fn is_finite(&self) -> bool {
        self.mean.iter().all(|v| v.is_finite()) && self.covariance.iter().all(|v| v.is_finite())
    }

    fn push_center(&mut self) {
        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history
            .push_back(Point2::new(self.mean[0] as f32, self.mean[1] as f32));
    }
}

fn measurement(bbox: &Rect) -> [f64; 4] {
    bbox.to_center_extents().map(f64::from)
}
