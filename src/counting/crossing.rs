//! Exactly-once boundary crossing detection for confirmed tracks.

use crossbeam_channel::{Sender, TrySendError};
use log::{info, warn};

use crate::counting::boundary::{Boundary, CrossingDirection};
use crate::tracker::{ObjectType, Track, TrackId, TrackManager};

/// Notification that a track crossed a boundary. Emitted at most once per track.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingEvent {
    pub track_id: TrackId,
    pub object_type: ObjectType,
    pub frame_id: u64,
    /// Name of the boundary that was crossed
    pub boundary: String,
    pub direction: CrossingDirection,
}

/// Receiver of crossing events besides the count aggregator, e.g. a live display.
///
/// Subscribers observe events after the totals are updated and cannot
/// affect tracking state.
pub trait CrossingSubscriber {
    fn on_crossing(&mut self, event: &CrossingEvent);
}

/// Forward events into a channel without ever blocking the frame loop.
impl CrossingSubscriber for Sender<CrossingEvent> {
    fn on_crossing(&mut self, event: &CrossingEvent) {
        match self.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("crossing subscriber is full, dropping event for track {}", event.track_id);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Adapter turning a closure into a [`CrossingSubscriber`].
pub struct FnSubscriber<F>(pub F);

impl<F: FnMut(&CrossingEvent)> CrossingSubscriber for FnSubscriber<F> {
    fn on_crossing(&mut self, event: &CrossingEvent) {
        (self.0)(event)
    }
}

/// Tests confirmed tracks against the configured boundaries.
#[derive(Debug, Clone)]
pub struct CrossingDetector {
    boundaries: Vec<Boundary>,
}

impl CrossingDetector {
    pub fn new(boundaries: Vec<Boundary>) -> Self {
        Self { boundaries }
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Evaluate every confirmed, not yet counted track for the current frame.
    pub fn evaluate(&self, tracks: &mut TrackManager) -> Vec<CrossingEvent> {
        let frame_id = tracks.frame_id();
        tracks
            .tracks_mut()
            .iter_mut()
            .filter_map(|track| self.evaluate_track(track, frame_id))
            .collect()
    }

    /// Test one track's latest step. Sets the crossing flag on success.
    ///
    /// The step runs between matched detection centers, from where the
    /// previous test ended, so a line crossed while the track was Lost is
    /// still counted on re-acquisition. Boundaries are tried in
    /// configuration order; the first one crossed that applies to the
    /// track's type wins.
    pub(crate) fn evaluate_track(&self, track: &mut Track, frame_id: u64) -> Option<CrossingEvent> {
        if track.is_counted() {
            return None;
        }
        let (prev, curr) = track.crossing_step()?;
        track.advance_crossing_anchor();
        let object_type = track.object_type().clone();

        let (boundary, direction) = self.boundaries.iter().find_map(|boundary| {
            if !boundary.applies_to(&object_type) {
                return None;
            }
            boundary
                .crossing(prev, curr)
                .map(|direction| (boundary, direction))
        })?;

        if !track.record_crossing(object_type.clone(), frame_id) {
            return None;
        }
        info!(
            "track {} ({}) crossed `{}` {:?} at frame {}",
            track.track_id(),
            object_type,
            boundary.name(),
            direction,
            frame_id
        );

        Some(CrossingEvent {
            track_id: track.track_id(),
            object_type,
            frame_id,
            boundary: boundary.name().to_string(),
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Detection, TrackerConfig};
    use nalgebra::Point2;

    fn detector() -> CrossingDetector {
        CrossingDetector::new(vec![Boundary::new(
            "line",
            Point2::new(0.0, 40.0),
            Point2::new(100.0, 40.0),
        )])
    }

    fn car(y: f32) -> Detection {
        Detection::new(10.0, y, 50.0, y + 40.0, 0.9, "car")
    }

    /// Four stationary frames, then a step over y = 40.
    fn crossed_manager() -> TrackManager {
        let mut manager = TrackManager::new(TrackerConfig::default());
        for _ in 0..4 {
            manager.update(&[car(10.0)]).unwrap();
        }
        manager.update(&[car(25.0)]).unwrap();
        manager
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let mut manager = crossed_manager();
        let detector = detector();

        let events = detector.evaluate(&mut manager);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].object_type.as_str(), "car");
        assert_eq!(events[0].frame_id, 5);
        assert_eq!(events[0].direction, CrossingDirection::Forward);

        // Evaluating the same frame twice must not count again.
        assert!(detector.evaluate(&mut manager).is_empty());
        assert!(manager.tracks()[0].is_counted());
    }

    #[test]
    fn test_boundary_for_other_types_is_ignored() {
        let mut manager = crossed_manager();
        let detector = CrossingDetector::new(vec![
            Boundary::new("bus lane", Point2::new(0.0, 40.0), Point2::new(100.0, 40.0))
                .with_object_types(["bus"]),
        ]);
        assert!(detector.evaluate(&mut manager).is_empty());
        assert!(!manager.tracks()[0].is_counted());
    }

    #[test]
    fn test_channel_subscriber() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut subscriber = tx;
        let mut manager = crossed_manager();
        for event in detector().evaluate(&mut manager) {
            subscriber.on_crossing(&event);
            // A full channel drops instead of blocking.
            subscriber.on_crossing(&event);
        }
        assert_eq!(rx.try_recv().unwrap().frame_id, 5);
        assert!(rx.try_recv().is_err());
    }
}
