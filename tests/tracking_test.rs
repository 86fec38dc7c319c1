use linecount_rs::{Detection, TrackManager, TrackState, TrackerConfig};

fn car(x: f32, y: f32) -> Detection {
    Detection::new(x, y, x + 40.0, y + 40.0, 0.9, "car")
}

#[test]
fn test_basic_tracking() {
    let mut tracker = TrackManager::new(TrackerConfig::default());

    // Frame 1: One detection starts a tentative track
    let update = tracker.update(&[car(100.0, 100.0)]).unwrap();
    assert_eq!(update.created.len(), 1);
    let id = update.created[0];
    assert_eq!(tracker.get(id).unwrap().state(), TrackState::Tentative);

    // Frames 2-10: Same object moving right keeps its identity
    for frame in 2..=10 {
        let x = 100.0 + 4.0 * (frame - 1) as f32;
        let update = tracker.update(&[car(x, 100.0)]).unwrap();
        assert_eq!(update.matched, vec![id]);
        assert!(update.created.is_empty());
    }

    let track = tracker.get(id).unwrap();
    assert_eq!(track.state(), TrackState::Confirmed);
    assert_eq!(track.hits(), 10);
    assert_eq!(track.start_frame(), 1);
    assert_eq!(track.end_frame(), 10);
    assert!(track.velocity().0 > 0.0);
}

#[test]
fn test_confirmation_after_min_hits() {
    let mut tracker = TrackManager::new(TrackerConfig::default());

    tracker.update(&[car(100.0, 100.0)]).unwrap();
    tracker.update(&[car(100.0, 100.0)]).unwrap();
    assert_eq!(tracker.confirmed().count(), 0);

    tracker.update(&[car(100.0, 100.0)]).unwrap();
    assert_eq!(tracker.confirmed().count(), 1);
}

#[test]
fn test_separate_objects_keep_separate_ids() {
    let mut tracker = TrackManager::new(TrackerConfig::default());

    let update = tracker
        .update(&[car(10.0, 10.0), car(400.0, 300.0)])
        .unwrap();
    assert_eq!(update.created.len(), 2);
    let (left, right) = (update.created[0], update.created[1]);
    assert_ne!(left, right);

    for frame in 1..8 {
        let step = 3.0 * frame as f32;
        tracker
            .update(&[car(400.0 - step, 300.0), car(10.0 + step, 10.0)])
            .unwrap();
    }

    assert_eq!(tracker.tracks().len(), 2);
    assert!(tracker.get(left).unwrap().rect().x < 100.0);
    assert!(tracker.get(right).unwrap().rect().x > 300.0);
}

#[test]
fn test_lost_track_is_reacquired() {
    let mut tracker = TrackManager::new(TrackerConfig::default());

    let id = tracker.update(&[car(100.0, 100.0)]).unwrap().created[0];
    for _ in 0..3 {
        tracker.update(&[car(100.0, 100.0)]).unwrap();
    }

    // Short occlusion
    tracker.update(&[]).unwrap();
    assert_eq!(tracker.get(id).unwrap().state(), TrackState::Lost);
    tracker.update(&[]).unwrap();

    let update = tracker.update(&[car(100.0, 100.0)]).unwrap();
    assert_eq!(update.matched, vec![id]);
    assert!(update.created.is_empty());
    let track = tracker.get(id).unwrap();
    assert_eq!(track.state(), TrackState::Confirmed);
    assert_eq!(track.time_since_update(), 0);
}

#[test]
fn test_unmatched_tracks_retire_after_max_age() {
    let mut tracker = TrackManager::new(TrackerConfig {
        max_age: 2,
        ..TrackerConfig::default()
    });

    let id = tracker.update(&[car(100.0, 100.0)]).unwrap().created[0];
    tracker.update(&[car(100.0, 100.0)]).unwrap();
    tracker.update(&[car(100.0, 100.0)]).unwrap();

    assert!(tracker.update(&[]).unwrap().retired.is_empty());
    assert!(tracker.update(&[]).unwrap().retired.is_empty());

    let update = tracker.update(&[]).unwrap();
    assert_eq!(update.retired.len(), 1);
    assert_eq!(update.retired[0].track_id(), id);
    assert_eq!(update.retired[0].state(), TrackState::Retired);
    assert!(tracker.tracks().is_empty());
    assert!(tracker.get(id).is_none());
}

#[test]
fn test_ids_are_never_reused() {
    let mut tracker = TrackManager::new(TrackerConfig {
        max_age: 1,
        ..TrackerConfig::default()
    });

    let first = tracker.update(&[car(100.0, 100.0)]).unwrap().created[0];
    tracker.update(&[]).unwrap();
    tracker.update(&[]).unwrap();
    assert!(tracker.tracks().is_empty());

    let second = tracker.update(&[car(100.0, 100.0)]).unwrap().created[0];
    assert!(second > first);

    let other = TrackManager::new(TrackerConfig::default())
        .update(&[car(0.0, 0.0)])
        .unwrap()
        .created[0];
    assert!(other > first);
}

#[test]
fn test_empty_frames() {
    let mut tracker = TrackManager::new(TrackerConfig::default());
    for _ in 0..5 {
        let update = tracker.update(&[]).unwrap();
        assert!(update.matched.is_empty());
        assert!(update.created.is_empty());
    }
    assert_eq!(tracker.frame_id(), 5);
}
