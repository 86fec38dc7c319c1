mod kalman_filter;
mod matching;
mod rect;
mod track;
mod track_manager;
mod track_state;

pub use kalman_filter::KalmanFilter;
pub use matching::{AssignmentResult, Detection, ObjectType, associate, iou_distance, linear_assignment};
pub use rect::{Rect, iou_batch};
pub use track::{CrossingRecord, Track, TrackId};
pub use track_manager::{FrameUpdate, TrackManager, TrackerConfig};
pub use track_state::TrackState;
