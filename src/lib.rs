//! Multi-object tracking and line-crossing counts.
//!
//! Per-frame detections are associated with persistent tracks by a
//! constant-velocity Kalman filter and optimal IoU assignment. Confirmed
//! tracks whose center crosses a configured boundary are counted exactly
//! once, under their majority label.
//!
//! ```ignore
//! use linecount_rs::{BoundaryConfig, CounterConfig, Detection, LineCounter};
//!
//! let config = CounterConfig::default()
//!     .with_boundary(BoundaryConfig::new("gate", [250.0, 267.0], [677.0, 267.0]));
//! let mut counter = LineCounter::new(config)?;
//!
//! for frame in frames {
//!     let report = counter.process_frame(frame)?;
//!     for event in &report.crossings {
//!         println!("track {} counted as {}", event.track_id, event.object_type);
//!     }
//! }
//! println!("{:?}", counter.snapshot());
//! ```

pub mod config;
pub mod counting;
pub mod error;
pub mod filter;
pub mod integration;
pub mod tracker;

pub use config::{BoundaryConfig, CounterConfig, DetectionFilterConfig, ZoneConfig};
pub use counting::{
    Boundary, CountAggregator, CountSnapshot, CountsHandle, CrossingDetector, CrossingDirection,
    CrossingEvent, CrossingSubscriber, FnSubscriber, FrameReport, LineCounter, Zone,
    ZoneOccupancy,
};
pub use error::{ConfigError, DetectionError, PipelineError, TrackingError};
pub use filter::DetectionFilter;
pub use integration::{CountingPipeline, DetectionBuilder, DetectionSource, IntoDetections};
pub use tracker::{
    Detection, ObjectType, Rect, Track, TrackId, TrackManager, TrackState, TrackerConfig,
};
