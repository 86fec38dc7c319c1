//! Error types for tracking, counting and configuration.

use thiserror::Error;

/// Errors surfaced by the per-frame tracking entry points.
///
/// These signal a broken contract between the caller and the tracker, never
/// bad detection data. Bad detections are dropped by the
/// [`DetectionFilter`](crate::DetectionFilter) before they reach the tracker.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackingError {
    #[error("cost matrix shape {got:?} does not match {tracks} tracks x {detections} detections")]
    CostMatrixShape {
        tracks: usize,
        detections: usize,
        got: (usize, usize),
    },

    #[error("cost matrix entry ({row}, {col}) is not finite")]
    NonFiniteCost { row: usize, col: usize },

    #[error("assignment solver failed: {0}")]
    Solver(String),
}

/// Reasons a single detection is rejected before tracking.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectionError {
    #[error("bounding box has non-finite coordinates")]
    NonFinite,

    #[error("bounding box is inverted: ({x_min}, {y_min}) > ({x_max}, {y_max})")]
    Inverted {
        x_min: f32,
        y_min: f32,
        x_max: f32,
        y_max: f32,
    },

    #[error("confidence {score} is below the minimum {min}")]
    LowConfidence { score: f32, min: f32 },

    #[error("unknown object label `{0}`")]
    UnknownLabel(String),
}

/// Invalid counter configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("min_iou must be in (0, 1), got {0}")]
    MinIou(f32),

    #[error("min_confidence must be in [0, 1], got {0}")]
    MinConfidence(f32),

    #[error("{0} must be a positive number of frames")]
    ZeroFrames(&'static str),

    #[error("history_len must be at least 2, got {0}")]
    HistoryLen(usize),

    #[error("at least one boundary must be configured")]
    NoBoundaries,

    #[error("boundary `{0}` is degenerate or has non-finite endpoints")]
    DegenerateBoundary(String),

    #[error("zone `{0}` needs at least three finite vertices")]
    DegenerateZone(String),

    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },
}

/// Failure of a [`CountingPipeline`](crate::CountingPipeline) frame.
#[derive(Debug, Error)]
pub enum PipelineError<E> {
    #[error("detection failed: {0:?}")]
    Detection(E),

    #[error(transparent)]
    Tracking(#[from] TrackingError),
}
