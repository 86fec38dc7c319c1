//! Detection input and detection-to-track association.

use std::borrow::Borrow;
use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::TrackingError;
use crate::tracker::rect::{Rect, iou_batch};

/// Padding cost for the dummy rows/columns of a non-square problem.
const PAD_COST: f64 = 1e6;

/// Counting category of an object, e.g. `car` or `van`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectType(String);

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ObjectType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for ObjectType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box, built from (x_min, y_min, x_max, y_max)
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
    /// Object label as emitted by the detector
    pub label: ObjectType,
}

impl Detection {
    pub fn new(
        x_min: f32,
        y_min: f32,
        x_max: f32,
        y_max: f32,
        score: f32,
        label: impl Into<ObjectType>,
    ) -> Self {
        Self {
            bbox: Rect::from_tlbr(x_min, y_min, x_max, y_max),
            score,
            label: label.into(),
        }
    }

    pub fn from_rect(bbox: Rect, score: f32, label: impl Into<ObjectType>) -> Self {
        Self {
            bbox,
            score,
            label: label.into(),
        }
    }
}

/// Compute the IoU distance matrix (1 - IoU) between tracks and detections.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    iou_batch(track_boxes, det_boxes).mapv(|iou| 1.0 - iou)
}

/// One-to-one pairing of tracks (rows) with detections (columns).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn all_unmatched(num_tracks: usize, num_detections: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_tracks: (0..num_tracks).collect(),
            unmatched_detections: (0..num_detections).collect(),
        }
    }
}

/// Pair predicted track boxes with detection boxes.
///
/// Pairs are chosen by a minimum-cost assignment over `1 - IoU`, then any
/// pair whose IoU is below `min_iou` is split back into the unmatched sets.
pub fn associate(
    track_boxes: &[Rect],
    det_boxes: &[Rect],
    min_iou: f32,
) -> Result<AssignmentResult, TrackingError> {
    if track_boxes.is_empty() || det_boxes.is_empty() {
        return Ok(AssignmentResult::all_unmatched(
            track_boxes.len(),
            det_boxes.len(),
        ));
    }

    let dists = iou_distance(track_boxes, det_boxes);
    check_shape(&dists, track_boxes.len(), det_boxes.len())?;
    linear_assignment(&dists, 1.0 - min_iou)
}

/// Ensure a cost matrix is `num_tracks x num_detections`.
pub fn check_shape(
    cost_matrix: &Array2<f32>,
    num_tracks: usize,
    num_detections: usize,
) -> Result<(), TrackingError> {
    let got = cost_matrix.dim();
    if got != (num_tracks, num_detections) {
        return Err(TrackingError::CostMatrixShape {
            tracks: num_tracks,
            detections: num_detections,
            got,
        });
    }
    Ok(())
}

/// Solve the rectangular assignment problem with Jonker-Volgenant.
///
/// The matrix is padded to square with a prohibitive cost, so rows or
/// columns assigned to padding come back unmatched. Solved pairs costing
/// more than `thresh` are rejected.
pub fn linear_assignment(
    cost_matrix: &Array2<f32>,
    thresh: f32,
) -> Result<AssignmentResult, TrackingError> {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return Ok(AssignmentResult::all_unmatched(num_rows, num_cols));
    }

    if let Some(((row, col), _)) = cost_matrix.indexed_iter().find(|(_, c)| !c.is_finite()) {
        return Err(TrackingError::NonFiniteCost { row, col });
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), PAD_COST);
    for ((i, j), &cost) in cost_matrix.indexed_iter() {
        padded[[i, j]] = cost as f64;
    }

    let (row_to_col, _) =
        lapjv::lapjv(&padded).map_err(|err| TrackingError::Solver(format!("{err:?}")))?;
    if row_to_col.len() != size {
        return Err(TrackingError::Solver(format!(
            "expected {size} row assignments, solver returned {}",
            row_to_col.len()
        )));
    }

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask = vec![true; num_cols];

    for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(num_rows) {
        if col_idx < num_cols && cost_matrix[[row_idx, col_idx]] <= thresh {
            matches.push((row_idx, col_idx));
            unmatched_detections_mask[col_idx] = false;
        } else {
            unmatched_tracks.push(row_idx);
        }
    }

    let unmatched_detections = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| u.then_some(i))
        .collect();

    Ok(AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_empty_sets_short_circuit() {
        let boxes = [Rect::new(0.0, 0.0, 10.0, 10.0)];

        let result = associate(&[], &boxes, 0.3).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_detections, vec![0]);

        let result = associate(&boxes, &[], 0.3).unwrap();
        assert_eq!(result.unmatched_tracks, vec![0]);
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_optimal_rather_than_greedy() {
        // Greedy on the cheapest entry (0, 0) would leave row 1 with cost 0.9.
        let costs = array![[0.1_f32, 0.2], [0.3, 0.9]];
        let result = linear_assignment(&costs, 1.0).unwrap();
        let mut matches = result.matches.clone();
        matches.sort();
        assert_eq!(matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_low_overlap_pairs_are_rejected() {
        let tracks = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        // IoU = 25 / 175, below 0.3
        let dets = [Rect::new(5.0, 5.0, 10.0, 10.0)];
        let result = associate(&tracks, &dets, 0.3).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_tracks, vec![0]);
        assert_eq!(result.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_rectangular_problem() {
        let tracks = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(100.0, 100.0, 10.0, 10.0),
        ];
        let dets = [
            Rect::new(101.0, 101.0, 10.0, 10.0),
            Rect::new(300.0, 300.0, 10.0, 10.0),
            Rect::new(1.0, 0.0, 10.0, 10.0),
        ];
        let result = associate(&tracks, &dets, 0.3).unwrap();
        let mut matches = result.matches.clone();
        matches.sort();
        assert_eq!(matches, vec![(0, 2), (1, 0)]);
        assert!(result.unmatched_tracks.is_empty());
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let costs = Array2::<f32>::zeros((2, 3));
        let err = check_shape(&costs, 3, 2).unwrap_err();
        assert_eq!(
            err,
            TrackingError::CostMatrixShape {
                tracks: 3,
                detections: 2,
                got: (2, 3)
            }
        );
    }

    #[test]
    fn test_non_finite_cost_is_an_error() {
        let costs = array![[0.1_f32, f32::NAN]];
        let err = linear_assignment(&costs, 1.0).unwrap_err();
        assert_eq!(err, TrackingError::NonFiniteCost { row: 0, col: 1 });
    }
}
