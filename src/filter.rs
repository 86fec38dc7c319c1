//! Detection validation and label mapping, applied before tracking.

use std::collections::BTreeMap;

use log::{trace, warn};

use crate::config::DetectionFilterConfig;
use crate::error::DetectionError;
use crate::tracker::{Detection, ObjectType};

/// Drops malformed and low-confidence detections and maps detector labels
/// onto counting categories.
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    min_confidence: f32,
    labels: BTreeMap<String, ObjectType>,
}

impl DetectionFilter {
    pub fn new(config: &DetectionFilterConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            labels: config
                .labels
                .iter()
                .map(|(label, category)| (label.clone(), ObjectType::new(category.as_str())))
                .collect(),
        }
    }

    /// Validate one detection and rename its label to its category.
    pub fn check(&self, mut det: Detection) -> Result<Detection, DetectionError> {
        if !det.bbox.is_finite() || !det.score.is_finite() {
            return Err(DetectionError::NonFinite);
        }
        if det.bbox.is_inverted() {
            let [x_min, y_min, x_max, y_max] = det.bbox.to_tlbr();
            return Err(DetectionError::Inverted {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        if det.score < self.min_confidence {
            return Err(DetectionError::LowConfidence {
                score: det.score,
                min: self.min_confidence,
            });
        }
        if !self.labels.is_empty() {
            match self.labels.get(det.label.as_str()) {
                Some(category) => det.label = category.clone(),
                None => return Err(DetectionError::UnknownLabel(det.label.to_string())),
            }
        }
        Ok(det)
    }

    /// Keep the valid detections of a frame. Returns them with the number rejected.
    pub fn apply(&self, detections: Vec<Detection>) -> (Vec<Detection>, usize) {
        let total = detections.len();
        let valid: Vec<Detection> = detections
            .into_iter()
            .filter_map(|det| match self.check(det) {
                Ok(det) => Some(det),
                Err(err @ DetectionError::LowConfidence { .. }) => {
                    trace!("dropping detection: {err}");
                    None
                }
                Err(err) => {
                    warn!("rejecting detection: {err}");
                    None
                }
            })
            .collect();
        let rejected = total - valid.len();
        (valid, rejected)
    }
}
