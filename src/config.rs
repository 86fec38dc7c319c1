//! Counter configuration, read once at start-up.

use std::collections::{BTreeMap, HashSet};

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::counting::{Boundary, Zone};
use crate::error::ConfigError;
use crate::tracker::TrackerConfig;

/// Complete configuration of a [`LineCounter`](crate::LineCounter).
///
/// Deserializable from any serde format. Missing sections fall back to
/// their defaults, except `boundaries`, which must name at least one line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub tracker: TrackerConfig,
    pub detections: DetectionFilterConfig,
    pub boundaries: Vec<BoundaryConfig>,
    pub zones: Vec<ZoneConfig>,
}

impl CounterConfig {
    pub fn with_boundary(mut self, boundary: BoundaryConfig) -> Self {
        self.boundaries.push(boundary);
        self
    }

    pub fn with_zone(mut self, zone: ZoneConfig) -> Self {
        self.zones.push(zone);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tracker = &self.tracker;
        if !(tracker.min_iou > 0.0 && tracker.min_iou < 1.0) {
            return Err(ConfigError::MinIou(tracker.min_iou));
        }
        if tracker.min_hits == 0 {
            return Err(ConfigError::ZeroFrames("min_hits"));
        }
        if tracker.max_age == 0 {
            return Err(ConfigError::ZeroFrames("max_age"));
        }
        if tracker.history_len < 2 {
            return Err(ConfigError::HistoryLen(tracker.history_len));
        }

        let min_confidence = self.detections.min_confidence;
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(ConfigError::MinConfidence(min_confidence));
        }

        if self.boundaries.is_empty() {
            return Err(ConfigError::NoBoundaries);
        }
        let mut names = HashSet::new();
        for boundary in &self.boundaries {
            let finite = boundary.start.iter().chain(&boundary.end).all(|v| v.is_finite());
            if !finite || boundary.start == boundary.end {
                return Err(ConfigError::DegenerateBoundary(boundary.name.clone()));
            }
            if !names.insert(boundary.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    kind: "boundary",
                    name: boundary.name.clone(),
                });
            }
        }

        let mut names = HashSet::new();
        for zone in &self.zones {
            let finite = zone.vertices.iter().flatten().all(|v| v.is_finite());
            if !finite || zone.vertices.len() < 3 {
                return Err(ConfigError::DegenerateZone(zone.name.clone()));
            }
            if !names.insert(zone.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    kind: "zone",
                    name: zone.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Which detections are admitted, and how their labels are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionFilterConfig {
    /// Detections scoring below this are dropped
    pub min_confidence: f32,
    /// Detector label -> counting category. Empty admits every label as-is;
    /// otherwise labels missing from the table are rejected.
    pub labels: BTreeMap<String, String>,
}

impl Default for DetectionFilterConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            labels: BTreeMap::new(),
        }
    }
}

impl DetectionFilterConfig {
    /// Road-traffic categories: trucks and tuk-tuks are counted as vans.
    pub fn vehicle_categories() -> BTreeMap<String, String> {
        [
            ("car", "car"),
            ("bus", "bus"),
            ("truck", "van"),
            ("tuk-tuk", "van"),
            ("motorcycle", "motor"),
            ("bicycle", "bicycle"),
        ]
        .into_iter()
        .map(|(label, category)| (label.to_string(), category.to_string()))
        .collect()
    }
}

/// A counting line given by its two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    pub name: String,
    pub start: [f32; 2],
    pub end: [f32; 2],
    /// Types counted on this line; empty counts every type
    #[serde(default)]
    pub object_types: Vec<String>,
}

impl BoundaryConfig {
    pub fn new(name: impl Into<String>, start: [f32; 2], end: [f32; 2]) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            object_types: Vec::new(),
        }
    }

    pub fn for_types<S: Into<String>>(mut self, object_types: impl IntoIterator<Item = S>) -> Self {
        self.object_types = object_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(&self) -> Boundary {
        Boundary::new(
            self.name.clone(),
            Point2::from(self.start),
            Point2::from(self.end),
        )
        .with_object_types(self.object_types.iter().map(String::as_str))
    }
}

/// A polygonal occupancy zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub vertices: Vec<[f32; 2]>,
    #[serde(default)]
    pub object_types: Vec<String>,
}

impl ZoneConfig {
    pub fn new(name: impl Into<String>, vertices: Vec<[f32; 2]>) -> Self {
        Self {
            name: name.into(),
            vertices,
            object_types: Vec::new(),
        }
    }

    pub fn build(&self) -> Zone {
        Zone::new(
            self.name.clone(),
            self.vertices.iter().copied().map(Point2::from).collect(),
        )
        .with_object_types(self.object_types.iter().map(String::as_str))
    }
}
