//! Polygonal zones and per-frame occupancy.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Point2;

use crate::tracker::{ObjectType, Track};

/// A closed polygon in image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    name: String,
    vertices: Vec<Point2<f32>>,
    object_types: BTreeSet<ObjectType>,
}

/// How many tracks of each type are inside a zone in the current frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneOccupancy {
    pub zone: String,
    pub counts: BTreeMap<ObjectType, usize>,
}

impl ZoneOccupancy {
    pub fn get(&self, object_type: &str) -> usize {
        self.counts.get(object_type).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl Zone {
    pub fn new(name: impl Into<String>, vertices: Vec<Point2<f32>>) -> Self {
        Self {
            name: name.into(),
            vertices,
            object_types: BTreeSet::new(),
        }
    }

    /// Restrict the zone to the given object types.
    pub fn with_object_types<T: Into<ObjectType>>(
        mut self,
        object_types: impl IntoIterator<Item = T>,
    ) -> Self {
        self.object_types = object_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Point2<f32>] {
        &self.vertices
    }

    pub fn applies_to(&self, object_type: &ObjectType) -> bool {
        self.object_types.is_empty() || self.object_types.contains(object_type)
    }

    /// Point-in-polygon by ray casting. Points on an edge are inside.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if on_segment(p, a, b) {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Count the given tracks whose current center lies inside the zone.
    pub fn occupancy<'a>(&self, tracks: impl IntoIterator<Item = &'a Track>) -> ZoneOccupancy {
        let mut counts = BTreeMap::new();
        for track in tracks {
            let object_type = track.object_type();
            if !self.applies_to(object_type) {
                continue;
            }
            if self.contains(track.rect().center()) {
                *counts.entry(object_type.clone()).or_insert(0) += 1;
            }
        }
        ZoneOccupancy {
            zone: self.name.clone(),
            counts,
        }
    }
}

fn on_segment(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> bool {
    let ab = b - a;
    let ap = p - a;
    let cross = ab.x * ap.y - ab.y * ap.x;
    if cross.abs() > f32::EPSILON * ab.norm().max(1.0) {
        return false;
    }
    let t = ap.dot(&ab);
    t >= 0.0 && t <= ab.norm_squared()
}
