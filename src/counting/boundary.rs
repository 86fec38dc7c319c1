//! Counting line segments and the crossing test.

use std::collections::BTreeSet;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::tracker::ObjectType;

/// Which way a trajectory crossed a boundary.
///
/// Sides are taken relative to the boundary's direction vector
/// `end - start`: `Forward` goes from the negative side of the
/// 2-D cross product to the positive side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossingDirection {
    Forward,
    Backward,
}

/// A finite counting line.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    name: String,
    start: Point2<f32>,
    end: Point2<f32>,
    /// Empty means every type is counted on this line
    object_types: BTreeSet<ObjectType>,
}

impl Boundary {
    pub fn new(name: impl Into<String>, start: Point2<f32>, end: Point2<f32>) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            object_types: BTreeSet::new(),
        }
    }

    /// Restrict the boundary to the given object types.
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

    pub fn start(&self) -> Point2<f32> {
        self.start
    }

    pub fn end(&self) -> Point2<f32> {
        self.end
    }

    pub fn applies_to(&self, object_type: &ObjectType) -> bool {
        self.object_types.is_empty() || self.object_types.contains(object_type)
    }

    /// Signed side of `p`: the 2-D cross product of `end - start` and `p - start`.
    #[inline]
    pub fn side(&self, p: Point2<f32>) -> f32 {
        let d = self.end - self.start;
        let v = p - self.start;
        d.x * v.y - d.y * v.x
    }

    /// Test the step `prev -> curr` against this segment.
    ///
    /// The step crosses when it leaves one side strictly and lands on the
    /// other side or on the line, and the intersection with the supporting
    /// line falls within the segment's extent.
    pub fn crossing(&self, prev: Point2<f32>, curr: Point2<f32>) -> Option<CrossingDirection> {
        let s0 = self.side(prev);
        let s1 = self.side(curr);
        let direction = if s0 < 0.0 && s1 >= 0.0 {
            CrossingDirection::Forward
        } else if s0 > 0.0 && s1 <= 0.0 {
            CrossingDirection::Backward
        } else {
            return None;
        };

        let alpha = s0 / (s0 - s1);
        let hit = prev + (curr - prev) * alpha;
        let d = self.end - self.start;
        let u = (hit - self.start).dot(&d) / d.norm_squared();

        (0.0..=1.0).contains(&u).then_some(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal() -> Boundary {
        Boundary::new("line", Point2::new(0.0, 40.0), Point2::new(100.0, 40.0))
    }

    #[test]
    fn test_crossing_directions() {
        let line = horizontal();
        assert_eq!(
            line.crossing(Point2::new(30.0, 30.0), Point2::new(30.0, 45.0)),
            Some(CrossingDirection::Forward)
        );
        assert_eq!(
            line.crossing(Point2::new(30.0, 45.0), Point2::new(30.0, 30.0)),
            Some(CrossingDirection::Backward)
        );
    }

    #[test]
    fn test_same_side_is_not_a_crossing() {
        let line = horizontal();
        assert_eq!(
            line.crossing(Point2::new(30.0, 10.0), Point2::new(30.0, 39.0)),
            None
        );
        assert_eq!(
            line.crossing(Point2::new(30.0, 41.0), Point2::new(30.0, 80.0)),
            None
        );
    }

    #[test]
    fn test_landing_on_the_line_counts_once() {
        let line = horizontal();
        assert!(line
            .crossing(Point2::new(30.0, 30.0), Point2::new(30.0, 40.0))
            .is_some());
        // Leaving the line afterwards is not a second crossing.
        assert!(line
            .crossing(Point2::new(30.0, 40.0), Point2::new(30.0, 50.0))
            .is_none());
    }

    #[test]
    fn test_crossing_outside_extent() {
        let line = horizontal();
        assert_eq!(
            line.crossing(Point2::new(150.0, 30.0), Point2::new(150.0, 50.0)),
            None
        );
    }

    #[test]
    fn test_diagonal_step_through_segment() {
        let line = Boundary::new("diag", Point2::new(0.0, 0.0), Point2::new(100.0, 100.0));
        assert!(line
            .crossing(Point2::new(60.0, 40.0), Point2::new(40.0, 60.0))
            .is_some());
        // The supporting line is crossed beyond the segment's end.
        assert!(line
            .crossing(Point2::new(160.0, 140.0), Point2::new(140.0, 160.0))
            .is_none());
    }

    #[test]
    fn test_type_partition() {
        let line = horizontal().with_object_types(["bus"]);
        assert!(line.applies_to(&ObjectType::from("bus")));
        assert!(!line.applies_to(&ObjectType::from("car")));
        assert!(horizontal().applies_to(&ObjectType::from("car")));
    }
}
