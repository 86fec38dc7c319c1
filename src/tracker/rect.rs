use nalgebra::Point2;
use ndarray::Array2;

/// Axis-aligned bounding box.
///
/// Stored as top-left corner plus size. Detections arrive as corner pairs
/// (x_min, y_min, x_max, y_max) and the motion model works on center plus
/// half-extents, so both conversions live here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width, negative for an inverted box
    pub width: f32,
    /// Height, negative for an inverted box
    pub height: f32,
}

impl Rect {
    /// Create a Rect from the top-left corner and its size.
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from corner coordinates (x_min, y_min, x_max, y_max).
    #[inline]
    pub fn from_tlbr(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self::new(x_min, y_min, x_max - x_min, y_max - y_min)
    }

    /// Create a Rect from its center and half-extents.
    ///
    /// Negative extents are clamped to zero.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, half_width: f32, half_height: f32) -> Self {
        let hw = half_width.max(0.0);
        let hh = half_height.max(0.0);
        Self::new(cx - hw, cy - hh, 2.0 * hw, 2.0 * hh)
    }

    /// Corner coordinates: (x_min, y_min, x_max, y_max).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Center and half-extents: (cx, cy, half_width, half_height).
    #[inline]
    pub fn to_center_extents(&self) -> [f32; 4] {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        [self.x + hw, self.y + hh, hw, hh]
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Copy of this box with negative sizes clamped to zero.
    #[inline]
    pub fn clamped(&self) -> Self {
        Self::new(self.x, self.y, self.width.max(0.0), self.height.max(0.0))
    }

    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.width < 0.0 || self.height < 0.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Intersection over Union with another box, in [0, 1].
    ///
    /// Both boxes are clamped first; two degenerate boxes have an IoU of zero.
    pub fn iou(&self, other: &Rect) -> f32 {
        let (a, other) = (self.clamped(), other.clamped());
        let x1 = a.x.max(other.x);
        let y1 = a.y.max(other.y);
        let x2 = (a.x + a.width).min(other.x + other.width);
        let y2 = (a.y + a.height).min(other.y + other.height);

        let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union_area = a.area() + other.area() - inter_area;

        if union_area > 0.0 {
            (inter_area / union_area).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Calculate the IoU matrix between two sets of boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b);
        }
    }
    ious
}
