//! Trait for object detection inference backends.

use crate::tracker::Detection;

/// Source of per-frame detections, e.g. an inference backend.
///
/// Implement this trait to feed any detection model into a
/// [`CountingPipeline`](super::CountingPipeline).
///
/// # Example
///
/// ```ignore
/// use linecount_rs::{Detection, DetectionSource};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return labelled detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data and return detections.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Conversion from model-specific outputs to `Detection`.
pub trait IntoDetections {
    /// Convert the output into a vector of detections.
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// Rows of `([x_min, y_min, x_max, y_max], score, label)`.
impl IntoDetections for Vec<([f32; 4], f32, String)> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|([x1, y1, x2, y2], score, label)| Detection::new(x1, y1, x2, y2, score, label))
            .collect()
    }
}
