//! CountingPipeline for combining detection with tracking and counting.

use crate::config::CounterConfig;
use crate::counting::{CountsHandle, FrameReport, LineCounter};
use crate::error::{ConfigError, PipelineError};

use super::{DetectionSource, IntoDetections};

/// Bundles detection inference with a [`LineCounter`].
pub struct CountingPipeline<D: DetectionSource> {
    detector: D,
    counter: LineCounter,
}

impl<D: DetectionSource> CountingPipeline<D> {
    /// Create a new pipeline with the given detector and counter config.
    pub fn new(detector: D, config: CounterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detector,
            counter: LineCounter::new(config)?,
        })
    }

    /// Run detection on one image and count it.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<FrameReport, PipelineError<D::Error>> {
        let detections = self
            .detector
            .detect(input, width, height)
            .map_err(PipelineError::Detection)?;
        Ok(self.counter.process_frame(detections)?)
    }

    /// Count a frame whose detections were produced elsewhere.
    pub fn process_detections(
        &mut self,
        output: impl IntoDetections,
    ) -> Result<FrameReport, PipelineError<D::Error>> {
        Ok(self.counter.process_frame(output.into_detections())?)
    }

    /// Read handle on the totals for exporters and displays.
    pub fn counts(&self) -> CountsHandle {
        self.counter.counts()
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying counter.
    pub fn counter(&self) -> &LineCounter {
        &self.counter
    }

    /// Get a mutable reference to the underlying counter.
    pub fn counter_mut(&mut self) -> &mut LineCounter {
        &mut self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryConfig;
    use crate::tracker::Detection;

    /// Replays one scripted frame per call.
    struct ScriptedDetector {
        frames: std::vec::IntoIter<Vec<Detection>>,
    }

    impl DetectionSource for ScriptedDetector {
        type Error = &'static str;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Detection>, Self::Error> {
            self.frames.next().ok_or("end of stream")
        }
    }

    fn car(y: f32) -> Detection {
        Detection::new(10.0, y, 50.0, y + 40.0, 0.9, "car")
    }

    fn config() -> CounterConfig {
        CounterConfig::default().with_boundary(BoundaryConfig::new(
            "line",
            [0.0, 40.0],
            [100.0, 40.0],
        ))
    }

    #[test]
    fn test_counting_pipeline() {
        let frames = vec![
            vec![car(10.0)],
            vec![car(10.0)],
            vec![car(10.0)],
            vec![car(10.0)],
            vec![car(25.0)],
        ];
        let detector = ScriptedDetector {
            frames: frames.into_iter(),
        };
        let mut pipeline = CountingPipeline::new(detector, config()).unwrap();
        let counts = pipeline.counts();

        for _ in 0..4 {
            let report = pipeline.process_frame(&[], 640, 480).unwrap();
            assert!(report.crossings.is_empty());
        }
        let report = pipeline.process_frame(&[], 640, 480).unwrap();
        assert_eq!(report.crossings.len(), 1);
        assert_eq!(counts.get("car"), 1);

        assert!(matches!(
            pipeline.process_frame(&[], 640, 480),
            Err(PipelineError::Detection("end of stream"))
        ));
    }

    #[test]
    fn test_process_detections() {
        let detector = ScriptedDetector {
            frames: Vec::new().into_iter(),
        };
        let mut pipeline = CountingPipeline::new(detector, config()).unwrap();
        let rows = vec![([10.0, 10.0, 50.0, 50.0], 0.9, "car".to_string())];
        let report = pipeline.process_detections(rows).unwrap();
        assert_eq!(report.frame_id, 1);
        assert_eq!(pipeline.counter().tracks().tracks().len(), 1);
    }
}
