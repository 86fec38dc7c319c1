//! Integration module for connecting object detection backends with the counter.
//!
//! This module provides traits and utilities for feeding the output of any
//! inference backend into a [`LineCounter`](crate::LineCounter).

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::CountingPipeline;
