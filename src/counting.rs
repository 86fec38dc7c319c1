//! Boundary crossing detection, count aggregation and zone occupancy.

mod aggregator;
mod boundary;
mod crossing;
mod line_counter;
mod zone;

pub use aggregator::{CountAggregator, CountSnapshot, CountsHandle};
pub use boundary::{Boundary, CrossingDirection};
pub use crossing::{CrossingDetector, CrossingEvent, CrossingSubscriber, FnSubscriber};
pub use line_counter::{FrameReport, LineCounter};
pub use zone::{Zone, ZoneOccupancy};
