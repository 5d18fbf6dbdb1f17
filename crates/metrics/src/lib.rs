//! Live metrics for the apitrack server.
//!
//! A [`MetricRegistry`] hands out shared handles to named metrics; the
//! [`report`] module renders the timer metrics as a sortable HTML table.

#![deny(missing_docs)]

mod clock;
mod meter;
mod registry;
pub mod report;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use meter::Meter;
pub use registry::{Counter, Gauge, Histogram, Metric, MetricName, MetricRegistry};
pub use timer::{Snapshot, Timer};
