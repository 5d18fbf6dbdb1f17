use std::{sync::Arc, time::Duration};

use hdrhistogram::Histogram as HdrHistogram;
use parking_lot::Mutex;

use crate::{clock::Clock, meter::Meter};

/// Recorded durations span one microsecond to one minute at three
/// significant figures.
const LOWEST_MICROS: u64 = 1;
const HIGHEST_MICROS: u64 = 60_000_000;
const SIGNIFICANT_FIGURES: u8 = 3;

const MICROS_PER_MILLI: f64 = 1_000.0;

/// Measures the duration distribution and throughput of an event.
///
/// Durations are recorded with microsecond resolution and reported in
/// milliseconds; the embedded [`Meter`] supplies the rates.
pub struct Timer {
    durations: Mutex<HdrHistogram<u64>>,
    meter: Meter,
}

/// Point-in-time quantiles of a timer's duration distribution, in
/// milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// 50th percentile.
    pub median: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 98th percentile.
    pub p98: f64,
    /// 99th percentile.
    pub p99: f64,
    /// 99.9th percentile.
    pub p999: f64,
}

impl Timer {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        let durations = HdrHistogram::new_with_bounds(LOWEST_MICROS, HIGHEST_MICROS, SIGNIFICANT_FIGURES)
            .expect("histogram bounds are valid");

        Timer {
            durations: Mutex::new(durations),
            meter: Meter::new(clock),
        }
    }

    /// Records one timed event. Durations outside the histogram range are
    /// clamped to it.
    pub fn record(&self, duration: Duration) {
        let micros = duration
            .as_micros()
            .clamp(u128::from(LOWEST_MICROS), u128::from(HIGHEST_MICROS)) as u64;

        self.durations.lock().saturating_record(micros);
        self.meter.mark();
    }

    /// Number of events recorded.
    pub fn count(&self) -> u64 {
        self.meter.count()
    }

    /// Unit the duration statistics are expressed in.
    pub fn duration_unit(&self) -> &'static str {
        "milliseconds"
    }

    /// Unit the rates are expressed in.
    pub fn rate_unit(&self) -> &'static str {
        self.meter.rate_unit()
    }

    /// Shortest recorded duration in milliseconds, zero when empty.
    pub fn min(&self) -> f64 {
        self.durations.lock().min() as f64 / MICROS_PER_MILLI
    }

    /// Longest recorded duration in milliseconds, zero when empty.
    pub fn max(&self) -> f64 {
        self.durations.lock().max() as f64 / MICROS_PER_MILLI
    }

    /// Mean duration in milliseconds.
    pub fn mean(&self) -> f64 {
        self.durations.lock().mean() / MICROS_PER_MILLI
    }

    /// Standard deviation of the durations in milliseconds.
    pub fn std_dev(&self) -> f64 {
        self.durations.lock().stdev() / MICROS_PER_MILLI
    }

    /// Current quantiles of the duration distribution.
    pub fn snapshot(&self) -> Snapshot {
        let durations = self.durations.lock();
        let quantile = |q: f64| durations.value_at_quantile(q) as f64 / MICROS_PER_MILLI;

        Snapshot {
            median: quantile(0.5),
            p75: quantile(0.75),
            p95: quantile(0.95),
            p98: quantile(0.98),
            p99: quantile(0.99),
            p999: quantile(0.999),
        }
    }

    /// Mean throughput since the timer was created, per second.
    pub fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }

    /// One-minute moving average throughput, per second.
    pub fn one_minute_rate(&self) -> f64 {
        self.meter.one_minute_rate()
    }

    /// Five-minute moving average throughput, per second.
    pub fn five_minute_rate(&self) -> f64 {
        self.meter.five_minute_rate()
    }

    /// Fifteen-minute moving average throughput, per second.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.meter.fifteen_minute_rate()
    }
}
