use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use hdrhistogram::Histogram as HdrHistogram;
use parking_lot::{Mutex, RwLock};

use crate::{
    clock::{Clock, SystemClock},
    meter::Meter,
    timer::Timer,
};

/// Identifies a metric.
///
/// Metrics are grouped by `group` for reporting; within a group a metric
/// is identified as "scope name".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MetricName {
    /// Reporting group, e.g. `apitrack.resources`.
    pub group: String,
    /// Scope within the group, e.g. the resource name.
    pub scope: String,
    /// The measured operation.
    pub name: String,
}

impl MetricName {
    /// Creates a metric name from its three parts.
    pub fn new(group: impl Into<String>, scope: impl Into<String>, name: impl Into<String>) -> Self {
        MetricName {
            group: group.into(),
            scope: scope.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.group, self.scope, self.name)
    }
}

/// A monotonically adjustable count.
#[derive(Debug, Default)]
pub struct Counter(AtomicI64);

impl Counter {
    /// Increments the counter by one.
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements the counter by one.
    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }

    /// Adjusts the counter by `delta`.
    pub fn add(&self, delta: i64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    /// The current count.
    pub fn count(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A single instantaneous value.
#[derive(Debug, Default)]
pub struct Gauge(Mutex<f64>);

impl Gauge {
    /// Replaces the gauge's value.
    pub fn set(&self, value: f64) {
        *self.0.lock() = value;
    }

    /// The last value set.
    pub fn value(&self) -> f64 {
        *self.0.lock()
    }
}

/// A distribution of integer values.
pub struct Histogram {
    values: Mutex<HdrHistogram<u64>>,
}

impl Histogram {
    fn new() -> Self {
        let values =
            HdrHistogram::new(3).expect("three significant figures is a valid precision");

        Histogram {
            values: Mutex::new(values),
        }
    }

    /// Records one value.
    pub fn update(&self, value: u64) {
        self.values.lock().saturating_record(value);
    }

    /// Number of values recorded.
    pub fn count(&self) -> u64 {
        self.values.lock().len()
    }

    /// The value at the given quantile.
    pub fn value_at_quantile(&self, quantile: f64) -> u64 {
        self.values.lock().value_at_quantile(quantile)
    }
}

/// A registered metric of any kind.
#[derive(Clone)]
pub enum Metric {
    /// An adjustable count.
    Counter(Arc<Counter>),
    /// An instantaneous value.
    Gauge(Arc<Gauge>),
    /// A value distribution.
    Histogram(Arc<Histogram>),
    /// An event rate.
    Meter(Arc<Meter>),
    /// A duration distribution with rates.
    Timer(Arc<Timer>),
}

/// Holds all live metrics, keyed and ordered by name.
///
/// Accessors register the metric on first use and return the existing
/// handle afterwards, so callers never need a separate registration step.
pub struct MetricRegistry {
    clock: Arc<dyn Clock>,
    metrics: RwLock<BTreeMap<MetricName, Metric>>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    /// Creates a registry backed by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a registry backed by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        MetricRegistry {
            clock,
            metrics: RwLock::new(BTreeMap::new()),
        }
    }

    /// The counter registered under `name`.
    pub fn counter(&self, name: MetricName) -> Arc<Counter> {
        if let Some(Metric::Counter(counter)) = self.metrics.read().get(&name) {
            return counter.clone();
        }

        let mut metrics = self.metrics.write();
        match metrics.get(&name) {
            Some(Metric::Counter(counter)) => counter.clone(),
            _ => {
                let counter = Arc::new(Counter::default());
                metrics.insert(name, Metric::Counter(counter.clone()));
                counter
            }
        }
    }

    /// The gauge registered under `name`.
    pub fn gauge(&self, name: MetricName) -> Arc<Gauge> {
        if let Some(Metric::Gauge(gauge)) = self.metrics.read().get(&name) {
            return gauge.clone();
        }

        let mut metrics = self.metrics.write();
        match metrics.get(&name) {
            Some(Metric::Gauge(gauge)) => gauge.clone(),
            _ => {
                let gauge = Arc::new(Gauge::default());
                metrics.insert(name, Metric::Gauge(gauge.clone()));
                gauge
            }
        }
    }

    /// The histogram registered under `name`.
    pub fn histogram(&self, name: MetricName) -> Arc<Histogram> {
        if let Some(Metric::Histogram(histogram)) = self.metrics.read().get(&name) {
            return histogram.clone();
        }

        let mut metrics = self.metrics.write();
        match metrics.get(&name) {
            Some(Metric::Histogram(histogram)) => histogram.clone(),
            _ => {
                let histogram = Arc::new(Histogram::new());
                metrics.insert(name, Metric::Histogram(histogram.clone()));
                histogram
            }
        }
    }

    /// The meter registered under `name`.
    pub fn meter(&self, name: MetricName) -> Arc<Meter> {
        if let Some(Metric::Meter(meter)) = self.metrics.read().get(&name) {
            return meter.clone();
        }

        let mut metrics = self.metrics.write();
        match metrics.get(&name) {
            Some(Metric::Meter(meter)) => meter.clone(),
            _ => {
                let meter = Arc::new(Meter::new(self.clock.clone()));
                metrics.insert(name, Metric::Meter(meter.clone()));
                meter
            }
        }
    }

    /// The timer registered under `name`.
    pub fn timer(&self, name: MetricName) -> Arc<Timer> {
        if let Some(Metric::Timer(timer)) = self.metrics.read().get(&name) {
            return timer.clone();
        }

        let mut metrics = self.metrics.write();
        match metrics.get(&name) {
            Some(Metric::Timer(timer)) => timer.clone(),
            _ => {
                let timer = Arc::new(Timer::new(self.clock.clone()));
                metrics.insert(name, Metric::Timer(timer.clone()));
                timer
            }
        }
    }

    /// A stable-ordered view of all metrics, grouped by group name.
    pub fn grouped_metrics(&self) -> BTreeMap<String, BTreeMap<MetricName, Metric>> {
        let metrics = self.metrics.read();
        let mut grouped: BTreeMap<String, BTreeMap<MetricName, Metric>> = BTreeMap::new();

        for (name, metric) in metrics.iter() {
            grouped
                .entry(name.group.clone())
                .or_default()
                .insert(name.clone(), metric.clone());
        }

        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_the_same_handle() {
        let registry = MetricRegistry::new();

        let first = registry.counter(MetricName::new("group", "scope", "name"));
        let second = registry.counter(MetricName::new("group", "scope", "name"));

        first.inc();
        assert_eq!(1, second.count());
    }

    #[test]
    fn names_order_by_group_then_scope_then_name() {
        let registry = MetricRegistry::new();

        registry.timer(MetricName::new("b", "x", "y"));
        registry.timer(MetricName::new("a", "z", "a"));
        registry.timer(MetricName::new("a", "x", "y"));

        let grouped = registry.grouped_metrics();
        let groups: Vec<&String> = grouped.keys().collect();
        assert_eq!(vec!["a", "b"], groups);

        let names: Vec<String> = grouped["a"].keys().map(|name| name.to_string()).collect();
        assert_eq!(vec!["a.x.y", "a.z.a"], names);
    }

    #[test]
    fn registering_a_different_kind_replaces_the_entry() {
        let registry = MetricRegistry::new();
        let name = MetricName::new("group", "scope", "name");

        let counter = registry.counter(name.clone());
        counter.inc();

        registry.timer(name.clone());

        // The counter handle stays valid but the registry now holds a timer.
        assert_eq!(1, counter.count());
        let grouped = registry.grouped_metrics();
        assert!(matches!(grouped["group"][&name], Metric::Timer(_)));
    }

    #[test]
    fn display_joins_the_parts_with_dots() {
        let name = MetricName::new("apitrack.resources", "clock", "date");
        assert_eq!("apitrack.resources.clock.date", name.to_string());
    }
}
