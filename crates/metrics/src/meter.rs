use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::clock::Clock;

/// Rates are folded into the moving averages once per tick.
const TICK: Duration = Duration::from_secs(5);
const TICK_SECS: f64 = 5.0;

/// Measures the rate at which events occur.
///
/// Keeps a total count, a mean rate since creation, and exponentially
/// weighted moving averages over one, five and fifteen minute windows.
/// All rates are per second.
pub struct Meter {
    clock: Arc<dyn Clock>,
    start: Instant,
    inner: Mutex<Inner>,
}

struct Inner {
    count: u64,
    uncounted: u64,
    last_tick: Instant,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    fn over_minutes(minutes: f64) -> Self {
        Ewma {
            alpha: 1.0 - (-TICK_SECS / (minutes * 60.0)).exp(),
            rate: 0.0,
            initialized: false,
        }
    }

    fn tick(&mut self, instant_rate: f64) {
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            // The first tick seeds the average with the observed rate, so a
            // fresh meter does not ramp up from zero.
            self.rate = instant_rate;
            self.initialized = true;
        }
    }
}

impl Meter {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();

        Meter {
            clock,
            start,
            inner: Mutex::new(Inner {
                count: 0,
                uncounted: 0,
                last_tick: start,
                m1: Ewma::over_minutes(1.0),
                m5: Ewma::over_minutes(5.0),
                m15: Ewma::over_minutes(15.0),
            }),
        }
    }

    /// Marks the occurrence of one event.
    pub fn mark(&self) {
        self.mark_n(1);
    }

    /// Marks the occurrence of `n` events.
    pub fn mark_n(&self, n: u64) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        inner.tick_to(now);
        inner.count += n;
        inner.uncounted += n;
    }

    /// Total number of events marked.
    pub fn count(&self) -> u64 {
        self.inner.lock().count
    }

    /// Mean rate since the meter was created.
    pub fn mean_rate(&self) -> f64 {
        let elapsed = self.clock.now().duration_since(self.start).as_secs_f64();

        if elapsed == 0.0 {
            return 0.0;
        }

        self.count() as f64 / elapsed
    }

    /// One-minute exponentially weighted moving average rate.
    pub fn one_minute_rate(&self) -> f64 {
        self.rate(|inner| inner.m1.rate)
    }

    /// Five-minute exponentially weighted moving average rate.
    pub fn five_minute_rate(&self) -> f64 {
        self.rate(|inner| inner.m5.rate)
    }

    /// Fifteen-minute exponentially weighted moving average rate.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.rate(|inner| inner.m15.rate)
    }

    /// Unit the rates are expressed in.
    pub fn rate_unit(&self) -> &'static str {
        "seconds"
    }

    fn rate(&self, pick: impl Fn(&Inner) -> f64) -> f64 {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        inner.tick_to(now);
        pick(&inner)
    }
}

impl Inner {
    /// Folds elapsed whole ticks into the moving averages. Ticks with no
    /// events still decay the rates.
    fn tick_to(&mut self, now: Instant) {
        while now.duration_since(self.last_tick) >= TICK {
            let instant_rate = self.uncounted as f64 / TICK_SECS;
            self.uncounted = 0;

            self.m1.tick(instant_rate);
            self.m5.tick(instant_rate);
            self.m15.tick(instant_rate);

            self.last_tick += TICK;
        }
    }
}
