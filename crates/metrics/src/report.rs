//! HTML report of the registry's timer metrics.
//!
//! Renders one sortable table row per timer, with durations in whole
//! milliseconds and rates in whole events per second. Only timers appear
//! in the report; other metric kinds are skipped.

use std::fmt::{self, Write};

use crate::{
    registry::{Metric, MetricName, MetricRegistry},
    timer::Timer,
};

/// Group fed by the request timing middleware itself. Never rendered, so
/// the report does not measure its own requests into visible rows.
pub const EXCLUDED_GROUP: &str = "apitrack.http.filter";

const COLUMNS: [&str; 19] = [
    "group",
    "api",
    "duration unit",
    "min",
    "max",
    "mean",
    "std_dev",
    "median",
    "p75",
    "p95",
    "p98",
    "p99",
    "p999",
    "rate unit",
    "count",
    "mean",
    "m1",
    "m5",
    "m15",
];

/// Renders the registry's timers as an HTML table.
///
/// When `prefix` is given, only groups whose name starts with it are
/// included. A row that fails to write is logged and skipped; header and
/// footer failures propagate.
pub fn render<W: Write>(
    registry: &MetricRegistry,
    prefix: Option<&str>,
    out: &mut W,
) -> fmt::Result {
    write_header(out)?;

    for (group, metrics) in registry.grouped_metrics() {
        if !include(&group, prefix) {
            continue;
        }

        for (name, metric) in metrics {
            let Metric::Timer(timer) = metric else {
                continue;
            };

            if let Err(error) = out.write_str(&timer_row(&group, &name, &timer)) {
                log::warn!("Error writing out {name}: {error}");
            }
        }
    }

    write_footer(out)
}

fn include(group: &str, prefix: Option<&str>) -> bool {
    group != EXCLUDED_GROUP && prefix.is_none_or(|prefix| group.starts_with(prefix))
}

fn timer_row(group: &str, name: &MetricName, timer: &Timer) -> String {
    let snapshot = timer.snapshot();
    let mut row = String::from("<tr>");

    text_cell(&mut row, group);
    text_cell(&mut row, &format!("{} {}", name.scope, name.name));

    text_cell(&mut row, timer.duration_unit());
    number_cell(&mut row, timer.min());
    number_cell(&mut row, timer.max());
    number_cell(&mut row, timer.mean());
    number_cell(&mut row, timer.std_dev());
    number_cell(&mut row, snapshot.median);
    number_cell(&mut row, snapshot.p75);
    number_cell(&mut row, snapshot.p95);
    number_cell(&mut row, snapshot.p98);
    number_cell(&mut row, snapshot.p99);
    number_cell(&mut row, snapshot.p999);

    text_cell(&mut row, timer.rate_unit());
    text_cell(&mut row, &timer.count().to_string());
    number_cell(&mut row, timer.mean_rate());
    number_cell(&mut row, timer.one_minute_rate());
    number_cell(&mut row, timer.five_minute_rate());
    number_cell(&mut row, timer.fifteen_minute_rate());

    row.push_str("</tr>\n");
    row
}

fn text_cell(row: &mut String, value: &str) {
    row.push_str("<td>");
    row.push_str(value);
    row.push_str("</td>");
}

fn number_cell(row: &mut String, value: f64) {
    let _ = write!(row, "<td>{value:.0}</td>");
}

fn write_header<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str("<html>\n<head>\n")?;
    out.write_str(
        "<link rel=\"stylesheet\" href=\"../assets/themes/blue/style.css\" type=\"text/css\" media=\"print, projection, screen\" />\n",
    )?;
    out.write_str("<script src=\"https://code.jquery.com/jquery-1.9.1.min.js\"></script>\n")?;
    out.write_str(
        "<script type=\"text/javascript\" src=\"../assets/jquery.tablesorter.min.js\"></script>\n",
    )?;
    out.write_str("</head>\n<body>\n")?;
    out.write_str("<table id=\"metrics\" class=\"tablesorter\">\n")?;
    out.write_str("<thead>\n<tr>")?;

    for column in COLUMNS {
        write!(out, "<th>{column}</th>")?;
    }

    out.write_str("</tr>\n</thead>\n<tbody>\n")
}

fn write_footer<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str("</tbody>\n</table>\n<script>\n")?;
    out.write_str(
        "$(document).ready(function() { $('#metrics').tablesorter({widgets: ['zebra'], sortList: [[4,1]]}); });\n",
    )?;
    out.write_str("</script>\n</body>\n</html>")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;

    fn registry_with_timers(names: &[(&str, &str, &str)]) -> MetricRegistry {
        let registry = MetricRegistry::with_clock(ManualClock::new());

        for (group, scope, name) in names {
            registry
                .timer(MetricName::new(*group, *scope, *name))
                .record(Duration::from_millis(10));
        }

        registry
    }

    #[test]
    fn header_lists_every_column() {
        let registry = MetricRegistry::new();
        let mut out = String::new();

        render(&registry, None, &mut out).unwrap();

        assert_eq!(COLUMNS.len(), out.matches("<th>").count());
        assert!(out.starts_with("<html>\n<head>\n"));
        assert!(out.ends_with("</body>\n</html>"));
        assert!(out.contains("<table id=\"metrics\" class=\"tablesorter\">"));
    }

    #[test]
    fn durations_round_to_the_nearest_millisecond() {
        let registry = MetricRegistry::with_clock(ManualClock::new());
        registry
            .timer(MetricName::new("demo", "clock", "date"))
            .record(Duration::from_micros(12_600));

        let mut out = String::new();
        render(&registry, None, &mut out).unwrap();

        assert!(out.contains("<td>demo</td><td>clock date</td><td>milliseconds</td><td>13</td>"));
    }

    #[test]
    fn only_timers_produce_rows() {
        let registry = MetricRegistry::with_clock(ManualClock::new());
        registry.counter(MetricName::new("demo", "queue", "dropped")).inc();
        registry.timer(MetricName::new("demo", "clock", "date"));

        let mut out = String::new();
        render(&registry, None, &mut out).unwrap();

        assert_eq!(1, out.matches("<tr><td>").count());
        assert!(!out.contains("queue dropped"));
    }

    #[test]
    fn prefix_filters_whole_groups() {
        let registry = registry_with_timers(&[("a.b", "s", "n"), ("a.c", "s", "n"), ("x.y", "s", "n")]);

        let mut all = String::new();
        render(&registry, None, &mut all).unwrap();
        assert!(all.contains("<td>a.b</td>"));
        assert!(all.contains("<td>a.c</td>"));
        assert!(all.contains("<td>x.y</td>"));

        let mut filtered = String::new();
        render(&registry, Some("a."), &mut filtered).unwrap();
        assert!(filtered.contains("<td>a.b</td>"));
        assert!(filtered.contains("<td>a.c</td>"));
        assert!(!filtered.contains("<td>x.y</td>"));

        let mut none = String::new();
        render(&registry, Some("zzz"), &mut none).unwrap();
        assert!(!none.contains("<tr><td>"));
    }

    #[test]
    fn the_filter_group_is_never_rendered() {
        let registry = registry_with_timers(&[(EXCLUDED_GROUP, "http", "requests"), ("apitrack.resources", "clock", "date")]);

        let mut all = String::new();
        render(&registry, None, &mut all).unwrap();
        assert!(!all.contains(EXCLUDED_GROUP));
        assert!(all.contains("apitrack.resources"));

        let mut filtered = String::new();
        render(&registry, Some("apitrack"), &mut filtered).unwrap();
        assert!(!filtered.contains(EXCLUDED_GROUP));
    }

    #[test]
    fn output_is_stable_while_the_clock_is_frozen() {
        let registry = registry_with_timers(&[("demo", "clock", "date")]);

        let mut first = String::new();
        render(&registry, None, &mut first).unwrap();

        let mut second = String::new();
        render(&registry, None, &mut second).unwrap();

        assert_eq!(first, second);
    }

    /// Sink that refuses any chunk containing a marker, standing in for a
    /// client that went away mid-response.
    struct PoisonedSink {
        written: String,
        poison: &'static str,
    }

    impl Write for PoisonedSink {
        fn write_str(&mut self, chunk: &str) -> fmt::Result {
            if chunk.contains(self.poison) {
                return Err(fmt::Error);
            }

            self.written.push_str(chunk);
            Ok(())
        }
    }

    #[test]
    fn a_row_that_fails_to_write_is_skipped() {
        let registry = registry_with_timers(&[("a.b", "s", "n"), ("a.c", "s", "n"), ("x.y", "s", "n")]);

        let mut sink = PoisonedSink {
            written: String::new(),
            poison: "<td>a.c</td>",
        };

        render(&registry, None, &mut sink).unwrap();

        assert!(sink.written.contains("<td>a.b</td>"));
        assert!(sink.written.contains("<td>x.y</td>"));
        assert!(!sink.written.contains("<td>a.c</td>"));
        assert!(sink.written.ends_with("</body>\n</html>"));
    }
}
