use std::fmt::Write;

use log::{Level, Record};
use logforth::{
    append::Stdout,
    layout::{JsonLayout, Layout},
};

use crate::args::{Args, LogStyle};

/// Text layout: UTC timestamp, right-aligned level, message.
#[derive(Debug, Clone, Copy)]
struct TextLayout {
    colored: bool,
}

impl Layout for TextLayout {
    fn format(
        &self,
        record: &Record<'_>,
        _diagnostics: &[Box<dyn logforth::diagnostic::Diagnostic>],
    ) -> anyhow::Result<Vec<u8>> {
        let mut line = String::new();
        let now = jiff::Timestamp::now();

        write!(line, "{} ", now.strftime("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        if self.colored {
            let code = color_code(record.level());
            write!(line, "\x1b[{code}m{:>5}\x1b[0m  ", record.level())?;
        } else {
            write!(line, "{:>5}  ", record.level())?;
        }

        write!(line, "{}", record.args())?;

        Ok(line.into_bytes())
    }
}

fn color_code(level: Level) -> u8 {
    match level {
        Level::Error => 31,
        Level::Warn => 33,
        Level::Info => 32,
        Level::Debug => 34,
        Level::Trace => 35,
    }
}

pub(super) fn init(args: &Args) {
    logforth::builder()
        .dispatch(|dispatch| {
            let dispatch = dispatch.filter(args.log_level.env_filter());

            match args.log_style {
                LogStyle::Color => dispatch.append(Stdout::default().with_layout(TextLayout { colored: true })),
                LogStyle::Text => dispatch.append(Stdout::default().with_layout(TextLayout { colored: false })),
                LogStyle::Json => dispatch.append(Stdout::default().with_layout(JsonLayout::default())),
            }
        })
        .apply();
}
