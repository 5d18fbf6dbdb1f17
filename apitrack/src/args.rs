use std::{fmt, io::IsTerminal, net::SocketAddr, path::PathBuf, str::FromStr};

use clap::{Parser, ValueEnum};
use config::Config;
use logforth::filter::EnvFilter;

/// Command line arguments for the apitrack server.
#[derive(Debug, Parser)]
#[command(name = "apitrack", version, about = "API call tracking and metrics reporting for REST services")]
pub(crate) struct Args {
    /// Address the server listens on, overriding the configuration file
    #[arg(short, long, env = "APITRACK_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,
    /// Path to the TOML configuration file
    #[arg(short, long, env = "APITRACK_CONFIG_PATH", default_value = "./apitrack.toml")]
    pub config: PathBuf,
    /// Log level for the workspace crates; everything else logs at warn
    #[arg(long = "log", env = "APITRACK_LOG", default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
    /// Style of the log output
    #[arg(long, env = "APITRACK_LOG_STYLE", default_value_t = LogStyle::default())]
    pub log_style: LogStyle,
}

impl Args {
    /// The loaded configuration, or defaults when the file does not exist.
    pub fn config(&self) -> anyhow::Result<Config> {
        if self.config.exists() {
            Config::load(&self.config)
        } else {
            Ok(Config::default())
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub(crate) enum LogStyle {
    /// Colorized text
    Color,
    /// Plain text
    Text,
    /// One JSON object per line
    Json,
}

impl Default for LogStyle {
    fn default() -> Self {
        if std::io::stdout().is_terminal() {
            LogStyle::Color
        } else {
            LogStyle::Text
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self {
            LogStyle::Color => "color",
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        };

        f.write_str(style)
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub(crate) enum LogLevel {
    /// Disable logging
    Off,
    /// Only log errors
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings and info messages
    Info,
    /// Everything above plus debug messages
    Debug,
    /// Everything, including trace messages
    Trace,
}

impl LogLevel {
    pub fn env_filter(self) -> EnvFilter {
        let directives = match self {
            LogLevel::Off => "off".to_string(),
            level => format!(
                "warn,apitrack={level},config={level},metrics={level},server={level},tracking={level}"
            ),
        };

        EnvFilter::from_str(&directives).expect("the directives are valid")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        f.write_str(level)
    }
}
