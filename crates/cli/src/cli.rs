//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// rex - copy standard input to any number of destinations
#[derive(Parser, Debug)]
#[command(
    name = "rex",
    author,
    version,
    about = "Copy standard input to files, fifos, descriptors and processes",
    long_about = "Reads standard input in chunks and writes every chunk to each destination.\n\n\
                  A destination is a comma-separated specifier:\n\n  \
                  type=fd,id=1\n  \
                  type=file,id=out.log,create,append,perm=0600\n  \
                  type=fifo,id=/tmp/live,create,nonblocking,bufsize=65536\n  \
                  type=proc,id=gzip,args=-c\n\n\
                  Writes to nonblocking descriptors are best-effort: bytes that do not \n\
                  fit are dropped instead of stalling the other destinations."
)]
pub struct Cli {
    /// Destination specifiers, appended after those from the config file
    #[arg(value_name = "DEST")]
    pub destinations: Vec<String>,

    /// Read buffer size in bytes; the upper bound on a chunk [default: 65536]
    #[arg(short, long, env = "REX_BUFFER_SIZE")]
    pub buffer_size: Option<usize>,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "REX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Validate destinations, print the plan and exit without reading input
    #[arg(long)]
    pub check: bool,

    /// Print the `--check` plan as JSON
    #[arg(long, requires = "check")]
    pub json: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "REX_VERBOSE")]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs always go to stderr)
    #[arg(long, value_enum, default_value = "pretty", env = "REX_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "REX_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
