//! Error types for CLI operations.

use std::io;

use contracts::{ContractError, SinkError};
use fanout::FanOutError;
use thiserror::Error;

/// Exit status for a run stopped by SIGINT/SIGTERM
pub const EXIT_INTERRUPTED: u8 = 130;

/// Exit status when no OS error code is available
pub const EXIT_FAILURE: u8 = 1;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Neither the command line nor the config file named a destination
    #[error("at least one output required")]
    NoDestinations,

    /// Reading standard input failed
    #[error("failed to read input: {source}")]
    Input {
        #[source]
        source: io::Error,
    },

    /// A destination failed while the chunk was being written
    #[error(transparent)]
    Output(#[from] SinkError),

    /// Stopped by a signal
    #[error("interrupted")]
    Interrupted,
}

impl CliError {
    pub fn input(source: io::Error) -> Self {
        Self::Input { source }
    }
}

/// Map a failed run to a process exit status
///
/// Walks the error chain for the first cause that carries an OS error code
/// and uses that code; falls back to [`EXIT_FAILURE`].
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        let code = if let Some(e) = cause.downcast_ref::<CliError>() {
            match e {
                CliError::Interrupted => return EXIT_INTERRUPTED,
                CliError::Input { source } => source.raw_os_error(),
                CliError::Output(e) => e.raw_os_error(),
                CliError::NoDestinations => None,
            }
        } else if let Some(e) = cause.downcast_ref::<SinkError>() {
            e.raw_os_error()
        } else if let Some(e) = cause.downcast_ref::<FanOutError>() {
            e.raw_os_error()
        } else if let Some(e) = cause.downcast_ref::<ContractError>() {
            e.raw_os_error()
        } else if let Some(e) = cause.downcast_ref::<io::Error>() {
            e.raw_os_error()
        } else {
            None
        };

        if let Some(code) = code.and_then(|c| u8::try_from(c).ok()).filter(|&c| c != 0) {
            return code;
        }
    }
    EXIT_FAILURE
}
