//! Layered error definitions
//!
//! Categorized by source: destination specs / config / sink

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Unified error type for destination and configuration handling
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Destination Errors =====
    /// Destination specifier parse error
    #[error("invalid dest: dest=[{spec}]: {message}")]
    DestParse { spec: String, message: String },

    /// Destination validation error
    #[error("invalid dest: dest=[{spec}]: {field}: {message}")]
    DestValidation {
        spec: String,
        field: String,
        message: String,
    },

    /// Destination open error
    #[error("failed to open dest [{spec}]: {source}")]
    DestOpen {
        spec: String,
        #[source]
        source: io::Error,
    },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl ContractError {
    /// Create destination parse error
    pub fn dest_parse(spec: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DestParse {
            spec: spec.into(),
            message: message.into(),
        }
    }

    /// Create destination validation error
    pub fn dest_validation(
        spec: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DestValidation {
            spec: spec.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create destination open error
    pub fn dest_open(spec: impl Into<String>, source: io::Error) -> Self {
        Self::DestOpen {
            spec: spec.into(),
            source,
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// OS error code behind this error, if any
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::DestOpen { source, .. } | Self::Io(source) => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Terminal error of a single sink
///
/// Cloneable so the stored error can be handed out to every later caller.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// The underlying sink reported a hard write failure
    #[error("sink '{sink}' write failed: {source}")]
    Write {
        sink: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// The sink was stopped by an external cancellation
    #[error("sink '{sink}' cancelled")]
    Cancelled { sink: String },

    /// The sink worker is gone without recording an error
    #[error("sink '{sink}' worker exited unexpectedly")]
    WorkerGone { sink: String },
}

impl SinkError {
    /// Create write error
    pub fn write(sink: impl Into<String>, source: io::Error) -> Self {
        Self::Write {
            sink: sink.into(),
            source: Arc::new(source),
        }
    }

    /// Create cancellation error
    pub fn cancelled(sink: impl Into<String>) -> Self {
        Self::Cancelled { sink: sink.into() }
    }

    /// Name of the sink that failed
    pub fn sink_name(&self) -> &str {
        match self {
            Self::Write { sink, .. } | Self::Cancelled { sink } | Self::WorkerGone { sink } => {
                sink
            }
        }
    }

    /// OS error code behind this error, if any
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Write { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// Whether the error came from a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
