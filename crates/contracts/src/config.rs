//! RexConfig - config file contents
//!
//! Read buffer size and the ordered destination list.

use serde::{Deserialize, Serialize};

use crate::DestSpec;

/// Default stdin read buffer size (64 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RexConfig {
    /// Upper bound on the size of a single chunk
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Destinations, in dispatch order
    #[serde(default)]
    pub destinations: Vec<DestSpec>,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

impl Default for RexConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            destinations: Vec::new(),
        }
    }
}
