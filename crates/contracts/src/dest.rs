//! DestSpec - destination description
//!
//! Fully self-contained description of a data sink, produced by the
//! specifier parser or a config file and consumed by the opener.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default permission bits for created files and fifos
pub const DEFAULT_PERM: u32 = 0o644;

/// Broad category of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestType {
    /// Already-open file descriptor
    Fd,
    /// Regular file
    File,
    /// Named pipe
    Fifo,
    /// Child process stdin
    Proc,
}

impl DestType {
    /// All destination types, in specifier order
    pub const ALL: [DestType; 4] = [Self::Fd, Self::File, Self::Fifo, Self::Proc];

    /// Specifier name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fd => "fd",
            Self::File => "file",
            Self::Fifo => "fifo",
            Self::Proc => "proc",
        }
    }
}

impl fmt::Display for DestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unrecognized type: {s}"))
    }
}

/// Destination description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestSpec {
    /// Destination category
    #[serde(rename = "type")]
    pub dest_type: DestType,

    /// fd number, path, or program depending on the type
    pub id: String,

    /// Permission bits for created files/fifos
    #[serde(default = "default_perm")]
    pub perm: u32,

    /// Program arguments (proc only)
    #[serde(default)]
    pub args: Vec<String>,

    /// Put the descriptor in non-blocking mode
    #[serde(default)]
    pub nonblocking: bool,

    /// Pipe capacity in bytes (0 = leave unchanged)
    #[serde(default)]
    pub bufsize: usize,

    /// Append instead of truncating (file only)
    #[serde(default)]
    pub append: bool,

    /// Create the file or fifo if missing
    #[serde(default)]
    pub create: bool,
}

fn default_perm() -> u32 {
    DEFAULT_PERM
}

impl DestSpec {
    /// Create a spec with default options
    pub fn new(dest_type: DestType, id: impl Into<String>) -> Self {
        Self {
            dest_type,
            id: id.into(),
            perm: DEFAULT_PERM,
            args: Vec::new(),
            nonblocking: false,
            bufsize: 0,
            append: false,
            create: false,
        }
    }
}

/// Renders the spec back into specifier syntax, omitting defaults
impl fmt::Display for DestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type={},id={}", self.dest_type, self.id)?;
        if self.perm != DEFAULT_PERM {
            write!(f, ",perm=0{:o}", self.perm)?;
        }
        if !self.args.is_empty() {
            write!(f, ",args={}", self.args.join(" "))?;
        }
        if self.bufsize != 0 {
            write!(f, ",bufsize={}", self.bufsize)?;
        }
        if self.nonblocking {
            f.write_str(",nonblocking")?;
        }
        if self.create {
            f.write_str(",create")?;
        }
        if self.append {
            f.write_str(",append")?;
        }
        Ok(())
    }
}
