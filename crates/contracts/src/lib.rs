//! # Contracts
//!
//! Shared interface contracts between the rex crates.
//! Business crates only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data model
//! - A chunk is an immutable `bytes::Bytes` shared by every sink
//! - A sink is anything implementing [`ByteSink`]
//! - A destination is described by a [`DestSpec`] before it is opened

mod config;
mod dest;
mod error;
mod sink;

pub use config::*;
pub use dest::*;
pub use error::*;
pub use sink::*;

/// Immutable chunk of bytes dispatched to every sink
pub type Chunk = bytes::Bytes;
