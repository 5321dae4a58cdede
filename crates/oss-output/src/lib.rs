//! OSS PCM output with per-device capability negotiation.
//!
//! The device's supported rate, channel count and bit depth are discovered by trial:
//! each probe outcome is memoized in a [`param_cache::ParamCache`] so that reopen cycles
//! skip values already known to fail. Buffers are delivered with a partial-write loop, and a
//! byte-rate [`timer::Timer`] paces sinks that accept data faster than real time.

pub mod config;
pub mod error;
pub mod format;
pub mod mixer;
pub mod negotiate;
pub mod output;
pub mod param_cache;
pub mod probe;
pub mod session;
pub mod sink;
pub mod timer;
pub mod writer;

#[cfg(unix)]
pub mod oss;

#[cfg(test)]
mod testing;

pub use error::{OutputError, Result};
pub use format::AudioFormat;
pub use output::{AudioOutput, NullOutput, OssOutput};
