use std::io;

use crate::param_cache::Axis;
use crate::probe::DeviceReport;

/// Failures surfaced by the output layer.
///
/// Interrupted system calls never appear here; they are retried where they happen.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("error opening OSS device \"{device}\": {source}")]
    DeviceUnavailable {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("OSS device \"{device}\" does not support {axis} = {value}")]
    Negotiation {
        device: String,
        axis: Axis,
        value: u32,
    },

    #[error("closing OSS device \"{device}\" due to write error: {source}")]
    Io {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("no usable default OSS device ({} candidates tried)", .reports.len())]
    NoUsableDevice { reports: Vec<DeviceReport> },

    #[error("invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("timer used before start")]
    TimerNotStarted,

    #[error("output is not open")]
    NotOpen,
}

pub type Result<T, E = OutputError> = std::result::Result<T, E>;
