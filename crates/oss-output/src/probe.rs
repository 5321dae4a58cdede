//! Default device discovery.
//!
//! When no device path is configured, a short ordered table of conventional OSS nodes is
//! checked. Each candidate gets a specific diagnosis so a failed startup can say why every
//! path was rejected.

use std::fmt;
use std::io;
use std::path::Path;

use crate::error::{OutputError, Result};
use crate::sink::{SinkDriver, close_retrying};

/// Conventional OSS DSP nodes, in the order they are tried.
pub const DEFAULT_DEVICES: &[&str] = &["/dev/dsp", "/dev/sound/dsp"];

/// Why a candidate path can or cannot be used.
#[derive(Debug)]
pub enum DeviceStatus {
    Usable,
    NotCharDevice,
    PermissionDenied,
    Missing,
    Other(io::Error),
}

impl DeviceStatus {
    pub fn is_usable(&self) -> bool {
        matches!(self, DeviceStatus::Usable)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Usable => f.write_str("usable"),
            DeviceStatus::NotCharDevice => f.write_str("not a character device"),
            DeviceStatus::PermissionDenied => f.write_str("permission denied"),
            DeviceStatus::Missing => f.write_str("not found"),
            DeviceStatus::Other(err) => write!(f, "error accessing device: {err}"),
        }
    }
}

/// Diagnosis for one candidate path.
#[derive(Debug)]
pub struct DeviceReport {
    pub path: String,
    pub status: DeviceStatus,
}

/// Classify `path` without opening it.
pub fn stat_device(path: &Path) -> DeviceStatus {
    match std::fs::metadata(path) {
        Ok(meta) if is_char_device(&meta) => DeviceStatus::Usable,
        Ok(_) => DeviceStatus::NotCharDevice,
        Err(err) => status_for_error(err),
    }
}

/// Classify a failed `stat` of a candidate path.
fn status_for_error(err: io::Error) -> DeviceStatus {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => DeviceStatus::Missing,
        io::ErrorKind::PermissionDenied => DeviceStatus::PermissionDenied,
        _ => DeviceStatus::Other(err),
    }
}

#[cfg(unix)]
fn is_char_device(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    meta.file_type().is_char_device()
}

#[cfg(not(unix))]
fn is_char_device(_meta: &std::fs::Metadata) -> bool {
    false
}

/// Diagnose every candidate.
pub fn survey(candidates: &[&str]) -> Vec<DeviceReport> {
    candidates
        .iter()
        .map(|path| DeviceReport {
            path: path.to_string(),
            status: stat_device(Path::new(path)),
        })
        .collect()
}

/// Return the first usable candidate.
///
/// When none is usable, every candidate's diagnosis is logged and returned in the error.
pub fn find_default_device<'a>(candidates: &[&'a str]) -> Result<&'a str> {
    let mut reports = Vec::with_capacity(candidates.len());
    for &path in candidates {
        let status = stat_device(Path::new(path));
        if status.is_usable() {
            tracing::debug!(device = path, "using default OSS device");
            return Ok(path);
        }
        reports.push(DeviceReport {
            path: path.to_string(),
            status,
        });
    }

    tracing::warn!("error trying to open default OSS device");
    for report in &reports {
        tracing::warn!(device = %report.path, reason = %report.status, "default OSS device unusable");
    }
    Err(OutputError::NoUsableDevice { reports })
}

/// Whether any candidate can actually be opened for writing.
pub fn test_default_device<D: SinkDriver>(driver: &D, candidates: &[&str]) -> bool {
    for &path in candidates {
        match driver.open(path) {
            Ok(mut sink) => {
                if let Err(err) = close_retrying(&mut sink) {
                    tracing::debug!(device = path, error = %err, "error closing probe handle");
                }
                return true;
            }
            Err(err) => {
                tracing::warn!(device = path, error = %err, "error opening OSS device");
            }
        }
    }
    false
}
