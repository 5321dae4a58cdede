//! The device handle seam.
//!
//! [`PcmSink`] is an open handle that can be probed, written and reset; [`SinkDriver`] opens
//! handles by path so a session can drop and reacquire its device between buffers.

use std::io;

use crate::param_cache::Axis;

/// An open PCM output handle.
pub trait PcmSink {
    /// Ask the device to use `value` for `axis`.
    ///
    /// Returns the value the device settled on, which may differ from the request when the
    /// driver rounds it.
    fn set_param(&mut self, axis: Axis, value: u32) -> io::Result<u32>;

    /// Write as much of `buf` as the device accepts, returning the byte count.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Discard audio the device has buffered but not yet played.
    fn reset(&mut self) -> io::Result<()>;

    /// Release the handle. May report `Interrupted`, in which case the caller retries.
    fn close(&mut self) -> io::Result<()>;
}

/// Opens [`PcmSink`] handles by device path.
pub trait SinkDriver {
    type Sink: PcmSink;

    fn open(&self, path: &str) -> io::Result<Self::Sink>;
}

/// Close `sink`, retrying while the close is interrupted.
pub fn close_retrying<S: PcmSink + ?Sized>(sink: &mut S) -> io::Result<()> {
    loop {
        match sink.close() {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
