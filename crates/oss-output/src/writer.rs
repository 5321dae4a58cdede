//! Playback writer: delivers whole PCM buffers to a session's device.

use std::io;

use crate::error::{OutputError, Result};
use crate::session::DeviceSession;
use crate::sink::{PcmSink, SinkDriver};

impl<D: SinkDriver> DeviceSession<D> {
    /// Write all of `buf` to the device.
    ///
    /// A session closed by [`drop_buffered`](Self::drop_buffered) is reopened first. Any
    /// write error other than an interruption closes the handle and is reported; the next
    /// call reopens.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        if !self.is_open() {
            tracing::debug!(device = %self.device(), "reopening OSS device");
            self.reopen()?;
        }
        let Some(sink) = self.sink_mut() else {
            return Err(OutputError::NotOpen);
        };

        if let Err(source) = deliver(sink, buf) {
            tracing::warn!(
                device = %self.device(),
                error = %source,
                "closing OSS device due to write error"
            );
            self.close();
            return Err(OutputError::Io {
                device: self.device().to_string(),
                source,
            });
        }
        Ok(())
    }
}

/// Push every byte of `buf` into `sink`, advancing past partial writes and retrying
/// interrupted ones.
pub fn deliver<S: PcmSink + ?Sized>(sink: &mut S, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match sink.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "device accepted no data",
                ));
            }
            Ok(n) => {
                buf = buf.get(n..).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("device reported {n} bytes written of {}", buf.len()),
                    )
                })?;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
