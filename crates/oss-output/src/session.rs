//! Device session lifecycle.
//!
//! A [`DeviceSession`] owns at most one open handle plus the negotiation history for its
//! device path. The session outlives its handle: output is closed to drop buffered audio and
//! reopened for the next buffer, and the [`ParamCache`] carries over so rejected values are
//! not probed again.

use crate::error::{OutputError, Result};
use crate::format::AudioFormat;
use crate::negotiate;
use crate::param_cache::{Axis, ParamCache};
use crate::sink::{PcmSink, SinkDriver, close_retrying};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    /// Handle acquired, negotiation in progress.
    Opening,
    Open,
}

pub struct DeviceSession<D: SinkDriver> {
    device: String,
    driver: D,
    sink: Option<D::Sink>,
    format: AudioFormat,
    cache: ParamCache,
    state: SessionState,
}

impl<D: SinkDriver> DeviceSession<D> {
    /// Create a closed session for `device`. `format` is what a reopen negotiates until the
    /// first [`open`](Self::open) replaces it.
    pub fn new(device: impl Into<String>, driver: D, format: AudioFormat) -> Self {
        Self {
            device: device.into(),
            driver,
            sink: None,
            format,
            cache: ParamCache::new(),
            state: SessionState::Closed,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// The most recently negotiated format (or the requested one before any open).
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    pub fn cache(&self) -> &ParamCache {
        &self.cache
    }

    /// Open the device and negotiate `desired`.
    ///
    /// Callers must play with the returned format: channels, rate and bit depth may all
    /// differ from the request. Any depth other than 8 or 16 bits is replaced with 16.
    pub fn open(&mut self, desired: AudioFormat) -> Result<AudioFormat> {
        self.close();
        self.format = desired;
        self.reopen()
    }

    /// Open the handle again with the stored format.
    pub(crate) fn reopen(&mut self) -> Result<AudioFormat> {
        self.state = SessionState::Opening;
        let mut sink = match self.driver.open(&self.device) {
            Ok(sink) => sink,
            Err(source) => {
                tracing::warn!(device = %self.device, error = %source, "error opening OSS device");
                self.state = SessionState::Closed;
                return Err(OutputError::DeviceUnavailable {
                    device: self.device.clone(),
                    source,
                });
            }
        };

        match self.negotiate(&mut sink) {
            Ok(format) => {
                tracing::debug!(device = %self.device, "device will be playing {format}");
                self.format = format;
                self.sink = Some(sink);
                self.state = SessionState::Open;
                Ok(format)
            }
            Err(err) => {
                tracing::warn!(device = %self.device, "{err}");
                close_sink(&self.device, &mut sink);
                self.state = SessionState::Closed;
                Err(err)
            }
        }
    }

    fn negotiate(&mut self, sink: &mut D::Sink) -> Result<AudioFormat> {
        let desired = self.format;

        let channels = self.negotiate_axis(sink, Axis::Channels, desired.channels.into())?;
        let sample_rate = self.negotiate_axis(sink, Axis::Rate, desired.sample_rate)?;

        let bits = match desired.bits {
            8 | 16 => desired.bits,
            other => {
                tracing::debug!(device = %self.device, bits = other, "falling back to 16 bit");
                16
            }
        };
        let bits = self.negotiate_axis(sink, Axis::Bits, bits.into())?;

        Ok(AudioFormat {
            sample_rate,
            channels: narrow(Axis::Channels, channels)?,
            bits: narrow(Axis::Bits, bits)?,
        })
    }

    fn negotiate_axis(&mut self, sink: &mut D::Sink, axis: Axis, desired: u32) -> Result<u32> {
        negotiate::settle(&mut self.cache, sink, axis, desired).ok_or_else(|| {
            OutputError::Negotiation {
                device: self.device.clone(),
                axis,
                value: desired,
            }
        })
    }

    /// Release the handle. Safe to call when already closed.
    pub fn close(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            close_sink(&self.device, &mut sink);
        }
        self.state = SessionState::Closed;
    }

    /// Discard buffered audio and close, e.g. when the listener skips a track.
    ///
    /// The parameter history is kept; the next write reopens with the current format.
    pub fn drop_buffered(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.reset() {
                tracing::warn!(device = %self.device, error = %err, "error resetting OSS device");
            }
            self.close();
        }
    }

    pub(crate) fn sink_mut(&mut self) -> Option<&mut D::Sink> {
        self.sink.as_mut()
    }
}

fn close_sink<S: PcmSink>(device: &str, sink: &mut S) {
    if let Err(err) = close_retrying(sink) {
        tracing::warn!(device, error = %err, "error closing OSS device");
    }
}

fn narrow(axis: Axis, value: u32) -> Result<u8> {
    u8::try_from(value)
        .map_err(|_| OutputError::InvalidFormat(format!("device reported {axis} = {value}")))
}
