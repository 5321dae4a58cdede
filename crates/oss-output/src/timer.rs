//! Wall-clock pacing for sinks that accept data faster than they play it.
//!
//! The timer converts bytes delivered into virtual playback time using the stream's byte
//! rate. [`Timer::sync`] blocks until real time has caught up with that virtual clock.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{OutputError, Result};
use crate::format::AudioFormat;

#[derive(Clone, Debug)]
pub struct Timer {
    origin: Option<Instant>,
    /// Bytes added since `start`; virtual time is derived from the total so per-call
    /// rounding does not accumulate.
    bytes: u64,
    byte_rate: u64,
}

impl Timer {
    pub fn new(format: &AudioFormat) -> Result<Self> {
        if !format.is_valid() {
            return Err(OutputError::InvalidFormat(format!(
                "cannot pace {format}"
            )));
        }
        Ok(Self {
            origin: None,
            bytes: 0,
            byte_rate: format.byte_rate(),
        })
    }

    pub fn byte_rate(&self) -> u64 {
        self.byte_rate
    }

    pub fn is_started(&self) -> bool {
        self.origin.is_some()
    }

    /// Anchor virtual time to now.
    pub fn start(&mut self) {
        self.origin = Some(Instant::now());
        self.bytes = 0;
    }

    /// Deactivate and forget accumulated time.
    pub fn reset(&mut self) {
        self.origin = None;
        self.bytes = 0;
    }

    /// Advance virtual time by the playback duration of `bytes`.
    pub fn add(&mut self, bytes: usize) -> Result<()> {
        if self.origin.is_none() {
            return Err(OutputError::TimerNotStarted);
        }
        self.bytes = self.bytes.saturating_add(bytes as u64);
        Ok(())
    }

    /// Virtual playback time accumulated since `start`.
    pub fn elapsed(&self) -> Duration {
        let micros = u128::from(self.bytes) * 1_000_000 / u128::from(self.byte_rate);
        Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }

    /// How far virtual time runs ahead of the wall clock.
    pub fn lead(&self) -> Result<Duration> {
        let origin = self.origin.ok_or(OutputError::TimerNotStarted)?;
        Ok(self.elapsed().saturating_sub(origin.elapsed()))
    }

    /// Sleep until the wall clock reaches virtual time. Returns how long it slept.
    pub fn sync(&self) -> Result<Duration> {
        let lead = self.lead()?;
        if !lead.is_zero() {
            thread::sleep(lead);
        }
        Ok(lead)
    }
}
