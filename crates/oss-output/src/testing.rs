//! Scripted in-memory driver for unit tests.

use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::param_cache::Axis;
use crate::sink::{PcmSink, SinkDriver};

/// A scripted response for the next `write` call.
#[derive(Clone, Copy, Debug)]
pub enum WriteStep {
    Interrupted,
    Fail(io::ErrorKind),
    Zero,
    /// Report this many bytes written without storing anything.
    Claim(usize),
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub rates: Vec<u32>,
    pub channels: Vec<u32>,
    pub bits: Vec<u32>,
    /// Rate reported back on success instead of the request.
    pub rate_adjust: Option<u32>,
    pub open_error: Option<io::ErrorKind>,
    /// Largest chunk a single write accepts; zero means unlimited.
    pub max_chunk: usize,
    pub write_script: VecDeque<WriteStep>,
    /// Number of `Interrupted` replies before close succeeds.
    pub close_interrupts: usize,

    pub opens: usize,
    pub probes: Vec<(Axis, u32)>,
    pub write_calls: usize,
    pub written: Vec<u8>,
    pub resets: usize,
    pub close_calls: usize,
}

#[derive(Clone, Debug, Default)]
pub struct FakeDriver {
    state: Rc<RefCell<FakeState>>,
}

impl FakeDriver {
    /// A device that accepts exactly the listed values on each axis.
    pub fn supporting(rates: &[u32], channels: &[u32], bits: &[u32]) -> Self {
        let driver = Self::default();
        {
            let mut state = driver.state();
            state.rates = rates.to_vec();
            state.channels = channels.to_vec();
            state.bits = bits.to_vec();
        }
        driver
    }

    pub fn state(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }
}

impl SinkDriver for FakeDriver {
    type Sink = FakeSink;

    fn open(&self, _path: &str) -> io::Result<FakeSink> {
        let mut state = self.state();
        if let Some(kind) = state.open_error {
            return Err(io::Error::from(kind));
        }
        state.opens += 1;
        Ok(FakeSink {
            state: self.state.clone(),
        })
    }
}

#[derive(Debug)]
pub struct FakeSink {
    state: Rc<RefCell<FakeState>>,
}

impl PcmSink for FakeSink {
    fn set_param(&mut self, axis: Axis, value: u32) -> io::Result<u32> {
        let mut state = self.state.borrow_mut();
        state.probes.push((axis, value));
        let accepted = match axis {
            Axis::Rate => &state.rates,
            Axis::Channels => &state.channels,
            Axis::Bits => &state.bits,
        };
        if !accepted.contains(&value) {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        match (axis, state.rate_adjust) {
            (Axis::Rate, Some(adjusted)) => Ok(adjusted),
            _ => Ok(value),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.write_calls += 1;
        match state.write_script.pop_front() {
            Some(WriteStep::Interrupted) => return Err(io::Error::from(io::ErrorKind::Interrupted)),
            Some(WriteStep::Fail(kind)) => return Err(io::Error::from(kind)),
            Some(WriteStep::Zero) => return Ok(0),
            Some(WriteStep::Claim(n)) => return Ok(n),
            None => {}
        }
        let n = match state.max_chunk {
            0 => buf.len(),
            max => buf.len().min(max),
        };
        state.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn reset(&mut self) -> io::Result<()> {
        self.state.borrow_mut().resets += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.close_calls += 1;
        if state.close_interrupts > 0 {
            state.close_interrupts -= 1;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        Ok(())
    }
}
