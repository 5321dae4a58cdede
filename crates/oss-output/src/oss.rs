//! OSS `/dev/dsp` device handles.
//!
//! Parameters are set with the classic `SNDCTL_DSP_*` ioctls. Bit depth travels as an
//! `AFMT_*` sample format: 8 bit maps to `AFMT_S8`, 16 bit to native-endian `AFMT_S16`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

use nix::errno::Errno;

use crate::param_cache::Axis;
use crate::probe::{self, DEFAULT_DEVICES};
use crate::sink::{PcmSink, SinkDriver};

pub const AFMT_S16_LE: i32 = 0x0000_0010;
pub const AFMT_S16_BE: i32 = 0x0000_0020;
pub const AFMT_S8: i32 = 0x0000_0040;

#[cfg(target_endian = "little")]
pub const AFMT_S16_NE: i32 = AFMT_S16_LE;
#[cfg(target_endian = "big")]
pub const AFMT_S16_NE: i32 = AFMT_S16_BE;

const SNDCTL_DSP_MAGIC: u8 = b'P';
const SNDCTL_DSP_RESET: u8 = 0;
const SNDCTL_DSP_SPEED: u8 = 2;
const SNDCTL_DSP_SETFMT: u8 = 5;
const SNDCTL_DSP_CHANNELS: u8 = 6;

nix::ioctl_none!(dsp_reset, SNDCTL_DSP_MAGIC, SNDCTL_DSP_RESET);
nix::ioctl_readwrite!(dsp_speed, SNDCTL_DSP_MAGIC, SNDCTL_DSP_SPEED, i32);
nix::ioctl_readwrite!(dsp_setfmt, SNDCTL_DSP_MAGIC, SNDCTL_DSP_SETFMT, i32);
nix::ioctl_readwrite!(dsp_channels, SNDCTL_DSP_MAGIC, SNDCTL_DSP_CHANNELS, i32);

/// Opens OSS DSP nodes write-only.
#[derive(Clone, Copy, Debug, Default)]
pub struct OssDriver;

impl SinkDriver for OssDriver {
    type Sink = OssDevice;

    fn open(&self, path: &str) -> io::Result<OssDevice> {
        OssDevice::open(path)
    }
}

/// Whether any of the default OSS nodes can be opened.
pub fn test_default_device() -> bool {
    probe::test_default_device(&OssDriver, DEFAULT_DEVICES)
}

/// An open OSS DSP handle.
#[derive(Debug)]
pub struct OssDevice {
    file: Option<File>,
}

impl OssDevice {
    pub fn open(path: &str) -> io::Result<Self> {
        let file = OpenOptions::new().write(true).open(path)?;
        Ok(Self { file: Some(file) })
    }

    fn fd(&self) -> io::Result<RawFd> {
        self.file
            .as_ref()
            .map(AsRawFd::as_raw_fd)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "device is closed"))
    }
}

impl PcmSink for OssDevice {
    fn set_param(&mut self, axis: Axis, value: u32) -> io::Result<u32> {
        let fd = self.fd()?;
        match axis {
            Axis::Rate => {
                let mut arg = to_arg(value)?;
                unsafe { dsp_speed(fd, &mut arg) }?;
                from_arg(arg)
            }
            Axis::Channels => {
                let mut arg = to_arg(value)?;
                unsafe { dsp_channels(fd, &mut arg) }?;
                from_arg(arg)
            }
            Axis::Bits => {
                let mut arg = afmt_for_bits(value)?;
                unsafe { dsp_setfmt(fd, &mut arg) }?;
                bits_for_afmt(arg)
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "device is closed")),
        }
    }

    fn reset(&mut self) -> io::Result<()> {
        let fd = self.fd()?;
        unsafe { dsp_reset(fd) }?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        let fd = file.into_raw_fd();
        match nix::unistd::close(fd) {
            Ok(()) => Ok(()),
            Err(Errno::EINTR) => {
                // Keep ownership so the caller's retry closes the same descriptor.
                self.file = Some(unsafe { File::from_raw_fd(fd) });
                Err(Errno::EINTR.into())
            }
            Err(errno) => Err(errno.into()),
        }
    }
}

fn to_arg(value: u32) -> io::Result<i32> {
    i32::try_from(value)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("{value} out of range")))
}

fn from_arg(arg: i32) -> io::Result<u32> {
    u32::try_from(arg).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidData, format!("device replied {arg}"))
    })
}

fn afmt_for_bits(bits: u32) -> io::Result<i32> {
    match bits {
        8 => Ok(AFMT_S8),
        16 => Ok(AFMT_S16_NE),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no OSS sample format for {other} bit audio"),
        )),
    }
}

fn bits_for_afmt(afmt: i32) -> io::Result<u32> {
    match afmt {
        AFMT_S8 => Ok(8),
        AFMT_S16_NE => Ok(16),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("device substituted sample format {other:#x}"),
        )),
    }
}
