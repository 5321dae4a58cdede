//! Mixer collaborator seam.
//!
//! The output only forwards commands; volume semantics belong to the mixer implementation.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixerCommand {
    GetVolume,
    SetVolume(u32),
}

pub trait Mixer {
    /// Called after the device has been opened. Returns `false` if the mixer is unavailable.
    fn open(&mut self) -> bool {
        true
    }

    fn close(&mut self) {}

    /// Execute `command`, returning the volume where the command yields one.
    fn control(&mut self, command: MixerCommand) -> Option<u32>;
}

/// A mixer that controls nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMixer;

impl Mixer for NullMixer {
    fn control(&mut self, _command: MixerCommand) -> Option<u32> {
        None
    }
}
