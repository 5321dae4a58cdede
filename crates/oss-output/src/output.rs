//! Output plugin contract and its two implementations.

use crate::config::OssConfig;
use crate::error::{OutputError, Result};
use crate::format::AudioFormat;
use crate::mixer::{Mixer, MixerCommand};
use crate::probe::{self, DEFAULT_DEVICES};
use crate::session::DeviceSession;
use crate::sink::SinkDriver;
use crate::timer::Timer;

/// What the player core drives: open with a desired format, push PCM, cancel, close.
pub trait AudioOutput {
    fn name(&self) -> &'static str;

    /// Open the output. `format` is replaced with the format actually negotiated.
    fn open(&mut self, format: &mut AudioFormat) -> Result<()>;

    /// Deliver one chunk of interleaved PCM in the negotiated format.
    fn play(&mut self, chunk: &[u8]) -> Result<()>;

    /// Drop audio buffered downstream so playback stops promptly.
    fn cancel(&mut self);

    fn close(&mut self);

    /// Forward a command to the output's mixer.
    fn control(&mut self, command: MixerCommand) -> Option<u32>;
}

/// OSS output: a [`DeviceSession`] plus its mixer.
pub struct OssOutput<D: SinkDriver> {
    session: DeviceSession<D>,
    mixer: Box<dyn Mixer>,
}

impl<D: SinkDriver> OssOutput<D> {
    /// Create an output for the configured device, or the first usable default node.
    pub fn init(
        format: AudioFormat,
        config: &OssConfig,
        driver: D,
        mixer: Box<dyn Mixer>,
    ) -> Result<Self> {
        Self::init_with_candidates(format, config, driver, mixer, DEFAULT_DEVICES)
    }

    /// Like [`init`](Self::init) but searches `candidates` instead of the default table.
    pub fn init_with_candidates(
        format: AudioFormat,
        config: &OssConfig,
        driver: D,
        mixer: Box<dyn Mixer>,
        candidates: &[&str],
    ) -> Result<Self> {
        let device = match config.device() {
            Some(device) => device.to_string(),
            None => probe::find_default_device(candidates)?.to_string(),
        };
        tracing::debug!(device = %device, "OSS output initialized");
        Ok(Self {
            session: DeviceSession::new(device, driver, format),
            mixer,
        })
    }

    pub fn device(&self) -> &str {
        self.session.device()
    }

    pub fn session(&self) -> &DeviceSession<D> {
        &self.session
    }
}

impl<D: SinkDriver> AudioOutput for OssOutput<D> {
    fn name(&self) -> &'static str {
        "oss"
    }

    fn open(&mut self, format: &mut AudioFormat) -> Result<()> {
        *format = self.session.open(*format)?;
        if !self.mixer.open() {
            tracing::warn!(device = %self.session.device(), "mixer unavailable");
        }
        Ok(())
    }

    fn play(&mut self, chunk: &[u8]) -> Result<()> {
        self.session.write(chunk)
    }

    fn cancel(&mut self) {
        self.session.drop_buffered();
    }

    fn close(&mut self) {
        self.session.close();
        self.mixer.close();
    }

    fn control(&mut self, command: MixerCommand) -> Option<u32> {
        self.mixer.control(command)
    }
}

/// Discards PCM at real-time speed.
///
/// Nothing downstream applies back-pressure, so the output paces itself with a [`Timer`].
#[derive(Debug, Default)]
pub struct NullOutput {
    timer: Option<Timer>,
}

impl NullOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioOutput for NullOutput {
    fn name(&self) -> &'static str {
        "null"
    }

    fn open(&mut self, format: &mut AudioFormat) -> Result<()> {
        self.timer = Some(Timer::new(format)?);
        Ok(())
    }

    fn play(&mut self, chunk: &[u8]) -> Result<()> {
        let timer = self.timer.as_mut().ok_or(OutputError::NotOpen)?;
        if timer.is_started() {
            timer.sync()?;
        } else {
            timer.start();
        }
        timer.add(chunk.len())
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.reset();
        }
    }

    fn close(&mut self) {
        self.timer = None;
    }

    fn control(&mut self, _command: MixerCommand) -> Option<u32> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::mixer::NullMixer;
    use crate::testing::FakeDriver;

    #[derive(Default)]
    struct RecordingMixer {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Mixer for RecordingMixer {
        fn open(&mut self) -> bool {
            self.log.borrow_mut().push("open".into());
            true
        }

        fn close(&mut self) {
            self.log.borrow_mut().push("close".into());
        }

        fn control(&mut self, command: MixerCommand) -> Option<u32> {
            self.log.borrow_mut().push(format!("{command:?}"));
            match command {
                MixerCommand::GetVolume => Some(42),
                MixerCommand::SetVolume(v) => Some(v),
            }
        }
    }

    fn configured(device: &str) -> OssConfig {
        OssConfig {
            device: Some(device.to_string()),
        }
    }

    #[test]
    fn end_to_end_negotiation_updates_format_in_place() {
        let driver = FakeDriver::supporting(&[44_100, 48_000], &[2], &[16]);
        let mut output = OssOutput::init(
            AudioFormat::new(44_100, 6, 16),
            &configured("/dev/dsp"),
            driver.clone(),
            Box::new(NullMixer),
        )
        .unwrap();

        let mut format = AudioFormat::new(44_100, 6, 16);
        output.open(&mut format).unwrap();
        assert_eq!(format, AudioFormat::new(44_100, 2, 16));

        output.play(&[0; 4096]).unwrap();
        assert_eq!(driver.state().written.len(), 4096);
        output.close();
        assert!(!output.session().is_open());
    }

    #[test]
    fn configured_device_skips_search() {
        let driver = FakeDriver::supporting(&[], &[], &[]);
        let output = OssOutput::init_with_candidates(
            AudioFormat::new(44_100, 2, 16),
            &configured("/dev/dsp3"),
            driver,
            Box::new(NullMixer),
            &[],
        )
        .unwrap();
        assert_eq!(output.device(), "/dev/dsp3");
    }

    #[test]
    fn no_usable_default_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("dsp");
        let result = OssOutput::init_with_candidates(
            AudioFormat::new(44_100, 2, 16),
            &OssConfig::default(),
            FakeDriver::default(),
            Box::new(NullMixer),
            &[missing.to_str().unwrap()],
        );
        assert!(matches!(result, Err(OutputError::NoUsableDevice { .. })));
    }

    #[test]
    fn cancel_drops_buffered_audio_and_next_play_reopens() {
        let driver = FakeDriver::supporting(&[44_100], &[2], &[16]);
        let mut output = OssOutput::init(
            AudioFormat::new(44_100, 2, 16),
            &configured("/dev/dsp"),
            driver.clone(),
            Box::new(NullMixer),
        )
        .unwrap();
        let mut format = AudioFormat::new(44_100, 2, 16);
        output.open(&mut format).unwrap();

        output.cancel();
        assert_eq!(driver.state().resets, 1);
        output.play(&[1; 8]).unwrap();
        assert_eq!(driver.state().opens, 2);
    }

    #[test]
    fn mixer_sees_lifecycle_and_commands() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mixer = RecordingMixer { log: log.clone() };
        let driver = FakeDriver::supporting(&[44_100], &[2], &[16]);
        let mut output = OssOutput::init(
            AudioFormat::new(44_100, 2, 16),
            &configured("/dev/dsp"),
            driver,
            Box::new(mixer),
        )
        .unwrap();

        let mut format = AudioFormat::new(44_100, 2, 16);
        output.open(&mut format).unwrap();
        assert_eq!(output.control(MixerCommand::GetVolume), Some(42));
        assert_eq!(output.control(MixerCommand::SetVolume(7)), Some(7));
        output.close();

        assert_eq!(
            *log.borrow(),
            vec!["open", "GetVolume", "SetVolume(7)", "close"]
        );
    }

    #[test]
    fn failed_open_does_not_open_mixer() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mixer = RecordingMixer { log: log.clone() };
        let driver = FakeDriver::supporting(&[44_100], &[], &[16]);
        let mut output = OssOutput::init(
            AudioFormat::new(44_100, 2, 16),
            &configured("/dev/dsp"),
            driver,
            Box::new(mixer),
        )
        .unwrap();

        let mut format = AudioFormat::new(44_100, 2, 16);
        assert!(output.open(&mut format).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn null_output_requires_open() {
        let mut output = NullOutput::new();
        assert!(matches!(output.play(&[0; 4]), Err(OutputError::NotOpen)));
    }

    #[test]
    fn null_output_paces_to_real_time() {
        let mut output = NullOutput::new();
        let mut format = AudioFormat::new(44_100, 2, 16);
        output.open(&mut format).unwrap();

        let start = std::time::Instant::now();
        // Three 20 ms chunks: the first starts the clock, the next two wait on it.
        for _ in 0..3 {
            output.play(&[0; 3_528]).unwrap();
        }
        assert!(start.elapsed() >= std::time::Duration::from_millis(40));
    }

    #[test]
    fn null_output_cancel_restarts_clock() {
        let mut output = NullOutput::new();
        let mut format = AudioFormat::new(44_100, 2, 16);
        output.open(&mut format).unwrap();
        output.play(&[0; 176_400]).unwrap();

        output.cancel();
        let start = std::time::Instant::now();
        output.play(&[0; 4]).unwrap();
        assert!(start.elapsed() < std::time::Duration::from_millis(500));
    }
}
