//! The playback engine.
//!
//! A [`Session`] binds one output device, keeps one mixing channel per output
//! channel, and forwards control calls to the audio thread through a bounded
//! lock-free queue.
//!
//! # Example
//!
//! ```no_run
//! use tactus::Session;
//! use tactus::signals::{Asr, Sine};
//!
//! let mut session = Session::new();
//! session.open()?;
//!
//! let cue = Sine::new(175.0) * Asr::new(0.05, 0.1, 0.05, 1.0);
//! session.play(0, cue)?;
//! session.set_volume(0, 0.5)?;
//! # Ok::<(), tactus::Error>(())
//! ```
//!
//! # Threads
//!
//! Control calls take `&mut self`: the command queue has exactly one producer,
//! and the borrow checker enforces it. Share a session between threads behind a
//! `Mutex`. Control calls return as soon as the command is queued; the effect
//! lands at the start of the next audio buffer. Poll [`Session::is_playing`]
//! when you need to observe it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::backend::{default_backend, Backend, StreamConfig, StreamHandle};
use crate::device::{self, Api, Device};
use crate::engine::{ChannelState, Command, Renderer, Reply, Snapshot, MAX_VOICES, QUEUE_SIZE};
use crate::error::{Error, Result};
use crate::signal::Signal;

static SESSIONS: AtomicUsize = AtomicUsize::new(0);

/// Frames per buffer assumed before the first buffer has been rendered.
const ASSUMED_BUFFER_FRAMES: usize = 1024;

/// Floor for how long an ordered query waits for the audio thread.
const MIN_QUERY_TIMEOUT: Duration = Duration::from_millis(50);

/// Which device [`Session::open_with`] should bind.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DeviceSelector {
    /// The system default output.
    #[default]
    Default,
    /// The default output of a host API.
    Api(Api),
    /// A device by enumeration index.
    Index(usize),
    /// A device by exact name within a host API.
    Named { name: String, api: Api },
    /// A previously enumerated device.
    Device(Device),
}

/// Options for [`Session::open_with`].
///
/// ```
/// use tactus::{OpenOptions, Session};
/// use tactus::backend::VirtualBackend;
///
/// let mut session = Session::with_backend(VirtualBackend::new());
/// session.open_with(OpenOptions::new().with_channels(4).with_sample_rate(44100)).unwrap();
/// assert_eq!(session.channel_count(), 4);
/// assert_eq!(session.sample_rate(), 44100);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct OpenOptions {
    pub device: DeviceSelector,
    /// Defaults to every channel the device has.
    pub channels: Option<usize>,
    /// Defaults to the device's default rate.
    pub sample_rate: Option<u32>,
    pub queue_capacity: usize,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self {
            device: DeviceSelector::Default,
            channels: None,
            sample_rate: None,
            queue_capacity: QUEUE_SIZE,
        }
    }

    pub fn with_device(mut self, device: DeviceSelector) -> Self {
        self.device = device;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything that exists only while a device is open.
struct Stream {
    device: Device,
    channels: usize,
    sample_rate: u32,
    commands: Producer<Command>,
    retired: Consumer<Signal>,
    snapshot: Arc<Snapshot>,
    handle: StreamHandle,
}

/// Real-time playback of [`Signal`]s on a multi-channel output device.
pub struct Session {
    backend: Box<dyn Backend>,
    devices: Vec<Device>,
    stream: Option<Stream>,
}

impl Session {
    /// A session on the default backend: cpal when the `cpal_backend` feature
    /// is enabled, a [`VirtualBackend`](crate::backend::VirtualBackend) otherwise.
    pub fn new() -> Self {
        Self::from_boxed(default_backend())
    }

    pub fn with_backend(backend: impl Backend + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    fn from_boxed(backend: Box<dyn Backend>) -> Self {
        let mut session = Self {
            backend,
            devices: Vec::new(),
            stream: None,
        };
        session.refresh_devices();
        SESSIONS.fetch_add(1, Ordering::Relaxed);
        session
    }

    /// Number of live sessions in the process.
    pub fn count() -> usize {
        SESSIONS.load(Ordering::Relaxed)
    }

    /// Re-enumerate output devices.
    pub fn refresh_devices(&mut self) {
        self.devices = device::tidy(self.backend.enumerate());
        tracing::debug!(count = self.devices.len(), "enumerated output devices");
    }

    /// Open the default device with all of its channels at its default rate.
    pub fn open(&mut self) -> Result<()> {
        self.open_with(OpenOptions::new())
    }

    /// Open the default device of `api`.
    pub fn open_api(&mut self, api: Api) -> Result<()> {
        self.open_with(OpenOptions::new().with_device(DeviceSelector::Api(api)))
    }

    /// Open the device called `name` under `api`.
    pub fn open_named(&mut self, name: &str, api: Api) -> Result<()> {
        let device = DeviceSelector::Named {
            name: name.to_owned(),
            api,
        };
        self.open_with(OpenOptions::new().with_device(device))
    }

    /// Open a device by enumeration index.
    pub fn open_index(&mut self, index: usize) -> Result<()> {
        self.open_with(OpenOptions::new().with_device(DeviceSelector::Index(index)))
    }

    pub fn open_device(&mut self, device: &Device) -> Result<()> {
        self.open_with(OpenOptions::new().with_device(DeviceSelector::Device(device.clone())))
    }

    /// Open a device. Either the stream runs and the session is open, or the
    /// session stays closed.
    pub fn open_with(&mut self, options: OpenOptions) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::AlreadyOpen);
        }
        let device = self.select(&options.device)?;
        let channels = options.channels.unwrap_or(device.max_channels);
        if channels == 0 || channels > device.max_channels {
            return Err(Error::InvalidChannelCount(channels));
        }
        let sample_rate = options.sample_rate.unwrap_or(device.default_sample_rate);
        let config = StreamConfig {
            channels,
            sample_rate,
        };
        if !self.backend.is_format_supported(&device, &config) {
            return Err(Error::InvalidSampleRate(sample_rate));
        }

        let (commands, command_rx) = RingBuffer::new(options.queue_capacity);
        let (retire_tx, retired) = RingBuffer::new(options.queue_capacity + channels * MAX_VOICES);
        let snapshot = Arc::new(Snapshot::new(channels));
        let mut renderer = Renderer::new(channels, sample_rate, command_rx, retire_tx, snapshot.clone());

        let handle = self
            .backend
            .open_stream(&device, config, Box::new(move |out: &mut [f32]| renderer.render(out)))
            .map_err(|e| {
                tracing::warn!(device = %device.name, error = %e, "failed to start stream");
                e
            })?;

        tracing::info!(
            device = %device.name,
            api = %device.api_name,
            channels,
            sample_rate,
            "session opened"
        );
        self.stream = Some(Stream {
            device,
            channels,
            sample_rate,
            commands,
            retired,
            snapshot,
            handle,
        });
        Ok(())
    }

    fn select(&self, selector: &DeviceSelector) -> Result<Device> {
        let found = match selector {
            DeviceSelector::Default => self.default_device().cloned(),
            DeviceSelector::Api(api) => {
                let of_api: Vec<&Device> = self.devices.iter().filter(|d| d.api == *api).collect();
                if of_api.is_empty() {
                    return Err(Error::InvalidApi);
                }
                of_api
                    .iter()
                    .find(|d| d.is_api_default)
                    .or_else(|| of_api.first())
                    .map(|d| (*d).clone())
            }
            DeviceSelector::Index(index) => self.devices.iter().find(|d| d.index == *index).cloned(),
            DeviceSelector::Named { name, api } => self
                .devices
                .iter()
                .find(|d| d.name == *name && d.api == *api)
                .cloned(),
            DeviceSelector::Device(device) => self
                .devices
                .iter()
                .find(|d| d.index == device.index && d.name == device.name)
                .cloned(),
        };
        found.ok_or(Error::InvalidDevice)
    }

    /// Stop the stream and wait for the audio thread to finish.
    pub fn close(&mut self) -> Result<()> {
        let stream = self.stream.take().ok_or(Error::NotOpen)?;
        stream.handle.close();
        tracing::info!(device = %stream.device.name, "session closed");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.handle.is_active())
    }

    fn stream_mut(&mut self, channel: usize) -> Result<&mut Stream> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;
        if channel >= stream.channels {
            return Err(Error::InvalidChannel {
                channel,
                count: stream.channels,
            });
        }
        // signals the audio thread is done with are freed here
        while let Ok(signal) = stream.retired.pop() {
            drop(signal);
        }
        Ok(stream)
    }

    fn send(&mut self, command: Command) -> Result<()> {
        let stream = self.stream_mut(command.channel())?;
        stream.commands.push(command).map_err(|rtrb::PushError::Full(command)| {
            tracing::warn!(channel = command.channel(), "command queue full");
            Error::QueueFull
        })
    }

    fn for_all(&mut self, mut f: impl FnMut(&mut Self, usize) -> Result<()>) -> Result<()> {
        let channels = self.stream.as_ref().ok_or(Error::NotOpen)?.channels;
        (0..channels).try_for_each(|channel| f(self, channel))
    }

    /// Play `signal` on `channel`, alongside anything already playing there.
    pub fn play(&mut self, channel: usize, signal: impl Into<Signal>) -> Result<()> {
        let signal = signal.into();
        self.stream_mut(channel)?;
        if !(signal.length() > 0.0) {
            return Err(Error::NoWaveform);
        }
        tracing::debug!(channel, signal = signal.type_name(), length = signal.length(), "play");
        self.send(Command::Play { channel, signal })
    }

    pub fn play_all(&mut self, signal: impl Into<Signal>) -> Result<()> {
        let signal = signal.into();
        self.for_all(|session, channel| session.play(channel, signal.clone()))
    }

    /// Stop every voice on `channel`.
    pub fn stop(&mut self, channel: usize) -> Result<()> {
        tracing::debug!(channel, "stop");
        self.send(Command::Stop { channel })
    }

    pub fn stop_all(&mut self) -> Result<()> {
        self.for_all(|session, channel| session.stop(channel))
    }

    pub fn pause(&mut self, channel: usize) -> Result<()> {
        self.send(Command::SetPause {
            channel,
            paused: true,
        })
    }

    pub fn pause_all(&mut self) -> Result<()> {
        self.for_all(|session, channel| session.pause(channel))
    }

    pub fn resume(&mut self, channel: usize) -> Result<()> {
        self.send(Command::SetPause {
            channel,
            paused: false,
        })
    }

    pub fn resume_all(&mut self) -> Result<()> {
        self.for_all(|session, channel| session.resume(channel))
    }

    /// Set the volume of `channel`, clamped to `[0, 1]`. NaN mutes.
    pub fn set_volume(&mut self, channel: usize, volume: f64) -> Result<()> {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) as f32 };
        self.send(Command::SetVolume { channel, volume })
    }

    pub fn set_volume_all(&mut self, volume: f64) -> Result<()> {
        self.for_all(|session, channel| session.set_volume(channel, volume))
    }

    /// Set the playback rate of `channel`. 1.0 is normal speed; negative values
    /// are treated as 0.
    pub fn set_pitch(&mut self, channel: usize, pitch: f64) -> Result<()> {
        let pitch = pitch.max(0.0) as f32;
        self.send(Command::SetPitch { channel, pitch })
    }

    pub fn set_pitch_all(&mut self, pitch: f64) -> Result<()> {
        self.for_all(|session, channel| session.set_pitch(channel, pitch))
    }

    fn state(&self, channel: usize) -> Result<&ChannelState> {
        let stream = self.stream.as_ref().ok_or(Error::NotOpen)?;
        stream.snapshot.channels.get(channel).ok_or(Error::InvalidChannel {
            channel,
            count: stream.channels,
        })
    }

    /// Volume of `channel` as of the last rendered buffer.
    pub fn get_volume(&self, channel: usize) -> Result<f64> {
        Ok(self.state(channel)?.volume.get() as f64)
    }

    /// Pitch of `channel` as of the last rendered buffer.
    pub fn get_pitch(&self, channel: usize) -> Result<f64> {
        Ok(self.state(channel)?.pitch.get() as f64)
    }

    /// Peak absolute sample of `channel` in the last rendered buffer.
    pub fn get_level(&self, channel: usize) -> Result<f64> {
        Ok(self.state(channel)?.level.get() as f64)
    }

    /// Whether `channel` has an active voice and is not paused.
    pub fn is_playing(&self, channel: usize) -> bool {
        self.state(channel)
            .is_ok_and(|s| s.playing.load(Ordering::Acquire))
    }

    pub fn is_paused(&self, channel: usize) -> bool {
        self.state(channel)
            .is_ok_and(|s| s.paused.load(Ordering::Acquire))
    }

    /// Volume of `channel` after every command queued so far has been applied.
    ///
    /// Waits for the audio thread. If it does not answer within a few buffer
    /// periods the last published value is returned instead.
    pub fn query_volume(&mut self, channel: usize) -> Result<f64> {
        self.query(channel, |channel, reply| Command::GetVolume { channel, reply })
            .map(|v| v.unwrap_or_else(|| self.get_volume(channel).unwrap_or(0.0)))
    }

    /// Pitch of `channel` after every command queued so far has been applied.
    pub fn query_pitch(&mut self, channel: usize) -> Result<f64> {
        self.query(channel, |channel, reply| Command::GetPitch { channel, reply })
            .map(|v| v.unwrap_or_else(|| self.get_pitch(channel).unwrap_or(0.0)))
    }

    /// Level of `channel` as measured by the buffer rendered before every
    /// command queued so far was applied.
    pub fn query_level(&mut self, channel: usize) -> Result<f64> {
        self.query(channel, |channel, reply| Command::GetLevel { channel, reply })
            .map(|v| v.unwrap_or_else(|| self.get_level(channel).unwrap_or(0.0)))
    }

    fn query(
        &mut self,
        channel: usize,
        command: impl FnOnce(usize, Arc<Reply>) -> Command,
    ) -> Result<Option<f64>> {
        let reply = Reply::new();
        self.send(command(channel, reply.clone()))?;
        let timeout = self.query_timeout();
        let answer = reply.wait(timeout);
        if answer.is_none() {
            tracing::warn!(channel, ?timeout, "audio thread did not answer query");
        }
        Ok(answer.map(f64::from))
    }

    fn query_timeout(&self) -> Duration {
        let Some(stream) = &self.stream else {
            return MIN_QUERY_TIMEOUT;
        };
        let frames = match stream.snapshot.buffer_frames.load(Ordering::Relaxed) {
            0 => ASSUMED_BUFFER_FRAMES,
            n => n,
        };
        let period = Duration::from_secs_f64(frames as f64 / stream.sample_rate as f64);
        (period * 4).max(MIN_QUERY_TIMEOUT)
    }

    /// Open channels, or 0 when closed.
    pub fn channel_count(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.channels)
    }

    /// Sample rate in Hz, or 0 when closed.
    pub fn sample_rate(&self) -> u32 {
        self.stream.as_ref().map_or(0, |s| s.sample_rate)
    }

    /// Smoothed fraction of each buffer period spent rendering.
    pub fn cpu_load(&self) -> f64 {
        self.stream
            .as_ref()
            .map_or(0.0, |s| s.snapshot.cpu_load.get() as f64)
    }

    /// Buffers rendered since the session was opened.
    pub fn buffers_rendered(&self) -> u64 {
        self.stream
            .as_ref()
            .map_or(0, |s| s.snapshot.buffers.load(Ordering::Acquire))
    }

    pub fn current_device(&self) -> Option<&Device> {
        self.stream.as_ref().map(|s| &s.device)
    }

    /// The system default output, or the first device if none is flagged.
    pub fn default_device(&self) -> Option<&Device> {
        self.devices
            .iter()
            .find(|d| d.is_default)
            .or_else(|| self.devices.first())
    }

    pub fn available_devices(&self) -> &[Device] {
        &self.devices
    }

    /// Open the driver settings panel of the device at `index`, where supported.
    pub fn open_control_panel(&mut self, index: usize) -> Result<()> {
        let device = self.select(&DeviceSelector::Index(index))?;
        self.backend.open_control_panel(&device)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.stream.is_some() {
            let _ = self.close();
        }
        SESSIONS.fetch_sub(1, Ordering::Relaxed);
    }
}
