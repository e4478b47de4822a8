//! In-process output device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rtrb::Producer;

use crate::backend::{Backend, RenderCallback, StreamConfig, StreamHandle};
use crate::device::{Api, Device, STANDARD_SAMPLE_RATES};
use crate::error::{Error, Result};

const DEFAULT_BUFFER_FRAMES: usize = 256;

struct ManualStream {
    render: RenderCallback,
    channels: usize,
}

type ManualSlot = Arc<Mutex<Option<ManualStream>>>;

/// An output device that exists only in this process.
///
/// By default a stream renders on its own thread, paced to real time (or
/// faster, see [`with_speed`](Self::with_speed)), and throws the audio away
/// unless a capture ring is attached. [`VirtualBackend::manual`] instead hands
/// out a [`Stepper`] that renders buffers on demand.
///
/// ```
/// use tactus::{Session, backend::VirtualBackend, signals::Scalar};
///
/// let (backend, stepper) = VirtualBackend::manual();
/// let mut session = Session::with_backend(backend);
/// session.open().unwrap();
/// session.play(0, Scalar::new(0.25) * tactus::signals::Envelope::new(1.0, 1.0)).unwrap();
/// let out = stepper.render(4);
/// assert_eq!(out.len(), 4 * session.channel_count());
/// assert_eq!(out[0], 0.25);
/// ```
pub struct VirtualBackend {
    devices: Vec<Device>,
    buffer_frames: usize,
    speed: f64,
    capture: Option<Producer<f32>>,
    fail_streams: bool,
    manual: Option<ManualSlot>,
}

impl VirtualBackend {
    /// One 8 channel default device supporting the standard sample rates.
    pub fn new() -> Self {
        let device = Device::new(0, "Virtual Output", Api::Virtual)
            .with_default(true)
            .with_max_channels(8)
            .with_sample_rates(STANDARD_SAMPLE_RATES.to_vec(), 48000);
        Self {
            devices: vec![device],
            buffer_frames: DEFAULT_BUFFER_FRAMES,
            speed: 1.0,
            capture: None,
            fail_streams: false,
            manual: None,
        }
    }

    /// A backend whose streams only render when the returned [`Stepper`] asks.
    pub fn manual() -> (Self, Stepper) {
        let slot: ManualSlot = Arc::new(Mutex::new(None));
        let mut backend = Self::new();
        backend.manual = Some(slot.clone());
        (backend, Stepper { slot })
    }

    /// Replace the device list.
    pub fn with_devices(mut self, devices: Vec<Device>) -> Self {
        self.devices = devices;
        self
    }

    /// Frames per rendered buffer.
    pub fn with_buffer_frames(mut self, frames: usize) -> Self {
        self.buffer_frames = frames.max(1);
        self
    }

    /// Render `speed` times faster than real time.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed.max(f64::MIN_POSITIVE);
        self
    }

    /// Push every rendered sample, interleaved, into `producer`. Buffers that
    /// do not fit are skipped whole.
    pub fn with_capture(mut self, producer: Producer<f32>) -> Self {
        self.capture = Some(producer);
        self
    }

    /// Make every stream fail to start, as a broken driver would.
    pub fn with_failing_streams(mut self, fail: bool) -> Self {
        self.fail_streams = fail;
        self
    }

    fn open_threaded(&mut self, config: StreamConfig, mut render: RenderCallback) -> Result<StreamHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let mut capture = self.capture.take();
        let frames = self.buffer_frames;
        let period = Duration::from_secs_f64(frames as f64 / config.sample_rate as f64 / self.speed);

        let thread = std::thread::Builder::new()
            .name("tactus-virtual-output".into())
            .spawn(move || {
                let mut buffer = vec![0.0f32; frames * config.channels];
                let start = Instant::now();
                let mut rendered = 0u64;
                while flag.load(Ordering::Acquire) {
                    render(&mut buffer);
                    if let Some(producer) = capture.as_mut() {
                        if producer.slots() >= buffer.len() {
                            for &s in &buffer {
                                let _ = producer.push(s);
                            }
                        }
                    }
                    rendered += 1;
                    let due = start + period.mul_f64(rendered as f64);
                    let now = Instant::now();
                    if due > now {
                        std::thread::park_timeout(due - now);
                    }
                }
            })
            .map_err(|e| Error::Backend(e.to_string()))?;

        Ok(StreamHandle::threaded(running, thread))
    }
}

impl Default for VirtualBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for VirtualBackend {
    fn enumerate(&mut self) -> Vec<Device> {
        self.devices.clone()
    }

    fn open_stream(
        &mut self,
        _device: &Device,
        config: StreamConfig,
        render: RenderCallback,
    ) -> Result<StreamHandle> {
        if self.fail_streams {
            return Err(Error::Backend("virtual stream refused to start".into()));
        }
        match &self.manual {
            Some(slot) => {
                let stream = ManualStream {
                    render,
                    channels: config.channels,
                };
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(stream);
                let slot = slot.clone();
                Ok(StreamHandle::detached(move || {
                    slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                }))
            }
            None => self.open_threaded(config, render),
        }
    }
}

/// Drives the stream of a manual [`VirtualBackend`].
#[derive(Clone)]
pub struct Stepper {
    slot: ManualSlot,
}

impl Stepper {
    /// Whether a stream is currently open on the backend.
    pub fn is_running(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Render `frames` frames and return them interleaved. Empty when no
    /// stream is open.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(stream) => {
                let mut out = vec![0.0; frames * stream.channels];
                (stream.render)(&mut out);
                out
            }
            None => Vec::new(),
        }
    }

    /// Render `buffers` buffers of `frames` frames each and return them
    /// concatenated.
    pub fn render_buffers(&self, buffers: usize, frames: usize) -> Vec<f32> {
        (0..buffers).flat_map(|_| self.render(frames)).collect()
    }
}
