//! Platform audio layer boundary.
//!
//! A [`Backend`] enumerates output devices and opens streams that call a
//! render callback from their own thread. Two backends ship with the crate:
//!
//! - [`CpalBackend`] - real devices through cpal (requires the `cpal_backend` feature)
//! - [`VirtualBackend`] - an in-process device, either paced in real time on
//!   its own thread or stepped by hand for deterministic tests

#[cfg(feature = "cpal_backend")]
mod cpal_host;
mod virtual_device;

#[cfg(feature = "cpal_backend")]
pub use cpal_host::CpalBackend;
pub use virtual_device::{Stepper, VirtualBackend};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::device::Device;
use crate::error::Result;

/// Fills one interleaved `f32` buffer. Called on the stream's thread.
pub type RenderCallback = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Format requested when opening a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    pub channels: usize,
    pub sample_rate: u32,
}

/// Platform audio layer.
pub trait Backend: Send {
    /// Enumerate output devices. Indices must be stable until the next call.
    fn enumerate(&mut self) -> Vec<Device>;

    /// Whether `device` can run with `config`.
    fn is_format_supported(&self, device: &Device, config: &StreamConfig) -> bool {
        config.channels >= 1
            && config.channels <= device.max_channels
            && device.supports_sample_rate(config.sample_rate)
    }

    /// Start a stream on `device`. Returns once the stream runs or has failed.
    fn open_stream(
        &mut self,
        device: &Device,
        config: StreamConfig,
        render: RenderCallback,
    ) -> Result<StreamHandle>;

    /// Open the driver's own settings panel for `device`, where one exists.
    fn open_control_panel(&mut self, _device: &Device) -> Result<()> {
        Err(crate::Error::ControlPanelFail)
    }
}

/// A running stream. Dropping or closing it stops the stream and waits for
/// its thread to finish.
pub struct StreamHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl StreamHandle {
    /// A stream driven by `thread`, which must exit soon after `running` goes false.
    pub fn threaded(running: Arc<AtomicBool>, thread: JoinHandle<()>) -> Self {
        Self {
            running,
            thread: Some(thread),
            on_close: None,
        }
    }

    /// A stream without a thread of its own; `on_close` runs once at close.
    pub fn detached(on_close: impl FnOnce() + Send + 'static) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            thread: None,
            on_close: Some(Box::new(on_close)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            if thread.join().is_err() {
                tracing::warn!("audio stream thread panicked");
            }
        }
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Backend used by [`Session::new`](crate::Session::new).
pub fn default_backend() -> Box<dyn Backend> {
    #[cfg(feature = "cpal_backend")]
    {
        Box::new(CpalBackend::new())
    }
    #[cfg(not(feature = "cpal_backend"))]
    {
        Box::new(VirtualBackend::new())
    }
}
