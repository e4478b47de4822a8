use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::AtomicF32;
use crate::signal::Signal;

/// One control instruction for the audio thread.
pub(crate) enum Command {
    Play { channel: usize, signal: Signal },
    Stop { channel: usize },
    SetPause { channel: usize, paused: bool },
    SetVolume { channel: usize, volume: f32 },
    SetPitch { channel: usize, pitch: f32 },
    GetVolume { channel: usize, reply: Arc<Reply> },
    GetPitch { channel: usize, reply: Arc<Reply> },
    GetLevel { channel: usize, reply: Arc<Reply> },
}

impl Command {
    pub fn channel(&self) -> usize {
        match *self {
            Command::Play { channel, .. }
            | Command::Stop { channel }
            | Command::SetPause { channel, .. }
            | Command::SetVolume { channel, .. }
            | Command::SetPitch { channel, .. }
            | Command::GetVolume { channel, .. }
            | Command::GetPitch { channel, .. }
            | Command::GetLevel { channel, .. } => channel,
        }
    }
}

/// Completion slot for the query commands.
#[derive(Debug, Default)]
pub(crate) struct Reply {
    done: AtomicBool,
    value: AtomicF32,
}

impl Reply {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Called by the audio thread.
    pub fn fulfill(&self, value: f32) {
        self.value.set(value);
        self.done.store(true, Ordering::Release);
    }

    /// Spin until the audio thread answers or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Option<f32> {
        let start = Instant::now();
        loop {
            if self.done.load(Ordering::Acquire) {
                return Some(self.value.get());
            }
            if start.elapsed() >= timeout {
                return None;
            }
            std::thread::yield_now();
        }
    }
}
