//! The audio-thread half of a session.
//!
//! Control calls become [`Command`]s pushed through an `rtrb` ring buffer. The
//! [`Renderer`] owns every [`Channel`], drains the queue at the start of each
//! buffer, mixes, and publishes a [`Snapshot`] through atomics the control side
//! can read without blocking.

mod channel;
mod command;
mod renderer;

use std::sync::atomic::{AtomicU32, Ordering};

pub(crate) use channel::Channel;
pub(crate) use command::{Command, Reply};
pub(crate) use renderer::{ChannelState, Renderer, Snapshot};

/// Voices each channel can play at once.
pub const MAX_VOICES: usize = 8;

/// Default capacity of the control-to-audio command queue.
pub const QUEUE_SIZE: usize = 256;

/// An `f32` stored in an `AtomicU32`.
#[derive(Debug, Default)]
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}
