use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rtrb::{Consumer, Producer};

use crate::engine::{AtomicF32, Channel, Command};
use crate::signal::Signal;

/// Per-channel values published at the end of every buffer.
#[derive(Debug)]
pub(crate) struct ChannelState {
    pub volume: AtomicF32,
    pub pitch: AtomicF32,
    pub level: AtomicF32,
    pub playing: AtomicBool,
    pub paused: AtomicBool,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            volume: AtomicF32::new(1.0),
            pitch: AtomicF32::new(1.0),
            level: AtomicF32::new(0.0),
            playing: AtomicBool::new(false),
            paused: AtomicBool::new(false),
        }
    }
}

/// Lock-free view of the renderer, shared with the control thread.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub channels: Box<[ChannelState]>,
    pub cpu_load: AtomicF32,
    pub buffers: AtomicU64,
    pub buffer_frames: AtomicUsize,
}

impl Snapshot {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: (0..channels).map(|_| ChannelState::default()).collect(),
            cpu_load: AtomicF32::new(0.0),
            buffers: AtomicU64::new(0),
            buffer_frames: AtomicUsize::new(0),
        }
    }
}

/// Owns the channel array and turns commands into audio.
pub(crate) struct Renderer {
    channels: Vec<Channel>,
    commands: Consumer<Command>,
    retired: Producer<Signal>,
    snapshot: Arc<Snapshot>,
    sample_rate: f64,
    cpu_load: f64,
}

impl Renderer {
    pub fn new(
        channels: usize,
        sample_rate: u32,
        commands: Consumer<Command>,
        retired: Producer<Signal>,
        snapshot: Arc<Snapshot>,
    ) -> Self {
        Self {
            channels: (0..channels).map(|_| Channel::default()).collect(),
            commands,
            retired,
            snapshot,
            sample_rate: sample_rate as f64,
            cpu_load: 0.0,
        }
    }

    fn perform_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            let Some(channel) = self.channels.get_mut(command.channel()) else {
                continue;
            };
            match command {
                Command::Play { signal, .. } => channel.play(signal, &mut self.retired),
                Command::Stop { .. } => channel.stop(&mut self.retired),
                Command::SetPause { paused, .. } => channel.paused = paused,
                Command::SetVolume { volume, .. } => channel.volume = volume,
                Command::SetPitch { pitch, .. } => channel.pitch = pitch,
                Command::GetVolume { reply, .. } => reply.fulfill(channel.volume),
                Command::GetPitch { reply, .. } => reply.fulfill(channel.pitch),
                Command::GetLevel { reply, .. } => reply.fulfill(channel.level),
            }
        }
    }

    /// Render one interleaved buffer. Never blocks or allocates.
    pub fn render(&mut self, out: &mut [f32]) {
        let start = Instant::now();
        self.perform_commands();

        let stride = self.channels.len();
        if stride == 0 {
            out.fill(0.0);
            return;
        }
        let frames = out.len() / stride;
        let (body, tail) = out.split_at_mut(frames * stride);
        tail.fill(0.0);

        let sample_length = 1.0 / self.sample_rate;
        for (offset, channel) in self.channels.iter_mut().enumerate() {
            channel.fill(body, offset, stride, sample_length, &mut self.retired);
        }

        self.publish(frames, start);
    }

    fn publish(&mut self, frames: usize, start: Instant) {
        for (channel, state) in self.channels.iter().zip(self.snapshot.channels.iter()) {
            state.volume.set(channel.volume);
            state.pitch.set(channel.pitch);
            state.level.set(channel.level);
            state.paused.store(channel.paused, Ordering::Release);
            state.playing.store(channel.is_playing(), Ordering::Release);
        }
        if frames > 0 {
            let period = frames as f64 / self.sample_rate;
            let load = start.elapsed().as_secs_f64() / period;
            self.cpu_load = 0.9 * self.cpu_load + 0.1 * load;
            self.snapshot.cpu_load.set(self.cpu_load as f32);
            self.snapshot.buffer_frames.store(frames, Ordering::Relaxed);
        }
        self.snapshot.buffers.fetch_add(1, Ordering::Release);
    }
}
