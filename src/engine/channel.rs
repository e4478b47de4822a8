use rtrb::Producer;

use crate::engine::MAX_VOICES;
use crate::signal::Signal;

/// One in-flight playback of a signal.
struct Voice {
    signal: Signal,
    time: f64,
    length: f64,
}

/// Mixing state of one output channel. Lives on the audio thread only.
pub(crate) struct Channel {
    voices: [Option<Voice>; MAX_VOICES],
    pub volume: f32,
    last_volume: f32,
    pub pitch: f32,
    last_pitch: f32,
    pub paused: bool,
    pub level: f32,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            voices: Default::default(),
            volume: 1.0,
            last_volume: 1.0,
            pitch: 1.0,
            last_pitch: 1.0,
            paused: false,
            level: 0.0,
        }
    }
}

/// Hand a finished signal back to the control thread, so the audio thread
/// never frees a payload. Dropped in place if the return ring is full.
#[inline]
fn retire(signal: Signal, retired: &mut Producer<Signal>) {
    let _ = retired.push(signal);
}

impl Channel {
    /// Start a voice in the first idle slot, reclaiming slot 0 when all are busy.
    pub fn play(&mut self, signal: Signal, retired: &mut Producer<Signal>) {
        let length = signal.length();
        let voice = Voice {
            signal,
            time: 0.0,
            length,
        };
        let slot = self.voices.iter().position(Option::is_none).unwrap_or(0);
        if let Some(old) = self.voices[slot].replace(voice) {
            retire(old.signal, retired);
        }
        self.paused = false;
    }

    pub fn stop(&mut self, retired: &mut Producer<Signal>) {
        for slot in self.voices.iter_mut() {
            if let Some(voice) = slot.take() {
                retire(voice.signal, retired);
            }
        }
        self.paused = false;
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().flatten().count()
    }

    pub fn is_playing(&self) -> bool {
        !self.paused && self.active_voices() > 0
    }

    /// Mix one buffer into `out`, an interleaved buffer of `stride` channels,
    /// starting at sample `offset`.
    ///
    /// Volume and pitch ramp linearly from their values at the end of the last
    /// buffer to their current targets.
    pub fn fill(
        &mut self,
        out: &mut [f32],
        offset: usize,
        stride: usize,
        sample_length: f64,
        retired: &mut Producer<Signal>,
    ) {
        let frames = out.len() / stride;
        if frames == 0 {
            return;
        }
        let volume_incr = (self.volume - self.last_volume) / frames as f32;
        let pitch_incr = (self.pitch - self.last_pitch) / frames as f32;
        let mut volume = self.last_volume;
        let mut pitch = self.last_pitch;
        let mut peak = 0.0f32;

        if self.paused || self.active_voices() == 0 {
            for frame in out.chunks_exact_mut(stride) {
                frame[offset] = 0.0;
            }
        } else {
            for frame in out.chunks_exact_mut(stride) {
                volume += volume_incr;
                pitch += pitch_incr;
                let step = sample_length * pitch as f64;
                let mut acc = 0.0;
                for voice in self.voices.iter_mut().flatten() {
                    if voice.time <= voice.length {
                        acc += voice.signal.sample(voice.time);
                    }
                    voice.time += step;
                }
                let s = (acc * volume as f64) as f32;
                frame[offset] = s;
                peak = peak.max(s.abs());
            }
            for slot in self.voices.iter_mut() {
                if slot.as_ref().is_some_and(|v| v.time > v.length) {
                    if let Some(voice) = slot.take() {
                        retire(voice.signal, retired);
                    }
                }
            }
        }

        self.last_volume = self.volume;
        self.last_pitch = self.pitch;
        self.level = peak;
    }
}
