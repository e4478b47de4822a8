//! Elementary generators: constants, time, ramps, noise and sample buffers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::signal::{Generator, INF};

/// A constant value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scalar {
    pub value: f64,
}

impl Scalar {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Generator for Scalar {
    #[inline]
    fn sample(&self, _t: f64) -> f64 {
        self.value
    }
}

/// The identity function of time. Oscillators use it as their phase source.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Time;

impl Generator for Time {
    #[inline]
    fn sample(&self, t: f64) -> f64 {
        t
    }
}

/// A straight line, `initial + rate * t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    pub initial: f64,
    pub rate: f64,
    length: f64,
}

impl Ramp {
    /// A ramp that never ends.
    pub fn new(initial: f64, rate: f64) -> Self {
        Self {
            initial,
            rate,
            length: INF,
        }
    }

    /// A ramp from `initial` to `last` over `duration` seconds.
    pub fn between(initial: f64, last: f64, duration: f64) -> Self {
        Self {
            initial,
            rate: (last - initial) / duration,
            length: duration,
        }
    }
}

impl Generator for Ramp {
    #[inline]
    fn sample(&self, t: f64) -> f64 {
        self.initial + self.rate * t
    }

    fn length(&self) -> f64 {
        self.length
    }
}

static NOISE_SEED: AtomicU64 = AtomicU64::new(0x5eed_0f_7ac7);

/// Uniform white noise in `[-1, 1)`.
///
/// Every call draws a fresh value. The generator state is a single atomic
/// counter, so sampling is wait-free from any thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct Noise;

impl Noise {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for Noise {
    fn sample(&self, _t: f64) -> f64 {
        // splitmix-style counter feeding a throwaway small RNG
        let seed = NOISE_SEED.fetch_add(0x9e37_79b9_7f4a_7c15, Ordering::Relaxed);
        let mut rng = SmallRng::seed_from_u64(seed);
        rng.gen_range(-1.0..1.0)
    }
}

/// Recorded samples played back with linear interpolation.
///
/// Silent outside the recording. The buffer is shared, so cloning is cheap.
#[derive(Clone, Debug)]
pub struct Samples {
    data: Arc<[f32]>,
    sample_rate: f64,
}

impl Samples {
    pub fn new(data: impl Into<Arc<[f32]>>, sample_rate: f64) -> Self {
        Self {
            data: data.into(),
            sample_rate,
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

impl Generator for Samples {
    fn sample(&self, t: f64) -> f64 {
        let n = self.data.len();
        if n == 0 || t < 0.0 {
            return 0.0;
        }
        let pos = t * self.sample_rate;
        let i = pos.floor() as usize;
        if i >= n {
            return 0.0;
        }
        let a = self.data[i] as f64;
        let b = self.data.get(i + 1).copied().unwrap_or(0.0) as f64;
        a + (b - a) * (pos - i as f64)
    }

    fn length(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate
    }
}

crate::signal_ops!(Scalar, Time, Ramp, Noise, Samples);
