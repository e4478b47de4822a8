//! Amplitude envelopes.
//!
//! Envelopes are signals that fall silent past their length, so multiplying
//! one with an endless carrier yields a finite cue.

use delegate::delegate;

use crate::curve::Curve;
use crate::signal::{Generator, Signal};

/// Constant amplitude for a fixed duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub duration: f64,
    pub amplitude: f64,
}

impl Envelope {
    pub fn new(duration: f64, amplitude: f64) -> Self {
        Self {
            duration,
            amplitude,
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(0.1, 1.0)
    }
}

impl Generator for Envelope {
    fn sample(&self, t: f64) -> f64 {
        if t > self.duration {
            0.0
        } else {
            self.amplitude
        }
    }

    fn length(&self) -> f64 {
        self.duration
    }
}

/// A point of a [`KeyedEnvelope`]. The curve shapes the segment that ends here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Key {
    pub time: f64,
    pub amplitude: f64,
    pub curve: Curve,
}

/// Piecewise envelope through time-ordered keys.
///
/// Always starts with a key at `t = 0`. Between two keys the amplitude follows
/// the later key's curve; past the last key the envelope is silent.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyedEnvelope {
    keys: Vec<Key>,
}

impl KeyedEnvelope {
    pub fn new(amplitude0: f64) -> Self {
        Self {
            keys: vec![Key {
                time: 0.0,
                amplitude: amplitude0,
                curve: Curve::INSTANT,
            }],
        }
    }

    /// Insert a key, replacing any key already at `time`.
    pub fn add_key(&mut self, time: f64, amplitude: f64, curve: Curve) {
        let key = Key {
            time,
            amplitude,
            curve,
        };
        match self.keys.binary_search_by(|k| k.time.total_cmp(&time)) {
            Ok(i) => self.keys[i] = key,
            Err(i) => self.keys.insert(i, key),
        }
    }

    pub fn with_key(mut self, time: f64, amplitude: f64, curve: Curve) -> Self {
        self.add_key(time, amplitude, curve);
        self
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl Default for KeyedEnvelope {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Generator for KeyedEnvelope {
    fn sample(&self, t: f64) -> f64 {
        if t < 0.0 || t > self.length() {
            return 0.0;
        }
        // first key at or after t; exists because t <= last key time
        let i = self.keys.partition_point(|k| k.time < t);
        let next = &self.keys[i];
        if next.time == t || i == 0 {
            return next.amplitude;
        }
        let prev = &self.keys[i - 1];
        let u = (t - prev.time) / (next.time - prev.time);
        next.curve.lerp(prev.amplitude, next.amplitude, u)
    }

    fn length(&self) -> f64 {
        self.keys.last().map_or(0.0, |k| k.time)
    }
}

/// Attack, sustain, release.
#[derive(Clone, Debug, PartialEq)]
pub struct Asr(KeyedEnvelope);

impl Asr {
    /// Linear attack and release.
    pub fn new(attack: f64, sustain: f64, release: f64, amplitude: f64) -> Self {
        Self::with_curves(attack, sustain, release, amplitude, Curve::LINEAR, Curve::LINEAR)
    }

    pub fn with_curves(
        attack: f64,
        sustain: f64,
        release: f64,
        amplitude: f64,
        attack_curve: Curve,
        release_curve: Curve,
    ) -> Self {
        let env = KeyedEnvelope::new(0.0)
            .with_key(attack, amplitude, attack_curve)
            .with_key(attack + sustain, amplitude, Curve::INSTANT)
            .with_key(attack + sustain + release, 0.0, release_curve);
        Self(env)
    }

    delegate! {
        to self.0 {
            pub fn keys(&self) -> &[Key];
        }
    }
}

impl Default for Asr {
    fn default() -> Self {
        Self::new(0.025, 0.05, 0.025, 1.0)
    }
}

impl Generator for Asr {
    delegate! {
        to self.0 {
            fn sample(&self, t: f64) -> f64;
            fn length(&self) -> f64;
        }
    }
}

/// Attack, decay, sustain, release.
#[derive(Clone, Debug, PartialEq)]
pub struct Adsr(KeyedEnvelope);

impl Adsr {
    /// Linear segments; attacks to `peak`, then decays to and sustains at `level`.
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64, peak: f64, level: f64) -> Self {
        Self::with_curves(
            [attack, decay, sustain, release],
            [peak, level],
            [Curve::LINEAR, Curve::LINEAR, Curve::LINEAR],
        )
    }

    /// `times` are attack, decay, sustain and release durations, `amplitudes`
    /// the peak and sustain levels, `curves` the attack, decay and release shapes.
    pub fn with_curves(times: [f64; 4], amplitudes: [f64; 2], curves: [Curve; 3]) -> Self {
        let [attack, decay, sustain, release] = times;
        let [peak, level] = amplitudes;
        let [attack_curve, decay_curve, release_curve] = curves;
        let env = KeyedEnvelope::new(0.0)
            .with_key(attack, peak, attack_curve)
            .with_key(attack + decay, level, decay_curve)
            .with_key(attack + decay + sustain, level, Curve::INSTANT)
            .with_key(attack + decay + sustain + release, 0.0, release_curve);
        Self(env)
    }

    delegate! {
        to self.0 {
            pub fn keys(&self) -> &[Key];
        }
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new(0.025, 0.025, 0.05, 0.025, 1.0, 0.5)
    }
}

impl Generator for Adsr {
    delegate! {
        to self.0 {
            fn sample(&self, t: f64) -> f64;
            fn length(&self) -> f64;
        }
    }
}

/// `amplitude·e^(-decay·t)`, cut off once it falls below 0.001.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialDecay {
    pub amplitude: f64,
    pub decay: f64,
}

impl ExponentialDecay {
    pub fn new(amplitude: f64, decay: f64) -> Self {
        Self { amplitude, decay }
    }
}

impl Default for ExponentialDecay {
    fn default() -> Self {
        Self::new(1.0, 6.907)
    }
}

impl Generator for ExponentialDecay {
    fn sample(&self, t: f64) -> f64 {
        if t > self.length() {
            return 0.0;
        }
        self.amplitude * (-self.decay * t).exp()
    }

    fn length(&self) -> f64 {
        -(0.001 / self.amplitude).ln() / self.decay
    }
}

/// Uses a bipolar signal as an envelope: `[-1, 1]` maps onto `[0, amplitude]`.
#[derive(Clone, Debug)]
pub struct SignalEnvelope {
    pub signal: Signal,
    pub duration: f64,
    pub amplitude: f64,
}

impl SignalEnvelope {
    pub fn new(signal: impl Into<Signal>, duration: f64, amplitude: f64) -> Self {
        Self {
            signal: signal.into(),
            duration,
            amplitude,
        }
    }
}

impl Generator for SignalEnvelope {
    fn sample(&self, t: f64) -> f64 {
        if t > self.duration {
            return 0.0;
        }
        (self.signal.sample(t) + 1.0) * 0.5 * self.amplitude
    }

    fn length(&self) -> f64 {
        self.duration
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&Signal)) {
        visit(&self.signal);
    }
}

crate::signal_ops!(Envelope, KeyedEnvelope, Asr, Adsr, ExponentialDecay, SignalEnvelope);
