//! Time-domain processes that rearrange another signal.

use crate::signal::{Generator, Signal};

/// Longest time [`Reverser`] will look back into an endless signal.
const REVERSE_HORIZON: f64 = 1.0e9;

/// Plays a signal `repetitions` times, with `delay` seconds of silence between.
#[derive(Clone, Debug)]
pub struct Repeater {
    pub signal: Signal,
    pub repetitions: u32,
    pub delay: f64,
}

impl Repeater {
    pub fn new(signal: impl Into<Signal>, repetitions: u32, delay: f64) -> Self {
        Self {
            signal: signal.into(),
            repetitions,
            delay,
        }
    }
}

impl Generator for Repeater {
    fn sample(&self, t: f64) -> f64 {
        if t < 0.0 || t > self.length() {
            return 0.0;
        }
        let inner = self.signal.length();
        let offset = t % (inner + self.delay);
        if offset <= inner {
            self.signal.sample(offset)
        } else {
            0.0
        }
    }

    fn length(&self) -> f64 {
        if self.repetitions == 0 {
            return 0.0;
        }
        let n = self.repetitions as f64;
        self.signal.length() * n + self.delay * (n - 1.0)
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&Signal)) {
        visit(&self.signal);
    }
}

/// Slows a signal down (`factor > 1`) or speeds it up (`factor < 1`).
#[derive(Clone, Debug)]
pub struct Stretcher {
    pub signal: Signal,
    pub factor: f64,
}

impl Stretcher {
    pub fn new(signal: impl Into<Signal>, factor: f64) -> Self {
        Self {
            signal: signal.into(),
            factor,
        }
    }
}

impl Generator for Stretcher {
    fn sample(&self, t: f64) -> f64 {
        self.signal.sample(t / self.factor)
    }

    fn length(&self) -> f64 {
        self.signal.length() * self.factor
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&Signal)) {
        visit(&self.signal);
    }
}

/// Plays a signal backwards from its end.
#[derive(Clone, Debug)]
pub struct Reverser {
    pub signal: Signal,
}

impl Reverser {
    pub fn new(signal: impl Into<Signal>) -> Self {
        Self {
            signal: signal.into(),
        }
    }
}

impl Generator for Reverser {
    fn sample(&self, t: f64) -> f64 {
        let end = self.signal.length().min(REVERSE_HORIZON);
        self.signal.sample((end - t).clamp(0.0, REVERSE_HORIZON))
    }

    fn length(&self) -> f64 {
        self.signal.length()
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&Signal)) {
        visit(&self.signal);
    }
}

crate::signal_ops!(Repeater, Stretcher, Reverser);
