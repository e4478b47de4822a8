//! Timelines of signals.

use crate::signal::{Generator, Signal};

/// A signal placed at an offset inside a [`Sequence`].
#[derive(Clone, Debug)]
pub struct SequenceKey {
    pub t: f64,
    pub signal: Signal,
}

/// Places signals on a timeline.
///
/// Overlapping signals are mixed additively. [`push`](Self::push) appends at
/// the head cursor and moves the head past the pushed signal;
/// [`insert`](Self::insert) places a signal at an explicit time and leaves the
/// head alone. A negative [`advance`](Self::advance) lets the next push
/// overlap the previous one.
///
/// ```
/// use tactus::signals::{Envelope, Sequence};
///
/// let mut seq = Sequence::new();
/// seq.push(Envelope::new(0.2, 1.0)).advance(0.1).push(Envelope::new(0.2, 0.5));
/// assert!((seq.length() - 0.5).abs() < 1e-12);
/// assert_eq!(seq.sample(0.25), 0.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    keys: Vec<SequenceKey>,
    head: f64,
    length: f64,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `signal` at the head, then move the head to its end.
    pub fn push(&mut self, signal: impl Into<Signal>) -> &mut Self {
        let signal = signal.into();
        let len = signal.length();
        let at = self.head;
        self.insert(signal, at);
        self.head += len;
        self
    }

    /// Place `signal` at time `t` without moving the head.
    pub fn insert(&mut self, signal: impl Into<Signal>, t: f64) -> &mut Self {
        let signal = signal.into();
        self.length = self.length.max(t + signal.length());
        self.keys.push(SequenceKey { t, signal });
        self
    }

    /// Move the head by `dt` seconds. Negative values create overlap.
    pub fn advance(&mut self, dt: f64) -> &mut Self {
        self.head += dt;
        self
    }

    pub fn set_head(&mut self, head: f64) -> &mut Self {
        self.head = head;
        self
    }

    pub fn head(&self) -> f64 {
        self.head
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.head = 0.0;
        self.length = 0.0;
    }

    pub fn keys(&self) -> &[SequenceKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn sample(&self, t: f64) -> f64 {
        Generator::sample(self, t)
    }

    pub fn length(&self) -> f64 {
        self.length
    }
}

impl Generator for Sequence {
    fn sample(&self, t: f64) -> f64 {
        self.keys
            .iter()
            .filter(|k| t >= k.t && t < k.t + k.signal.length())
            .map(|k| k.signal.sample(t - k.t))
            .sum()
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&Signal)) {
        for key in &self.keys {
            visit(&key.signal);
        }
    }
}

crate::signal_ops!(Sequence);
