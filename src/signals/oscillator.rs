//! Periodic waveforms.
//!
//! [`Sine`], [`Square`], [`Saw`] and [`Triangle`] shape an inner phase signal
//! `x`, which defaults to `2π·hertz·t`. Swapping the phase signal gives
//! frequency sweeps ([`Sine::chirp`]) and frequency modulation ([`Sine::fm`])
//! without any extra state. [`Pwm`] is driven by frequency and duty cycle
//! directly so its edges land exactly on the duty boundary.
//!
//! Frequencies must be non-zero.

use core::f64::consts::{FRAC_2_PI, TAU};

use crate::signal::{Generator, Signal};
use crate::signals::{Product, Ramp, Sum, Time};

/// Phase signal `2π·hertz·t`.
fn phase(hertz: f64) -> Signal {
    Signal::new(Time) * (TAU * hertz)
}

/// Phase signal `2π·(initial + rate/2·t)·t`, whose instantaneous frequency is
/// `initial + rate·t`.
fn chirp_phase(initial: f64, rate: f64) -> Signal {
    let sweep = Signal::new(Ramp::new(initial, 0.5 * rate));
    Signal::new(Product::new(sweep, Time)) * TAU
}

/// Phase signal `2π·hertz·t + index·modulation(t)`.
fn fm_phase(hertz: f64, modulation: Signal, index: f64) -> Signal {
    Signal::new(Sum::new(phase(hertz), modulation * index))
}

macro_rules! oscillator {
    ($(#[$doc:meta])* $name:ident, |$x:ident| $shape:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name {
            pub x: Signal,
        }

        impl $name {
            /// A fixed frequency oscillator.
            pub fn new(hertz: f64) -> Self {
                Self { x: phase(hertz) }
            }

            /// Shape an arbitrary phase signal, in radians.
            pub fn with_phase(x: impl Into<Signal>) -> Self {
                Self { x: x.into() }
            }

            /// Linear frequency sweep starting at `initial` Hz, changing by
            /// `rate` Hz per second.
            pub fn chirp(initial: f64, rate: f64) -> Self {
                Self { x: chirp_phase(initial, rate) }
            }

            /// Frequency modulation of a `hertz` carrier by `modulation`,
            /// scaled by `index`.
            pub fn fm(hertz: f64, modulation: impl Into<Signal>, index: f64) -> Self {
                Self { x: fm_phase(hertz, modulation.into(), index) }
            }
        }

        impl Generator for $name {
            #[inline]
            fn sample(&self, t: f64) -> f64 {
                let $x = self.x.sample(t);
                $shape
            }

            fn visit_children(&self, visit: &mut dyn FnMut(&Signal)) {
                visit(&self.x);
            }
        }

        crate::signal_ops!($name);
    };
}

oscillator!(
    /// `sin(x)`
    Sine, |x| x.sin()
);

oscillator!(
    /// `+1` while `sin(x)` is positive, `-1` otherwise.
    Square, |x| if x.sin() > 0.0 { 1.0 } else { -1.0 }
);

oscillator!(
    /// Rising sawtooth, `-2/π·atan(cot(x/2))`.
    Saw, |x| -FRAC_2_PI * (1.0 / (x / 2.0).tan()).atan()
);

oscillator!(
    /// `2/π·asin(sin(x))`
    Triangle, |x| FRAC_2_PI * x.sin().asin()
);

/// Pulse-width modulated square wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pwm {
    pub frequency: f64,
    duty_cycle: f64,
}

impl Pwm {
    /// `duty_cycle` is the fraction of each period spent at `+1`, clamped to `[0, 1]`.
    pub fn new(frequency: f64, duty_cycle: f64) -> Self {
        Self {
            frequency,
            duty_cycle: duty_cycle.clamp(0.0, 1.0),
        }
    }

    pub fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }

    pub fn period(&self) -> f64 {
        1.0 / self.frequency
    }
}

impl Generator for Pwm {
    #[inline]
    fn sample(&self, t: f64) -> f64 {
        if (t % self.period()) * self.frequency < self.duty_cycle {
            1.0
        } else {
            -1.0
        }
    }
}

crate::signal_ops!(Pwm);
