//! Built-in generators.
//!
//! ## General ([`general`])
//! - [`Scalar`], [`Time`], [`Ramp`], [`Noise`], [`Samples`]
//! - [`Expression`] - formulas in `t` compiled at runtime
//!
//! ## Oscillators ([`oscillator`])
//! - [`Sine`], [`Square`], [`Saw`], [`Triangle`] over a phase signal
//! - [`Pwm`] with exact duty-cycle edges
//!
//! ## Envelopes ([`envelope`])
//! - [`Envelope`], [`KeyedEnvelope`], [`Asr`], [`Adsr`], [`ExponentialDecay`], [`SignalEnvelope`]
//!
//! ## Operators and processes
//! - [`Sum`], [`Product`] - what `+` and `*` on signals build
//! - [`Repeater`], [`Stretcher`], [`Reverser`]
//! - [`Sequence`] - timelines
//!
//! Every type here converts into a [`Signal`](crate::Signal) and supports the
//! same arithmetic operators.

pub mod envelope;
pub mod expression;
pub mod general;
pub mod operator;
pub mod oscillator;
pub mod process;
pub mod sequence;

pub use envelope::{Adsr, Asr, Envelope, ExponentialDecay, Key, KeyedEnvelope, SignalEnvelope};
pub use expression::Expression;
pub use general::{Noise, Ramp, Samples, Scalar, Time};
pub use operator::{Product, Sum};
pub use oscillator::{Pwm, Saw, Sine, Square, Triangle};
pub use process::{Repeater, Reverser, Stretcher};
pub use sequence::{Sequence, SequenceKey};
