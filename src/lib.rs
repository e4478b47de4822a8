//! Real-time synthesis of vibrotactile and audio cues.
//!
//! A cue is a [`Signal`]: a function of time built by composing generators
//! from [`signals`] with ordinary arithmetic. A [`Session`] plays signals on
//! the channels of a multi-channel output device, mixing up to
//! [`MAX_VOICES`] at a time per channel, and a [`Spatializer`] pans across
//! channels laid out in the plane.
//!
//! # Example
//!
//! ```no_run
//! use tactus::{Curve, Session};
//! use tactus::signals::{Adsr, Sine, Square};
//!
//! let mut session = Session::new();
//! session.open()?;
//!
//! // a 175 Hz carrier gated at 10 Hz, shaped by an ADSR envelope
//! let envelope = Adsr::with_curves(
//!     [0.05, 0.05, 0.3, 0.1],
//!     [1.0, 0.6],
//!     [Curve::QUADRATIC_OUT, Curve::LINEAR, Curve::SMOOTHSTEP],
//! );
//! let cue = Sine::new(175.0) * ((Square::new(10.0) + 1.0) * 0.5) * envelope;
//!
//! session.play_all(cue)?;
//! # Ok::<(), tactus::Error>(())
//! ```
//!
//! # Features
//!
//! - `cpal_backend` - play on real devices through cpal. Without it,
//!   [`Session::new`] uses an in-process [`backend::VirtualBackend`].
//! - `serde` - serialize [`Device`] and [`Point`].

pub mod backend;
pub mod curve;
pub mod device;
mod engine;
pub mod error;
pub mod session;
pub mod signal;
pub mod signals;
pub mod spatializer;

pub use curve::Curve;
pub use device::{Api, Device};
pub use engine::{MAX_VOICES, QUEUE_SIZE};
pub use error::{Error, Result};
pub use session::{DeviceSelector, OpenOptions, Session};
pub use signal::{Generator, Signal, INF};
pub use spatializer::{Point, Spatializer};
