//! The type-erased [`Signal`] value and the [`Generator`] trait behind it.

use core::any::{Any, TypeId};
use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::signals::{Product, Scalar, Sum};

/// Length reported by signals that never end.
pub const INF: f64 = f64::INFINITY;

static LIVE_SIGNALS: AtomicUsize = AtomicUsize::new(0);
static LIVE_MODELS: AtomicUsize = AtomicUsize::new(0);

/// Helper supertrait so generators can be downcast after erasure.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A pure function of time that can be erased into a [`Signal`].
///
/// Implement this trait to add your own waveform:
///
/// ```
/// use tactus::{Generator, Signal};
///
/// struct Click;
///
/// impl Generator for Click {
///     fn sample(&self, t: f64) -> f64 {
///         if t < 0.001 { 1.0 } else { 0.0 }
///     }
///
///     fn length(&self) -> f64 {
///         0.001
///     }
/// }
///
/// let click = Signal::new(Click);
/// assert_eq!(click.sample(0.0), 1.0);
/// assert!(click.is::<Click>());
/// ```
///
/// `sample` is called from the audio thread, so it must not block or allocate.
pub trait Generator: AsAny + Send + Sync {
    /// Raw amplitude at time `t` seconds, before gain and bias.
    fn sample(&self, t: f64) -> f64;

    /// Duration in seconds, [`INF`] for signals that never end.
    fn length(&self) -> f64 {
        INF
    }

    /// Short type name used by [`Signal::walk`] and debug output.
    fn name(&self) -> &'static str {
        let full = core::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Visit the child signals this generator owns, if any.
    fn visit_children(&self, _visit: &mut dyn FnMut(&Signal)) {}
}

/// Shared payload; counts live instances across the process.
struct Model<G: ?Sized> {
    generator: G,
}

impl<G> Model<G> {
    fn new(generator: G) -> Self {
        LIVE_MODELS.fetch_add(1, Ordering::Relaxed);
        Self { generator }
    }
}

impl<G: ?Sized> Drop for Model<G> {
    fn drop(&mut self) {
        LIVE_MODELS.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A type-erased, cheaply clonable function of time.
///
/// The generator payload is immutable and shared between clones; `gain` and
/// `bias` belong to each handle. Sampling returns `bias + gain * raw(t)`.
///
/// ```
/// use tactus::Signal;
/// use tactus::signals::{Sine, Asr};
///
/// let cue = Sine::new(175.0) * Asr::new(0.1, 0.1, 0.1, 1.0);
/// assert!((cue.length() - 0.3).abs() < 1e-12);
/// assert_eq!(cue.sample(0.0), 0.0);
/// ```
pub struct Signal {
    pub gain: f64,
    pub bias: f64,
    model: Arc<Model<dyn Generator>>,
}

impl Signal {
    /// Erase a generator into a signal with unit gain and zero bias.
    pub fn new<G: Generator>(generator: G) -> Self {
        let model: Arc<Model<dyn Generator>> = Arc::new(Model::new(generator));
        LIVE_SIGNALS.fetch_add(1, Ordering::Relaxed);
        Self {
            gain: 1.0,
            bias: 0.0,
            model,
        }
    }

    #[inline]
    pub fn sample(&self, t: f64) -> f64 {
        self.bias + self.gain * self.model.generator.sample(t)
    }

    /// Sample at every time in `times`, writing into `out`.
    pub fn sample_into(&self, times: &[f64], out: &mut [f64]) {
        for (o, &t) in out.iter_mut().zip(times) {
            *o = self.sample(t);
        }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.model.generator.length()
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Type of the erased generator.
    pub fn type_id(&self) -> TypeId {
        Any::type_id(self.model.generator.as_any())
    }

    pub fn type_name(&self) -> &'static str {
        self.model.generator.name()
    }

    pub fn is<G: Generator>(&self) -> bool {
        self.model.generator.as_any().is::<G>()
    }

    /// Borrow the erased generator as `G`, if that is what it holds.
    pub fn get_as<G: Generator>(&self) -> Option<&G> {
        self.model.generator.as_any().downcast_ref::<G>()
    }

    /// Borrow the erased generator.
    pub fn get(&self) -> &dyn Generator {
        &self.model.generator
    }

    /// True when both handles share the same payload.
    pub fn ptr_eq(&self, other: &Signal) -> bool {
        Arc::ptr_eq(&self.model, &other.model)
    }

    /// Depth-first walk over this signal and every signal it owns.
    ///
    /// The visitor receives each signal together with its depth, the root
    /// being depth 0.
    pub fn walk(&self, visit: &mut dyn FnMut(&Signal, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at(&self, depth: usize, visit: &mut dyn FnMut(&Signal, usize)) {
        visit(self, depth);
        self.model
            .generator
            .visit_children(&mut |child| child.walk_at(depth + 1, visit));
    }

    /// Number of live `Signal` handles in the process.
    pub fn count() -> usize {
        LIVE_SIGNALS.load(Ordering::Relaxed)
    }

    /// Number of live generator payloads in the process.
    pub fn model_count() -> usize {
        LIVE_MODELS.load(Ordering::Relaxed)
    }
}

impl Clone for Signal {
    fn clone(&self) -> Self {
        LIVE_SIGNALS.fetch_add(1, Ordering::Relaxed);
        Self {
            gain: self.gain,
            bias: self.bias,
            model: Arc::clone(&self.model),
        }
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        LIVE_SIGNALS.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Default for Signal {
    /// Silence that lasts forever.
    fn default() -> Self {
        Signal::new(Scalar::new(0.0))
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("type", &self.type_name())
            .field("gain", &self.gain)
            .field("bias", &self.bias)
            .field("length", &self.length())
            .finish()
    }
}

impl<G: Generator> From<G> for Signal {
    fn from(generator: G) -> Self {
        Signal::new(generator)
    }
}

impl From<f64> for Signal {
    fn from(value: f64) -> Self {
        Signal::new(Scalar::new(value))
    }
}

// Signal (op) Signal

impl Mul for Signal {
    type Output = Signal;

    fn mul(self, rhs: Signal) -> Signal {
        Signal::new(Product::new(self, rhs))
    }
}

impl Add for Signal {
    type Output = Signal;

    fn add(self, rhs: Signal) -> Signal {
        Signal::new(Sum::new(self, rhs))
    }
}

impl Sub for Signal {
    type Output = Signal;

    fn sub(self, rhs: Signal) -> Signal {
        self + (-rhs)
    }
}

impl Neg for Signal {
    type Output = Signal;

    fn neg(mut self) -> Signal {
        self.gain = -self.gain;
        self.bias = -self.bias;
        self
    }
}

// Signal (op) Generator

impl<G: Generator> Mul<G> for Signal {
    type Output = Signal;

    fn mul(self, rhs: G) -> Signal {
        self * Signal::new(rhs)
    }
}

impl<G: Generator> Add<G> for Signal {
    type Output = Signal;

    fn add(self, rhs: G) -> Signal {
        self + Signal::new(rhs)
    }
}

impl<G: Generator> Sub<G> for Signal {
    type Output = Signal;

    fn sub(self, rhs: G) -> Signal {
        self - Signal::new(rhs)
    }
}

// Signal (op) scalar

impl Mul<f64> for Signal {
    type Output = Signal;

    fn mul(mut self, k: f64) -> Signal {
        self.gain *= k;
        self.bias *= k;
        self
    }
}

impl Add<f64> for Signal {
    type Output = Signal;

    fn add(mut self, k: f64) -> Signal {
        self.bias += k;
        self
    }
}

impl Sub<f64> for Signal {
    type Output = Signal;

    fn sub(mut self, k: f64) -> Signal {
        self.bias -= k;
        self
    }
}

impl Mul<Signal> for f64 {
    type Output = Signal;

    fn mul(self, rhs: Signal) -> Signal {
        rhs * self
    }
}

impl Add<Signal> for f64 {
    type Output = Signal;

    fn add(self, rhs: Signal) -> Signal {
        rhs + self
    }
}

impl Sub<Signal> for f64 {
    type Output = Signal;

    fn sub(self, rhs: Signal) -> Signal {
        -rhs + self
    }
}

/// Gives a concrete generator type the same operator set as [`Signal`].
#[macro_export]
macro_rules! signal_ops {
    ($($ty:ty),* $(,)?) => {$(
        impl ::core::ops::Mul<$crate::Signal> for $ty {
            type Output = $crate::Signal;
            fn mul(self, rhs: $crate::Signal) -> $crate::Signal {
                $crate::Signal::new(self) * rhs
            }
        }

        impl<R: $crate::Generator> ::core::ops::Mul<R> for $ty {
            type Output = $crate::Signal;
            fn mul(self, rhs: R) -> $crate::Signal {
                $crate::Signal::new(self) * $crate::Signal::new(rhs)
            }
        }

        impl ::core::ops::Mul<f64> for $ty {
            type Output = $crate::Signal;
            fn mul(self, k: f64) -> $crate::Signal {
                $crate::Signal::new(self) * k
            }
        }

        impl ::core::ops::Mul<$ty> for f64 {
            type Output = $crate::Signal;
            fn mul(self, rhs: $ty) -> $crate::Signal {
                $crate::Signal::new(rhs) * self
            }
        }

        impl ::core::ops::Add<$crate::Signal> for $ty {
            type Output = $crate::Signal;
            fn add(self, rhs: $crate::Signal) -> $crate::Signal {
                $crate::Signal::new(self) + rhs
            }
        }

        impl<R: $crate::Generator> ::core::ops::Add<R> for $ty {
            type Output = $crate::Signal;
            fn add(self, rhs: R) -> $crate::Signal {
                $crate::Signal::new(self) + $crate::Signal::new(rhs)
            }
        }

        impl ::core::ops::Add<f64> for $ty {
            type Output = $crate::Signal;
            fn add(self, k: f64) -> $crate::Signal {
                $crate::Signal::new(self) + k
            }
        }

        impl ::core::ops::Add<$ty> for f64 {
            type Output = $crate::Signal;
            fn add(self, rhs: $ty) -> $crate::Signal {
                $crate::Signal::new(rhs) + self
            }
        }

        impl ::core::ops::Sub<$crate::Signal> for $ty {
            type Output = $crate::Signal;
            fn sub(self, rhs: $crate::Signal) -> $crate::Signal {
                $crate::Signal::new(self) - rhs
            }
        }

        impl<R: $crate::Generator> ::core::ops::Sub<R> for $ty {
            type Output = $crate::Signal;
            fn sub(self, rhs: R) -> $crate::Signal {
                $crate::Signal::new(self) - $crate::Signal::new(rhs)
            }
        }

        impl ::core::ops::Sub<f64> for $ty {
            type Output = $crate::Signal;
            fn sub(self, k: f64) -> $crate::Signal {
                $crate::Signal::new(self) - k
            }
        }

        impl ::core::ops::Sub<$ty> for f64 {
            type Output = $crate::Signal;
            fn sub(self, rhs: $ty) -> $crate::Signal {
                self - $crate::Signal::new(rhs)
            }
        }

        impl ::core::ops::Neg for $ty {
            type Output = $crate::Signal;
            fn neg(self) -> $crate::Signal {
                -$crate::Signal::new(self)
            }
        }
    )*};
}
