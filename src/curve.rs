//! Named interpolation curves.
//!
//! A [`Curve`] maps a normalized position `t` in `[0, 1]` onto a shaped
//! position, usually also in `[0, 1]`. Curves drive the segments of a
//! [`KeyedEnvelope`](crate::signals::KeyedEnvelope) and the distance roll-off of
//! a [`Spatializer`](crate::Spatializer).
//!
//! Inputs outside `[0, 1]` are not clamped; callers that need clamped behavior
//! clamp before evaluating.
//!
//! ```
//! use tactus::Curve;
//!
//! let c = Curve::SMOOTHSTEP;
//! assert_eq!(c.eval(0.5), 0.5);
//! assert_eq!(c.lerp(10.0, 20.0, 1.0), 20.0);
//! assert_eq!(Curve::by_name("Cubic::In"), Some(Curve::CUBIC_IN));
//! ```

use core::f64::consts::{FRAC_PI_2, PI};
use core::fmt;

/// A named, stateless `t -> t'` shaping function.
///
/// Curves are plain values: copying one copies a name and a function pointer.
/// Custom curves can be built from any non-capturing function with
/// [`Curve::new`].
#[derive(Clone, Copy)]
pub struct Curve {
    name: &'static str,
    func: fn(f64) -> f64,
}

impl Curve {
    /// Wrap a shaping function under a display name.
    pub const fn new(name: &'static str, func: fn(f64) -> f64) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Evaluate the curve at `t`.
    #[inline]
    pub fn eval(&self, t: f64) -> f64 {
        (self.func)(t)
    }

    /// Interpolate between `a` and `b` with the curve applied to `t`.
    #[inline]
    pub fn lerp(&self, a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * self.eval(t)
    }

    /// Every built-in curve, in catalog order.
    pub fn catalog() -> &'static [Curve] {
        CATALOG
    }

    /// Look up a built-in curve by its name, e.g. `"Bounce::InOut"`.
    pub fn by_name(name: &str) -> Option<Curve> {
        CATALOG.iter().copied().find(|c| c.name == name)
    }
}

impl Default for Curve {
    fn default() -> Self {
        Curve::LINEAR
    }
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Curve").field(&self.name).finish()
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! catalog {
    ($($konst:ident => $name:literal, $func:path;)*) => {
        impl Curve {
            $(pub const $konst: Curve = Curve::new($name, $func);)*
        }

        const CATALOG: &[Curve] = &[$(Curve::$konst),*];
    };
}

catalog! {
    INSTANT => "Instant", instant;
    DELAYED => "Delayed", delayed;
    LINEAR => "Linear", linear;
    SMOOTHSTEP => "Smoothstep", smoothstep;
    SMOOTHERSTEP => "Smootherstep", smootherstep;
    SMOOTHESTSTEP => "Smootheststep", smootheststep;
    QUADRATIC_IN => "Quadratic::In", quadratic::ease_in;
    QUADRATIC_OUT => "Quadratic::Out", quadratic::ease_out;
    QUADRATIC_IN_OUT => "Quadratic::InOut", quadratic::ease_in_out;
    CUBIC_IN => "Cubic::In", cubic::ease_in;
    CUBIC_OUT => "Cubic::Out", cubic::ease_out;
    CUBIC_IN_OUT => "Cubic::InOut", cubic::ease_in_out;
    QUARTIC_IN => "Quartic::In", quartic::ease_in;
    QUARTIC_OUT => "Quartic::Out", quartic::ease_out;
    QUARTIC_IN_OUT => "Quartic::InOut", quartic::ease_in_out;
    QUINTIC_IN => "Quintic::In", quintic::ease_in;
    QUINTIC_OUT => "Quintic::Out", quintic::ease_out;
    QUINTIC_IN_OUT => "Quintic::InOut", quintic::ease_in_out;
    SINUSOIDAL_IN => "Sinusoidal::In", sinusoidal::ease_in;
    SINUSOIDAL_OUT => "Sinusoidal::Out", sinusoidal::ease_out;
    SINUSOIDAL_IN_OUT => "Sinusoidal::InOut", sinusoidal::ease_in_out;
    EXPONENTIAL_IN => "Exponential::In", exponential::ease_in;
    EXPONENTIAL_OUT => "Exponential::Out", exponential::ease_out;
    EXPONENTIAL_IN_OUT => "Exponential::InOut", exponential::ease_in_out;
    CIRCULAR_IN => "Circular::In", circular::ease_in;
    CIRCULAR_OUT => "Circular::Out", circular::ease_out;
    CIRCULAR_IN_OUT => "Circular::InOut", circular::ease_in_out;
    ELASTIC_IN => "Elastic::In", elastic::ease_in;
    ELASTIC_OUT => "Elastic::Out", elastic::ease_out;
    ELASTIC_IN_OUT => "Elastic::InOut", elastic::ease_in_out;
    BACK_IN => "Back::In", back::ease_in;
    BACK_OUT => "Back::Out", back::ease_out;
    BACK_IN_OUT => "Back::InOut", back::ease_in_out;
    BOUNCE_IN => "Bounce::In", bounce::ease_in;
    BOUNCE_OUT => "Bounce::Out", bounce::ease_out;
    BOUNCE_IN_OUT => "Bounce::InOut", bounce::ease_in_out;
}

fn instant(_t: f64) -> f64 {
    1.0
}

fn delayed(t: f64) -> f64 {
    if t < 1.0 {
        0.0
    } else {
        1.0
    }
}

fn linear(t: f64) -> f64 {
    t
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn smootherstep(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn smootheststep(t: f64) -> f64 {
    t * t * t * t * (t * (t * (t * -20.0 + 70.0) - 84.0) + 35.0)
}

/// Builds the In/Out/InOut trio for `t^n`.
macro_rules! polynomial {
    ($module:ident, $n:literal) => {
        mod $module {
            pub fn ease_in(t: f64) -> f64 {
                t.powi($n)
            }

            pub fn ease_out(t: f64) -> f64 {
                let u = t - 1.0;
                if $n % 2 == 0 {
                    1.0 - u.powi($n)
                } else {
                    u.powi($n) + 1.0
                }
            }

            pub fn ease_in_out(t: f64) -> f64 {
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * t.powi($n)
                } else {
                    let u = t - 2.0;
                    if $n % 2 == 0 {
                        -0.5 * (u.powi($n) - 2.0)
                    } else {
                        0.5 * (u.powi($n) + 2.0)
                    }
                }
            }
        }
    };
}

polynomial!(cubic, 3);
polynomial!(quartic, 4);
polynomial!(quintic, 5);

// Quadratic's second half is written in expanded form; it equals the
// polynomial rule but keeps the exact rounding of the classic tween.
mod quadratic {
    pub fn ease_in(t: f64) -> f64 {
        t * t
    }

    pub fn ease_out(t: f64) -> f64 {
        t * (2.0 - t)
    }

    pub fn ease_in_out(t: f64) -> f64 {
        let t = t * 2.0;
        if t < 1.0 {
            0.5 * t * t
        } else {
            let u = t - 1.0;
            -0.5 * (u * (u - 2.0) - 1.0)
        }
    }
}

mod sinusoidal {
    use super::{FRAC_PI_2, PI};

    pub fn ease_in(t: f64) -> f64 {
        1.0 - (t * FRAC_PI_2).cos()
    }

    pub fn ease_out(t: f64) -> f64 {
        (t * FRAC_PI_2).sin()
    }

    pub fn ease_in_out(t: f64) -> f64 {
        -0.5 * ((PI * t).cos() - 1.0)
    }
}

mod exponential {
    pub fn ease_in(t: f64) -> f64 {
        2f64.powf(10.0 * (t - 1.0))
    }

    pub fn ease_out(t: f64) -> f64 {
        1.0 - 2f64.powf(-10.0 * t)
    }

    pub fn ease_in_out(t: f64) -> f64 {
        let t = t * 2.0;
        if t < 1.0 {
            0.5 * 2f64.powf(10.0 * (t - 1.0))
        } else {
            0.5 * (2.0 - 2f64.powf(-10.0 * (t - 1.0)))
        }
    }
}

mod circular {
    pub fn ease_in(t: f64) -> f64 {
        1.0 - (1.0 - t * t).sqrt()
    }

    pub fn ease_out(t: f64) -> f64 {
        let u = t - 1.0;
        (1.0 - u * u).sqrt()
    }

    pub fn ease_in_out(t: f64) -> f64 {
        let t = t * 2.0;
        if t < 1.0 {
            -0.5 * ((1.0 - t * t).sqrt() - 1.0)
        } else {
            let u = t - 2.0;
            0.5 * ((1.0 - u * u).sqrt() + 1.0)
        }
    }
}

mod elastic {
    use super::PI;

    // period of 0.4 and a quarter-period phase shift
    fn wave(u: f64) -> f64 {
        ((u - 0.1) * (2.0 * PI) * 2.5).sin()
    }

    pub fn ease_in(t: f64) -> f64 {
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let u = t - 1.0;
        -(2f64.powf(10.0 * u)) * wave(u)
    }

    pub fn ease_out(t: f64) -> f64 {
        if t == 0.0 || t == 1.0 {
            return t;
        }
        2f64.powf(-10.0 * t) * wave(t) + 1.0
    }

    pub fn ease_in_out(t: f64) -> f64 {
        let u = t * 2.0 - 1.0;
        if u < 0.0 {
            -0.5 * 2f64.powf(10.0 * u) * wave(u)
        } else {
            2f64.powf(-10.0 * u) * wave(u) * 0.5 + 1.0
        }
    }
}

mod back {
    const S: f64 = 1.70158;
    const S2: f64 = 2.5949095;

    pub fn ease_in(t: f64) -> f64 {
        t * t * ((S + 1.0) * t - S)
    }

    pub fn ease_out(t: f64) -> f64 {
        let u = t - 1.0;
        u * u * ((S + 1.0) * u + S) + 1.0
    }

    pub fn ease_in_out(t: f64) -> f64 {
        let t = t * 2.0;
        if t < 1.0 {
            0.5 * (t * t * ((S2 + 1.0) * t - S2))
        } else {
            let u = t - 2.0;
            0.5 * (u * u * ((S2 + 1.0) * u + S2) + 2.0)
        }
    }
}

mod bounce {
    pub fn ease_out(t: f64) -> f64 {
        const K: f64 = 7.5625;
        const D: f64 = 2.75;
        if t < 1.0 / D {
            K * t * t
        } else if t < 2.0 / D {
            let u = t - 1.5 / D;
            K * u * u + 0.75
        } else if t < 2.5 / D {
            let u = t - 2.25 / D;
            K * u * u + 0.9375
        } else {
            let u = t - 2.625 / D;
            K * u * u + 0.984375
        }
    }

    pub fn ease_in(t: f64) -> f64 {
        1.0 - ease_out(1.0 - t)
    }

    pub fn ease_in_out(t: f64) -> f64 {
        if t < 0.5 {
            ease_in(t * 2.0) * 0.5
        } else {
            ease_out(t * 2.0 - 1.0) * 0.5 + 0.5
        }
    }
}
