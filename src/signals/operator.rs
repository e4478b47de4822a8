//! Binary operators over signals.

use crate::signal::{Generator, Signal};

/// `lhs + rhs`. Lasts as long as the longer operand.
#[derive(Clone, Debug)]
pub struct Sum {
    pub lhs: Signal,
    pub rhs: Signal,
}

impl Sum {
    pub fn new(lhs: impl Into<Signal>, rhs: impl Into<Signal>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }
}

impl Generator for Sum {
    #[inline]
    fn sample(&self, t: f64) -> f64 {
        self.lhs.sample(t) + self.rhs.sample(t)
    }

    fn length(&self) -> f64 {
        self.lhs.length().max(self.rhs.length())
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&Signal)) {
        visit(&self.lhs);
        visit(&self.rhs);
    }
}

/// `lhs * rhs`. Ends with the shorter operand, so an envelope gates its carrier.
#[derive(Clone, Debug)]
pub struct Product {
    pub lhs: Signal,
    pub rhs: Signal,
}

impl Product {
    pub fn new(lhs: impl Into<Signal>, rhs: impl Into<Signal>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }
}

impl Generator for Product {
    #[inline]
    fn sample(&self, t: f64) -> f64 {
        self.lhs.sample(t) * self.rhs.sample(t)
    }

    fn length(&self) -> f64 {
        self.lhs.length().min(self.rhs.length())
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&Signal)) {
        visit(&self.lhs);
        visit(&self.rhs);
    }
}

crate::signal_ops!(Sum, Product);
