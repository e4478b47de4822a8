//! Runtime-compiled math expressions of `t`.

use core::f64::consts::PI;
use core::fmt;

use exmex::{Express, FlatEx};

use crate::error::{Error, Result};
use crate::signal::Generator;

const DEFAULT_EXPRESSION: &str = "sin(2*pi*100*t)";

/// Variables an expression may refer to.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Var {
    T,
    Pi,
}

/// Narrow wrapper around the expression parser: compile once, evaluate often.
#[derive(Clone)]
struct Compiled {
    flat: FlatEx<f64>,
    vars: [Option<Var>; 2],
}

impl Compiled {
    fn compile(text: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidExpression {
            text: text.to_owned(),
            reason,
        };
        let flat = exmex::parse::<f64>(text).map_err(|e| invalid(e.to_string()))?;
        let mut vars = [None; 2];
        for (slot, name) in flat.var_names().iter().enumerate() {
            let var = match name.as_str() {
                "t" => Var::T,
                "pi" => Var::Pi,
                other => return Err(invalid(format!("unknown variable `{other}`"))),
            };
            // only two distinct names are accepted, so at most two slots
            vars[slot] = Some(var);
        }
        Ok(Self { flat, vars })
    }

    fn evaluate(&self, t: f64) -> f64 {
        let mut args = [0.0; 2];
        let mut n = 0;
        for var in self.vars.iter().flatten() {
            args[n] = match var {
                Var::T => t,
                Var::Pi => PI,
            };
            n += 1;
        }
        // evaluation errors become silence rather than faults on the audio thread
        self.flat.eval(&args[..n]).unwrap_or(0.0)
    }
}

/// A signal defined by a text formula in `t`, such as `"sin(2*pi*175*t) * exp(-t)"`.
///
/// Standard functions (`sin`, `cos`, `exp`, `abs`, ...) and `pi` are available.
#[derive(Clone)]
pub struct Expression {
    text: String,
    compiled: Compiled,
}

impl Expression {
    pub fn new(text: &str) -> Result<Self> {
        let compiled = Compiled::compile(text)?;
        Ok(Self {
            text: text.to_owned(),
            compiled,
        })
    }

    /// Replace the formula. On a parse error the previous formula is kept.
    pub fn set_expression(&mut self, text: &str) -> Result<()> {
        self.compiled = Compiled::compile(text)?;
        self.text = text.to_owned();
        Ok(())
    }

    pub fn expression(&self) -> &str {
        &self.text
    }
}

impl Default for Expression {
    fn default() -> Self {
        let compiled = Compiled::compile(DEFAULT_EXPRESSION);
        match compiled {
            Ok(compiled) => Self {
                text: DEFAULT_EXPRESSION.to_owned(),
                compiled,
            },
            Err(e) => unreachable!("default expression failed to compile: {e}"),
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.text).finish()
    }
}

impl Generator for Expression {
    fn sample(&self, t: f64) -> f64 {
        self.compiled.evaluate(t)
    }
}

crate::signal_ops!(Expression);
