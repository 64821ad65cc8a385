//! Values with a standard error.
//!
//! The analysis summary reports every fitted parameter as a nominal value with
//! a companion error entry. Arithmetic treats the operands as independent, so
//! errors combine in quadrature. Only addition, subtraction and scaling are
//! needed to reconstruct eclipse timings.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A nominal value and its (non-negative) standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub error: f64,
}

impl Measurement {
    /// Build a measurement; the error is stored as an absolute value.
    pub fn new(value: f64, error: f64) -> Self {
        Self {
            value,
            error: error.abs(),
        }
    }

    pub fn exact(value: f64) -> Self {
        Self { value, error: 0.0 }
    }

    /// Multiply by an exact factor.
    pub fn scale(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            error: self.error * factor.abs(),
        }
    }
}

impl Add for Measurement {
    type Output = Measurement;

    fn add(self, rhs: Measurement) -> Measurement {
        Measurement {
            value: self.value + rhs.value,
            error: self.error.hypot(rhs.error),
        }
    }
}

impl Sub for Measurement {
    type Output = Measurement;

    fn sub(self, rhs: Measurement) -> Measurement {
        Measurement {
            value: self.value - rhs.value,
            error: self.error.hypot(rhs.error),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.p$}+/-{:.p$}", self.value, self.error, p = p),
            None => write!(f, "{}+/-{}", self.value, self.error),
        }
    }
}
