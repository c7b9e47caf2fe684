//! The built-in scalar fields $f: \mathbb{R}^2 \to \mathbb{R}$.
//!
//! All of them are pure functions and can be evaluated concurrently from any number of ranks.

use crate::core::Integrand;
use crate::error::Error;
use num_traits::{Float, FloatConst, NumCast};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

fn constant<T: Float>(value: f64) -> T {
    <T as NumCast>::from(value).unwrap_or_else(T::nan)
}

/// The [Rosenbrock function] $f(x, y) = (1 - x)^2 + 100 (y - x^2)^2$.
///
/// [Rosenbrock function]: https://en.wikipedia.org/wiki/Rosenbrock_function
pub fn rosenbrock<T: Float>(x: T, y: T) -> T {
    (T::one() - x).powi(2) + constant::<T>(100.0) * (y - x * x).powi(2)
}

/// The two-dimensional [Ricker wavelet] ("Mexican hat")
/// $f(x, y) = (1 - 2 \pi^2 r^2) e^{-\pi^2 r^2}$ with $r^2 = x^2 + y^2$.
///
/// [Ricker wavelet]: https://en.wikipedia.org/wiki/Ricker_wavelet
pub fn ricker_wavelet<T: Float + FloatConst>(x: T, y: T) -> T {
    let pi_sq_r_sq = T::PI() * T::PI() * (x * x + y * y);
    (T::one() - pi_sq_r_sq - pi_sq_r_sq) * (-pi_sq_r_sq).exp()
}

/// The two-dimensional [Schwefel function]
/// $f(x, y) = 418.9829 \cdot 2 - x \sin \sqrt{|x|} - y \sin \sqrt{|y|}$.
///
/// [Schwefel function]: https://www.sfu.ca/~ssurjano/schwef.html
pub fn schwefel<T: Float>(x: T, y: T) -> T {
    constant::<T>(418.9829 * 2.0) - (x * x.abs().sqrt().sin() + y * y.abs().sqrt().sin())
}

/// Registry of the built-in fields, selectable by name.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// See [`rosenbrock`].
    Rosenbrock,
    /// See [`ricker_wavelet`].
    RickerWavelet,
    /// See [`schwefel`].
    Schwefel,
}

impl Field {
    /// All built-in fields.
    pub const ALL: [Self; 3] = [Self::Rosenbrock, Self::RickerWavelet, Self::Schwefel];

    /// Returns the name under which the field is selected.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rosenbrock => "rosenbrock",
            Self::RickerWavelet => "ricker_wavelet",
            Self::Schwefel => "schwefel",
        }
    }

    /// Evaluate the field at $(x, y)$.
    pub fn eval<T: Float + FloatConst>(self, x: T, y: T) -> T {
        match self {
            Self::Rosenbrock => rosenbrock(x, y),
            Self::RickerWavelet => ricker_wavelet(x, y),
            Self::Schwefel => schwefel(x, y),
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

impl<T: Float + FloatConst + Send + Sync> Integrand<T> for Field {
    fn call(&self, x: T, y: T) -> T {
        self.eval(x, y)
    }
}
