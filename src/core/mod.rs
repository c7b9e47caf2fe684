//! The core module
pub mod estimators;

use crate::error::{Error, Result};
use num_traits::{Float, FromPrimitive};
use serde::{Deserialize, Serialize};

/// The rank that holds the final result of every parallel integration.
pub const ROOT: usize = 0;

/// Integrand trait
pub trait Integrand<T>: Send + Sync {
    /// Evaluate the integrand at the point $(x, y)$.
    fn call(&self, x: T, y: T) -> T;
}

impl<T, F> Integrand<T> for F
where
    F: Fn(T, T) -> T + Send + Sync,
{
    fn call(&self, x: T, y: T) -> T {
        self(x, y)
    }
}

/// The rectangle $[a_x, b_x] \times [a_y, b_y]$ together with the resolution `n`.
///
/// For the trapezoid rule `n` is the number of subdivisions along each axis, for Monte Carlo
/// integration it is the number of samples. The bounds are taken as they are: nothing here
/// checks that `ax < bx`, `ay < by` or `n > 0`, and a domain violating these assumptions simply
/// produces a meaningless (negative, infinite or NaN) result.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Domain<T> {
    /// Lower bound in $x$.
    pub ax: T,
    /// Upper bound in $x$.
    pub bx: T,
    /// Lower bound in $y$.
    pub ay: T,
    /// Upper bound in $y$.
    pub by: T,
    /// Number of subdivisions per axis or number of samples.
    pub n: usize,
}

impl<T: Float + FromPrimitive> Domain<T> {
    /// Constructor.
    pub const fn new(ax: T, bx: T, ay: T, by: T, n: usize) -> Self {
        Self { ax, bx, ay, by, n }
    }

    /// Returns $b_x - a_x$.
    pub fn width(&self) -> T {
        self.bx - self.ax
    }

    /// Returns $b_y - a_y$.
    pub fn height(&self) -> T {
        self.by - self.ay
    }

    /// Returns the area of the rectangle.
    pub fn area(&self) -> T {
        self.width() * self.height()
    }

    /// Returns the grid steps $(h_x, h_y)$ of an `n` by `n` grid spanning the rectangle.
    pub fn steps(&self) -> (T, T) {
        let n = from_usize::<T>(self.n);
        (self.width() / n, self.height() / n)
    }

    /// Returns `true` if both intervals are non-empty and `n` is positive.
    ///
    /// The integrators never call this; it is meant for callers that want to reject input
    /// before integrating.
    pub fn is_well_formed(&self) -> bool {
        self.ax < self.bx && self.ay < self.by && self.n > 0
    }
}

/// Converts a count into the numeric type `T`.
///
/// Every float type can represent a `usize` at least approximately, so the NaN fallback is never
/// hit for `f32` or `f64`.
pub(crate) fn from_usize<T: Float + FromPrimitive>(n: usize) -> T {
    T::from_usize(n).unwrap_or_else(T::nan)
}

/// Converts a value of the integration into the representation used on the wire.
pub(crate) fn to_wire<T: Float>(value: T) -> Result<f64> {
    value.to_f64().ok_or(Error::Conversion)
}

/// Converts a value received from the wire into the numeric type of the integration.
pub(crate) fn from_wire<T: Float + FromPrimitive>(value: f64) -> Result<T> {
    T::from_f64(value).ok_or(Error::Conversion)
}

/// Returns the number of samples rank `rank` out of `size` ranks evaluates when `total` samples
/// are shared among all of them.
///
/// Every rank gets `total / size` samples and the first `total % size` ranks get one more, so
/// the counts of all ranks add up to `total`.
pub fn compute_calls_for_rank(rank: usize, size: usize, total: usize) -> usize {
    debug_assert!(rank < size);

    total / size + usize::from(rank < total % size)
}

/// Returns the number of samples all ranks below `rank` evaluate together, i.e. the offset of
/// the first sample of `rank` in a sequential run.
pub fn calls_before_rank(rank: usize, size: usize, total: usize) -> usize {
    debug_assert!(rank < size);

    rank * (total / size) + rank.min(total % size)
}

/// A checkpoint saves the state of the generator around a Monte Carlo run.
/// Checkpoints can be used to replay a run or to continue with the next one.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Checkpoint<R, E> {
    rng_before: R,
    rng_after: R,
    estimators: E,
}

impl<R, E> Checkpoint<R, E> {
    /// Constructor
    pub(crate) const fn new(rng_before: R, rng_after: R, estimators: E) -> Self {
        Self {
            rng_before,
            rng_after,
            estimators,
        }
    }

    /// Returns the random number generator before the run.
    pub fn rng_before(&self) -> &R {
        &self.rng_before
    }

    /// Returns the random number generator after the run.
    pub fn rng_after(&self) -> &R {
        &self.rng_after
    }

    /// Returns the estimators of this checkpoint.
    pub fn estimators(&self) -> &E {
        &self.estimators
    }
}
