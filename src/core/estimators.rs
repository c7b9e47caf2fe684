//! Statistical summaries of a Monte Carlo run.
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A value together with its statistical uncertainty.
pub trait BasicEstimators<T: Float> {
    /// The estimated value.
    fn mean(&self) -> T;

    /// The variance of the estimate.
    fn var(&self) -> T;

    /// The standard error, the square root of [`BasicEstimators::var`].
    fn std(&self) -> T {
        self.var().sqrt()
    }
}

/// Estimators that also know how many integrand values went into them.
pub trait Estimators<T: Float>: BasicEstimators<T> {
    /// Number of integrand evaluations.
    fn calls(&self) -> usize;

    /// Number of evaluations that returned `inf` or `NaN`.
    fn non_finite_calls(&self) -> usize;
}

/// A plain pair of mean and variance, e.g. of an integral.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MeanVar<T> {
    mean: T,
    var: T,
}

impl<T> MeanVar<T> {
    /// Constructor.
    pub const fn new(mean: T, var: T) -> Self {
        Self { mean, var }
    }
}

impl<T: Float> BasicEstimators<T> for MeanVar<T> {
    fn mean(&self) -> T {
        self.mean
    }

    fn var(&self) -> T {
        self.var
    }
}

/// Prints `mean ± std`; a precision applies to both numbers.
impl<T: Float + Display> Display for MeanVar<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let std = self.std();
        match f.precision() {
            Some(p) => write!(f, "{:.p$} ± {:.p$}", self.mean, std, p = p),
            None => write!(f, "{} ± {}", self.mean, std),
        }
    }
}
