//! Monte Carlo integration with uniformly distributed samples.
//!
//! For `n` samples $(x_k, y_k)$, drawn independently and uniformly per axis, the integral is
//! approximated by
//!
//! $$ I \approx \frac{(b_x - a_x)(b_y - a_y)}{n} \sum_{k=1}^n f(x_k, y_k). $$
use crate::comm::Communicator;
use crate::core::estimators::*;
use crate::core::*;
use crate::error::{Error, Result};

use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Serialize)]
/// Estimators for the Monte Carlo integrators.
///
/// Non-finite integrand values are summed like any other value, so a single `inf` or `NaN`
/// spoils the estimate; [`Estimators::non_finite_calls`] tells how often that happened.
pub struct MonteCarloEstimators<T> {
    sum: T,
    sumsq: T,
    calls: usize,
    non_finite_calls: usize,
}

impl<T: Float> Default for MonteCarloEstimators<T> {
    fn default() -> Self {
        Self {
            sum: T::zero(),
            sumsq: T::zero(),
            calls: 0,
            non_finite_calls: 0,
        }
    }
}

impl<T: Float + FromPrimitive> MonteCarloEstimators<T> {
    fn update(&mut self, value: T) {
        self.calls += 1;

        if !value.is_finite() {
            self.non_finite_calls += 1;
        }

        self.sum = self.sum + value;
        self.sumsq = self.sumsq + value * value;
    }

    /// Returns the sum of all integrand values.
    pub fn sum(&self) -> T {
        self.sum
    }

    /// Scale the estimators to the integral over a domain with the given `area`: the mean is
    /// `area / calls * sum`, the variance is `area^2` times the variance of the mean.
    pub fn integral(&self, area: T) -> MeanVar<T> {
        MeanVar::new(
            area / from_usize::<T>(self.calls) * self.sum,
            area * area * self.var(),
        )
    }

    fn to_wire(&self) -> Result<[f64; 4]> {
        Ok([
            to_wire(self.sum)?,
            to_wire(self.sumsq)?,
            self.calls as f64,
            self.non_finite_calls as f64,
        ])
    }

    fn from_wire(values: &[f64]) -> Result<Self> {
        if values.len() != 4 {
            return Err(Error::MalformedMessage {
                peer: ROOT,
                expected: 4,
                actual: values.len(),
            });
        }

        Ok(Self {
            sum: from_wire(values[0])?,
            sumsq: from_wire(values[1])?,
            calls: values[2] as usize,
            non_finite_calls: values[3] as usize,
        })
    }
}

impl<T> BasicEstimators<T> for MonteCarloEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn mean(&self) -> T {
        self.sum / from_usize::<T>(self.calls)
    }

    fn var(&self) -> T {
        let calls = from_usize::<T>(self.calls);
        (self.sumsq - self.sum * self.sum / calls) / calls / (calls - T::one())
    }
}

impl<T> Estimators<T> for MonteCarloEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn calls(&self) -> usize {
        self.calls
    }

    fn non_finite_calls(&self) -> usize {
        self.non_finite_calls
    }
}

/// A checkpoint of a Monte Carlo run.
pub type MonteCarloCheckpoint<T, R> = Checkpoint<R, MonteCarloEstimators<T>>;

/// Evaluate `integrand` at `calls` points of `domain`, drawing $x$ and then $y$ for each point.
fn sample<T, R, I>(
    integrand: &I,
    domain: &Domain<T>,
    rng: &mut R,
    calls: usize,
) -> MonteCarloEstimators<T>
where
    T: Float + FromPrimitive,
    R: Rng,
    I: Integrand<T> + ?Sized,
    Standard: Distribution<T>,
{
    let width = domain.width();
    let height = domain.height();

    let estimators = (0..calls).fold(MonteCarloEstimators::default(), |mut acc, _| {
        let x = domain.ax + width * rng.gen::<T>();
        let y = domain.ay + height * rng.gen::<T>();
        acc.update(integrand.call(x, y));
        acc
    });

    if estimators.non_finite_calls > 0 {
        tracing::warn!(
            non_finite_calls = estimators.non_finite_calls,
            calls,
            "the integrand returned non-finite values"
        );
    }

    estimators
}

/// Monte Carlo integration on a single rank.
#[derive(Clone, Debug)]
pub struct SequentialMonteCarlo<T, R> {
    domain: Domain<T>,
    rng: R,
}

impl<T, R> SequentialMonteCarlo<T, R>
where
    T: Float + FromPrimitive,
    R: Clone + Rng,
    Standard: Distribution<T>,
{
    /// Constructor. The samples are drawn from `rng`.
    pub const fn new(domain: Domain<T>, rng: R) -> Self {
        Self { domain, rng }
    }

    /// Returns the random number generator in its current state.
    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Evaluate `integrand` at `n` random points and return the estimators together with the
    /// states of the random number generator before and after.
    pub fn integrate<I: Integrand<T> + ?Sized>(
        &mut self,
        integrand: &I,
    ) -> MonteCarloCheckpoint<T, R> {
        let rng_before = self.rng.clone();
        let estimators = sample(integrand, &self.domain, &mut self.rng, self.domain.n);

        Checkpoint::new(rng_before, self.rng.clone(), estimators)
    }

    /// Returns the estimate of the integral.
    pub fn calculate<I: Integrand<T> + ?Sized>(&mut self, integrand: &I) -> T {
        self.integrate(integrand)
            .estimators()
            .integral(self.domain.area())
            .mean()
    }
}

/// How the ranks of a [`ParallelMonteCarlo`] run obtain their random numbers.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Streams {
    /// All ranks start from the same generator state. Each rank skips the random numbers the
    /// ranks below it use, so the run evaluates exactly the points a sequential run with the same
    /// generator would.
    ///
    /// The skipping draws and discards the numbers one by one: the last rank advances its
    /// generator by about `2 n (size - 1) / size` draws before it evaluates anything, which adds
    /// work proportional to `n` to the wall-clock time of the run.
    Shared,
    /// Every rank was given its own, independently seeded generator and uses it directly.
    Independent,
}

/// Monte Carlo integration distributed over all ranks of a world, combining the partial sums
/// with a collective reduction.
///
/// The `n` samples are split with [`compute_calls_for_rank`], so the ranks together evaluate
/// exactly `n` points for any number of ranks.
#[derive(Clone, Debug)]
pub struct ParallelMonteCarlo<'a, T, C, R> {
    domain: Domain<T>,
    comm: &'a C,
    rng: R,
    streams: Streams,
}

impl<'a, T, C, R> ParallelMonteCarlo<'a, T, C, R>
where
    T: Float + FromPrimitive,
    C: Communicator,
    R: Rng,
    Standard: Distribution<T>,
{
    /// Constructor for ranks sharing the state of `rng`, see [`Streams::Shared`].
    pub const fn new(domain: Domain<T>, comm: &'a C, rng: R) -> Self {
        Self::with_streams(domain, comm, rng, Streams::Shared)
    }

    /// Constructor.
    pub const fn with_streams(domain: Domain<T>, comm: &'a C, rng: R, streams: Streams) -> Self {
        Self {
            domain,
            comm,
            rng,
            streams,
        }
    }

    /// Returns the number of samples this rank evaluates.
    pub fn local_calls(&self) -> usize {
        compute_calls_for_rank(self.comm.rank(), self.comm.size(), self.domain.n)
    }

    /// Sample the share of this rank and sum the estimators of all ranks at the root. The root
    /// returns the combined estimators, all other ranks return `None`.
    pub fn integrate<I: Integrand<T> + ?Sized>(
        &mut self,
        integrand: &I,
    ) -> Result<Option<MonteCarloEstimators<T>>> {
        let rank = self.comm.rank();
        let size = self.comm.size();
        let calls = self.local_calls();

        if self.streams == Streams::Shared {
            // determine how many calls to the random number generator to skip
            let skip = 2 * calls_before_rank(rank, size, self.domain.n);

            for _ in 0..skip {
                let _ = self.rng.gen::<T>();
            }
        }

        tracing::debug!(rank, size, calls, "sampling");

        let local = sample(integrand, &self.domain, &mut self.rng, calls);

        self.comm
            .reduce_sum(&local.to_wire()?)?
            .map(|total| MonteCarloEstimators::from_wire(&total))
            .transpose()
    }

    /// Returns the estimate of the integral on the root and `None` on every other rank.
    pub fn calculate<I: Integrand<T> + ?Sized>(&mut self, integrand: &I) -> Result<Option<T>> {
        let area = self.domain.area();
        let n = from_usize::<T>(self.domain.n);

        Ok(self
            .integrate(integrand)?
            .map(|estimators| area / n * estimators.sum()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{run_spmd, SingleProcess};
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use serde::Serialize;

    fn assert_eq_rng<R>(lhs: &R, rhs: &R)
    where
        R: Rng + Serialize,
    {
        assert_eq!(
            serde_json::to_string(lhs).unwrap(),
            serde_json::to_string(rhs).unwrap()
        );
    }

    fn rng() -> Pcg64 {
        Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96)
    }

    #[test]
    fn test_estimators_update() {
        let mut estimators = MonteCarloEstimators::<f64>::default();
        estimators.update(1.0);
        estimators.update(3.0);

        assert_eq!(estimators.calls(), 2);
        assert_eq!(estimators.sum(), 4.0);
        assert_eq!(estimators.mean(), 2.0);
        // sample variance 2, divided by the number of calls
        assert_eq!(estimators.var(), 1.0);
        assert_eq!(estimators.non_finite_calls(), 0);

        estimators.update(f64::INFINITY);
        assert_eq!(estimators.non_finite_calls(), 1);
        assert!(estimators.sum().is_infinite());
    }

    #[test]
    fn test_estimators_wire_format() {
        let mut estimators = MonteCarloEstimators::<f64>::default();
        estimators.update(0.5);
        estimators.update(f64::NAN);

        let wire = estimators.to_wire().unwrap();
        let back = MonteCarloEstimators::<f64>::from_wire(&wire).unwrap();
        assert_eq!(back.calls(), 2);
        assert_eq!(back.non_finite_calls(), 1);

        assert!(matches!(
            MonteCarloEstimators::<f64>::from_wire(&[1.0]),
            Err(Error::MalformedMessage {
                expected: 4,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_constant_field() {
        // the estimate of a constant integrand is exact up to rounding
        let domain = Domain::new(-1.0, 3.0, 2.0, 2.5, 1000);
        let mut integrator = SequentialMonteCarlo::new(domain, rng());
        let result = integrator.calculate(&|_: f64, _: f64| 3.0);

        assert_approx_eq!(result, 6.0, 1e-12);
    }

    #[test]
    fn test_samples_stay_inside_the_domain() {
        let domain = Domain::new(-1.0, 3.0, 2.0, 2.5, 10_000);
        let inside = |x: f64, y: f64| {
            assert!((-1.0..3.0).contains(&x));
            assert!((2.0..2.5).contains(&y));
            1.0
        };

        SequentialMonteCarlo::new(domain, rng()).calculate(&inside);
    }

    #[test]
    fn test_checkpoint() {
        const CALLS: usize = 1000;

        let mut rng = rng();
        let rng_start = rng.clone();
        let domain = Domain::new(0.0, 1.0, 0.0, 1.0, CALLS);
        let mut integrator = SequentialMonteCarlo::new(domain, rng.clone());
        let field = |x: f64, _: f64| (2.0 * x - 1.0).abs();
        let chkpt = integrator.integrate(&field);

        // compare random number generators before the run
        assert_eq_rng(chkpt.rng_before(), &rng_start);

        // two random numbers per call
        for _ in 0..2 * CALLS {
            let _: f64 = rng.gen();
        }
        assert_eq_rng(chkpt.rng_after(), &rng);
        assert_eq_rng(integrator.rng(), &rng);

        let estimators = chkpt.estimators();
        assert_eq!(estimators.calls(), CALLS);

        // int_0^1 dx |2x-1| = 0.5
        assert_approx_eq!(estimators.mean(), 0.5, 5.0 * estimators.std());
    }

    #[test]
    fn test_same_seed_same_result() {
        let domain = Domain::new(-2.0, 2.0, -1.0, 3.0, 5000);
        let field = |x: f64, y: f64| x * y.cos();

        let first = SequentialMonteCarlo::new(domain, rng()).calculate(&field);
        let second = SequentialMonteCarlo::new(domain, rng()).calculate(&field);

        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_standard_error_shrinks_with_sqrt_n() {
        let field = |x: f64, y: f64| x * x + y;
        let std = |n: usize| {
            let domain = Domain::new(0.0, 1.0, 0.0, 1.0, n);
            SequentialMonteCarlo::new(domain, Pcg64::seed_from_u64(n as u64))
                .integrate(&field)
                .estimators()
                .integral(domain.area())
                .std()
        };

        // a hundred times more samples, ten times smaller error
        let ratio = std(1_000) / std(100_000);
        assert!(ratio > 8.0 && ratio < 12.5, "ratio = {}", ratio);
    }

    #[test]
    fn test_single_rank_matches_sequential() {
        let domain = Domain::new(-2.0, 2.0, -1.0, 3.0, 2000);
        let field = |x: f64, y: f64| x.sin() + y * y;

        let sequential = SequentialMonteCarlo::new(domain, rng()).calculate(&field);
        let parallel = ParallelMonteCarlo::new(domain, &SingleProcess, rng())
            .calculate(&field)
            .unwrap();

        assert_eq!(parallel, Some(sequential));
    }

    #[test]
    fn test_shared_streams_reproduce_the_sequential_samples() {
        let domain = Domain::new(-2.0, 2.0, -1.0, 3.0, 10_001);
        let field = |x: f64, y: f64| x.sin() + y * y;

        let sequential = SequentialMonteCarlo::new(domain, rng()).calculate(&field);

        for size in 1..=6 {
            let results = run_spmd(size, |comm| {
                ParallelMonteCarlo::new(domain, &comm, rng())
                    .calculate(&field)
                    .unwrap()
            })
            .unwrap();

            assert_approx_eq!(results[0].unwrap(), sequential, 1e-9 * sequential.abs());
            assert!(results[1..].iter().all(Option::is_none));
        }
    }

    #[test]
    fn test_every_sample_is_evaluated_exactly_once() {
        for &(n, size) in &[(10, 3), (7, 7), (3, 5), (1000, 6), (0, 2)] {
            let domain = Domain::new(0.0, 1.0, 0.0, 1.0, n);
            let results = run_spmd(size, |comm| {
                ParallelMonteCarlo::new(domain, &comm, rng())
                    .integrate(&|_: f64, _: f64| 1.0)
                    .unwrap()
            })
            .unwrap();

            let estimators = results[0].unwrap();
            assert_eq!(estimators.calls(), n);
            assert_eq!(estimators.sum(), n as f64);
        }
    }

    #[test]
    fn test_independent_streams() {
        let domain = Domain::new(0.0, 1.0, 0.0, 1.0, 20_000);
        let field = |x: f64, y: f64| x + y;

        let results = run_spmd(4, |comm| {
            let rng = Pcg64::seed_from_u64(17 + comm.rank() as u64);
            ParallelMonteCarlo::with_streams(domain, &comm, rng, Streams::Independent)
                .integrate(&field)
                .unwrap()
        })
        .unwrap();

        let estimators = results[0].unwrap();
        let integral = estimators.integral(domain.area());
        assert_eq!(estimators.calls(), 20_000);
        assert_approx_eq!(integral.mean(), 1.0, 5.0 * integral.std());
    }
}
