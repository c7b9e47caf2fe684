//! Composite trapezoidal rule on an `n` by `n` grid of cells.
//!
//! Every cell contributes the average of the integrand at its four corners times its area
//! $h_x h_y$, with $h_x = (b_x - a_x) / n$ and $h_y = (b_y - a_y) / n$. A cell therefore costs four
//! integrand calls.
use crate::comm::{Communicator, Tag};
use crate::core::{from_usize, from_wire, to_wire, Domain, Integrand, ROOT};
use crate::error::{Error, Result};

use num_traits::{Float, FromPrimitive};

/// Sum the contributions of the `cells` by `cells` block of grid cells with lower left corner
/// `(x0, y0)`.
fn trapezoid_block<T, I>(integrand: &I, x0: T, y0: T, hx: T, hy: T, cells: usize) -> T
where
    T: Float + FromPrimitive,
    I: Integrand<T> + ?Sized,
{
    let four = from_usize::<T>(4);

    (0..cells).fold(T::zero(), |total, i| {
        let x1 = x0 + from_usize::<T>(i) * hx;
        let x2 = x0 + from_usize::<T>(i + 1) * hx;

        (0..cells).fold(total, |total, j| {
            let y1 = y0 + from_usize::<T>(j) * hy;
            let y2 = y0 + from_usize::<T>(j + 1) * hy;

            let corners = integrand.call(x1, y1)
                + integrand.call(x1, y2)
                + integrand.call(x2, y1)
                + integrand.call(x2, y2);

            total + corners / four * hx * hy
        })
    })
}

/// The trapezoid rule on a single rank.
#[derive(Clone, Copy, Debug)]
pub struct SequentialTrapezoid<T> {
    domain: Domain<T>,
}

impl<T: Float + FromPrimitive> SequentialTrapezoid<T> {
    /// Constructor.
    pub const fn new(domain: Domain<T>) -> Self {
        Self { domain }
    }

    /// Integrate `integrand` over all $n^2$ cells. The result is deterministic: the same input
    /// always yields the same bits.
    pub fn calculate<I: Integrand<T> + ?Sized>(&self, integrand: &I) -> T {
        let (hx, hy) = self.domain.steps();

        trapezoid_block(
            integrand,
            self.domain.ax,
            self.domain.ay,
            hx,
            hy,
            self.domain.n,
        )
    }
}

/// The trapezoid rule distributed over all ranks of a world, exchanging parameters and partial
/// sums with point-to-point messages.
///
/// With `size` ranks every rank evaluates a block of `n / size` by `n / size` cells. The block of
/// rank `i` starts `i * (n / size)` cells away from $(a_x, a_y)$ along *both* axes, so the blocks
/// lie on the diagonal of the grid. For more than one rank only `size * (n / size)^2` of the
/// $n^2$ cells are evaluated: the off-diagonal blocks and the `n % size` trailing rows and columns
/// are never computed. [`ParallelTrapezoid::covered_cells`] reports how many cells contribute.
#[derive(Clone, Copy, Debug)]
pub struct ParallelTrapezoid<'a, T, C> {
    domain: Domain<T>,
    comm: &'a C,
}

impl<'a, T, C> ParallelTrapezoid<'a, T, C>
where
    T: Float + FromPrimitive,
    C: Communicator,
{
    /// Constructor.
    pub const fn new(domain: Domain<T>, comm: &'a C) -> Self {
        Self { domain, comm }
    }

    /// Returns the number of cells along each axis of the block of a single rank.
    pub fn cells_per_rank(&self) -> usize {
        self.domain.n / self.comm.size()
    }

    /// Returns the number of cells that contribute to the result.
    pub fn covered_cells(&self) -> usize {
        let cells = self.cells_per_rank();
        self.comm.size() * cells * cells
    }

    /// Run the integration on this rank.
    ///
    /// The root sends every other rank its parameters, integrates its own block, and then
    /// collects one partial sum from each rank in rank order. Every other rank waits for its
    /// parameters, integrates its block and sends the partial sum back. Only the root returns a
    /// value; all other ranks return `None`.
    pub fn calculate<I: Integrand<T> + ?Sized>(&self, integrand: &I) -> Result<Option<T>> {
        let (hx, hy) = self.domain.steps();
        let cells = self.cells_per_rank();

        tracing::debug!(rank = self.comm.rank(), cells, "integrating trapezoid block");

        if !self.comm.is_root() {
            let parameters = self.comm.receive(ROOT, Tag::Parameters)?;

            if parameters.len() != 3 {
                return Err(Error::MalformedMessage {
                    peer: ROOT,
                    expected: 3,
                    actual: parameters.len(),
                });
            }

            let x_start = from_wire::<T>(parameters[0])?;
            let y_start = from_wire::<T>(parameters[1])?;
            let block_cells = parameters[2] as usize;
            let partial = trapezoid_block(integrand, x_start, y_start, hx, hy, block_cells);

            self.comm.send(ROOT, Tag::Result, &[to_wire(partial)?])?;

            return Ok(None);
        }

        let total_cells = self.domain.n * self.domain.n;
        if self.covered_cells() < total_cells {
            tracing::warn!(
                covered = self.covered_cells(),
                total = total_cells,
                "the diagonal partition leaves part of the grid unevaluated"
            );
        }

        for rank in 1..self.comm.size() {
            let offset = from_usize::<T>(rank * cells);
            let x_start = self.domain.ax + offset * hx;
            let y_start = self.domain.ay + offset * hy;

            self.comm.send(
                rank,
                Tag::Parameters,
                &[to_wire(x_start)?, to_wire(y_start)?, cells as f64],
            )?;
        }

        let mut total = trapezoid_block(integrand, self.domain.ax, self.domain.ay, hx, hy, cells);

        for rank in 1..self.comm.size() {
            let partial = self.comm.receive(rank, Tag::Result)?;

            if partial.len() != 1 {
                return Err(Error::MalformedMessage {
                    peer: rank,
                    expected: 1,
                    actual: partial.len(),
                });
            }

            total = total + from_wire::<T>(partial[0])?;
        }

        Ok(Some(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{run_spmd, SingleProcess};
    use assert_approx_eq::assert_approx_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn one(_: f64, _: f64) -> f64 {
        1.0
    }

    #[test]
    fn test_constant_field_single_cell() {
        let domain = Domain::new(0.0, 1.0, 0.0, 1.0, 1);

        assert_eq!(SequentialTrapezoid::new(domain).calculate(&one), 1.0);
    }

    #[test]
    fn test_bilinear_field_is_exact() {
        // the trapezoid rule integrates functions linear in each variable exactly:
        // int_0^2 dx int_1^3 dy x*y = 2 * 4 = 8
        let domain = Domain::new(0.0, 2.0, 1.0, 3.0, 16);
        let integrator = SequentialTrapezoid::new(domain);
        let result = integrator.calculate(&|x: f64, y: f64| x * y);

        assert_approx_eq!(result, 8.0, 1e-12);
    }

    #[test]
    fn test_evaluation_count() {
        let calls = AtomicUsize::new(0);
        let counting = |_: f64, _: f64| {
            calls.fetch_add(1, Ordering::Relaxed);
            0.0
        };

        let domain = Domain::new(0.0, 1.0, 0.0, 1.0, 7);
        SequentialTrapezoid::new(domain).calculate(&counting);

        assert_eq!(calls.load(Ordering::Relaxed), 4 * 7 * 7);
    }

    #[test]
    fn test_repeated_calls_are_bitwise_identical() {
        let domain = Domain::new(-1.5, 0.5, 0.0, 2.5, 37);
        let field = |x: f64, y: f64| (x * y).sin() + x.exp();
        let integrator = SequentialTrapezoid::new(domain);

        let first = integrator.calculate(&field);
        let second = SequentialTrapezoid::new(domain).calculate(&field);

        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_f32() {
        let domain = Domain::new(0.0_f32, 1.0, 0.0, 1.0, 10);
        let integrator = SequentialTrapezoid::new(domain);
        let result = integrator.calculate(&|_: f32, _: f32| 2.0);

        assert!((result - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_single_rank_matches_sequential() {
        let domain = Domain::new(-2.0, 2.0, -1.0, 3.0, 20);
        let field = |x: f64, y: f64| x * x + y;

        let sequential = SequentialTrapezoid::new(domain).calculate(&field);
        let parallel = ParallelTrapezoid::new(domain, &SingleProcess)
            .calculate(&field)
            .unwrap();

        assert_eq!(parallel, Some(sequential));
    }

    #[test]
    fn test_only_root_returns_a_value() {
        for size in 1..=5 {
            let domain = Domain::new(0.0, 1.0, 0.0, 1.0, 12);
            let results = run_spmd(size, |comm| {
                ParallelTrapezoid::new(domain, &comm)
                    .calculate(&one)
                    .unwrap()
            })
            .unwrap();

            assert!(results[0].is_some());
            assert!(results[1..].iter().all(Option::is_none));
        }
    }

    #[test]
    fn test_diagonal_partition_covers_only_diagonal_blocks() {
        // n = 10 on 3 ranks: blocks of 3x3 cells, 27 of 100 cells are covered
        let domain = Domain::new(0.0, 1.0, 0.0, 1.0, 10);
        let results = run_spmd(3, |comm| {
            let integrator = ParallelTrapezoid::new(domain, &comm);
            assert_eq!(integrator.cells_per_rank(), 3);
            assert_eq!(integrator.covered_cells(), 27);
            integrator.calculate(&one).unwrap()
        })
        .unwrap();

        assert_approx_eq!(results[0].unwrap(), 0.27, 1e-14);
    }

    #[test]
    fn test_diagonal_partition_evaluation_count() {
        let calls = AtomicUsize::new(0);
        let counting = |_: f64, _: f64| {
            calls.fetch_add(1, Ordering::Relaxed);
            1.0
        };
        let domain = Domain::new(0.0, 1.0, 0.0, 1.0, 9);

        run_spmd(4, |comm| {
            ParallelTrapezoid::new(domain, &comm)
                .calculate(&counting)
                .unwrap()
        })
        .unwrap();

        // 9 / 4 = 2 cells per rank and axis, 4 corners per cell
        assert_eq!(calls.load(Ordering::Relaxed), 4 * 4 * 2 * 2);
    }

    #[test]
    fn test_off_diagonal_quadrants_are_never_evaluated() {
        // with two ranks the blocks are the lower left and the upper right quadrant, so a field
        // that is non-zero only in the other two quadrants integrates to zero
        let domain = Domain::new(0.0, 1.0, 0.0, 1.0, 8);
        let off_diagonal = |x: f64, y: f64| {
            if (x - 0.5) * (y - 0.5) < 0.0 {
                1.0
            } else {
                0.0
            }
        };

        let sequential = SequentialTrapezoid::new(domain).calculate(&off_diagonal);
        assert_approx_eq!(sequential, 2.0 * 3.5 * 3.5 / 64.0, 1e-14);

        let results = run_spmd(2, |comm| {
            ParallelTrapezoid::new(domain, &comm)
                .calculate(&off_diagonal)
                .unwrap()
        })
        .unwrap();

        assert_eq!(results[0], Some(0.0));
    }
}
