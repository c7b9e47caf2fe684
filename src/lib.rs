#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! The crate `dintir` provides routines for the numeric [integration] of scalar fields over
//! rectangles in two dimensions, either on a single core or distributed over the ranks of a
//! world of cooperating workers.
//!
//! # Features
//!
//! - **Four strategies**. The composite trapezoidal rule and [Monte Carlo integration], each in a
//! sequential and a parallel variant. The parallel variants follow the SPMD model: every rank
//! runs the same code and the result is delivered on rank zero only.
//! - **Generic numeric type**. The numeric type is a generic parameter, so that the integration
//! routines can be used with either `f32`, `f64`, or a custom numeric type that implements the
//! `Float` trait from the `num-traits` crate.
//! - **Generic random number generator**. Every random number generator that implements the `Rng`
//! trait from the `rand` crate can be used with the Monte Carlo integrators.
//! - **Reproducibility**. The trapezoid rule is deterministic. A parallel Monte Carlo run started
//! from a seeded generator evaluates exactly the points a sequential run would, independently of
//! the number of ranks.
//! - **Pluggable worker contexts**. Ranks talk to each other through the
//! [`Communicator`](comm::Communicator) trait. The crate ships an in-process world where every
//! rank is a thread, and, with the `mpi` feature, an implementation for real MPI programs.
//!
//! # What is ...?
//!
//! Given the rectangle $[a_x, b_x] \times [a_y, b_y]$ and the field $f(x, y)$ we approximate
//!
//! $$ I = \int_{a_x}^{b_x} \mathrm{d} x \int_{a_y}^{b_y} \mathrm{d} y \, f(x, y) $$
//!
//! We use the following terms:
//!
//! - the *resolution* $n$ is the number of grid subdivisions per axis for the trapezoid rule and
//! the number of samples for Monte Carlo integration,
//! - the *integrand* or *field* is the function $f(x, y)$,
//! - a *rank* is one participant of a *world* of fixed *size*; rank zero is the *root*,
//! - a *call* is one evaluation of the integrand. We assume that this is the expensive operation.
//!
//! [integration]: https://en.wikipedia.org/wiki/Numerical_integration
//! [Monte Carlo integration]: https://en.wikipedia.org/wiki/Monte_Carlo_integration

pub mod callbacks;
pub mod comm;
pub mod config;
pub mod core;
pub mod error;
pub mod fields;
pub mod integrators;

pub use crate::core::*;
pub use crate::error::{Error, Result};
