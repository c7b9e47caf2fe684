use std::time::Instant;

use dintir::comm::run_spmd;
use dintir::core::Domain;
use dintir::fields::Field;
use dintir::integrators::monte_carlo::{ParallelMonteCarlo, SequentialMonteCarlo};
use dintir::integrators::trapezoid::{ParallelTrapezoid, SequentialTrapezoid};
use dintir::Result;

use rand_pcg::Pcg64;

/// Integrate the Rosenbrock function with all four strategies and compare them with the exact
/// value, 4624.
fn main() -> Result<()> {
    let workers = 4;
    let grid = Domain::new(-2.0, 2.0, -1.0, 3.0, 400);
    let samples = Domain {
        n: 1_000_000,
        ..grid
    };
    let rng = Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96);

    let start = Instant::now();
    let integrator = SequentialTrapezoid::new(grid);
    let value = integrator.calculate(&Field::Rosenbrock);
    println!("SequentialTrapezoid:  {} ({:?})", value, start.elapsed());

    let start = Instant::now();
    let results = run_spmd(workers, |comm| {
        ParallelTrapezoid::new(grid, &comm)
            .calculate(&Field::Rosenbrock)
    })?;
    if let Some(value) = results.into_iter().next().transpose()?.flatten() {
        println!("ParallelTrapezoid:    {} ({:?})", value, start.elapsed());
    }

    let start = Instant::now();
    let mut integrator = SequentialMonteCarlo::new(samples, rng.clone());
    let chkpt = integrator.integrate(&Field::Rosenbrock);
    let integral = chkpt.estimators().integral(samples.area());
    println!("SequentialMonteCarlo: {:.3} ({:?})", integral, start.elapsed());

    let start = Instant::now();
    let results = run_spmd(workers, |comm| {
        let mut integrator = ParallelMonteCarlo::new(samples, &comm, rng.clone());
        integrator.calculate(&Field::Rosenbrock)
    })?;
    if let Some(value) = results.into_iter().next().transpose()?.flatten() {
        println!("ParallelMonteCarlo:   {} ({:?})", value, start.elapsed());
    }

    Ok(())
}
