//! Command-line front end: integrate one of the built-in fields and print the value and the
//! elapsed seconds.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing_subscriber::EnvFilter;

use dintir::callbacks::{Callback, Comparison, FileWriterCallback, Outcome, SimpleCallback};
use dintir::comm::{run_spmd, Communicator, SingleProcess};
use dintir::config::RunConfig;
use dintir::fields::Field;
use dintir::integrators::{Mode, Strategy, Streams};
use dintir::Result;

/// Numeric integration of a scalar field over a rectangle.
#[derive(Parser, Debug)]
#[command(name = "dintir", version)]
#[command(about = "Integrate a two-dimensional scalar field sequentially or on several ranks")]
struct Args {
    /// JSON file with a run configuration; the options below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field to integrate: rosenbrock, ricker_wavelet or schwefel
    #[arg(long)]
    function: Option<Field>,

    /// Lower bound in x
    #[arg(long, allow_negative_numbers = true)]
    ax: Option<f64>,

    /// Upper bound in x
    #[arg(long, allow_negative_numbers = true)]
    bx: Option<f64>,

    /// Lower bound in y
    #[arg(long, allow_negative_numbers = true)]
    ay: Option<f64>,

    /// Upper bound in y
    #[arg(long, allow_negative_numbers = true)]
    by: Option<f64>,

    /// Grid subdivisions per axis, or number of Monte Carlo samples
    #[arg(short, long)]
    n: Option<usize>,

    /// SequentialTrapezoid, ParallelTrapezoid, SequentialMonteCarlo or ParallelMonteCarlo
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Number of in-process ranks for the parallel modes; under MPI the world size decides
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for the random number generator; without it every rank seeds from entropy
    ///
    /// With a seed every rank of a parallel Monte Carlo run starts from the same generator and
    /// first discards the numbers of the lower ranks, so the result does not depend on the number
    /// of ranks. The discarding grows with the number of samples and slows the parallel run down,
    /// which shows in the speedup of `--compare`.
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the outcome as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Run the sequential and the parallel variant of the mode and print a comparison as JSON
    #[arg(long)]
    compare: bool,
}

impl Args {
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        config.function = self.function.unwrap_or(config.function);
        config.domain.ax = self.ax.unwrap_or(config.domain.ax);
        config.domain.bx = self.bx.unwrap_or(config.domain.bx);
        config.domain.ay = self.ay.unwrap_or(config.domain.ay);
        config.domain.by = self.by.unwrap_or(config.domain.by);
        config.domain.n = self.n.unwrap_or(config.domain.n);
        config.mode = self.mode.unwrap_or(config.mode);
        config.workers = self.workers.unwrap_or(config.workers);
        config.seed = self.seed.or(config.seed);

        Ok(config)
    }
}

/// Where the ranks of a parallel run live.
enum Launcher {
    /// Threads of this process.
    Threads(usize),
    /// The processes started by `mpirun`.
    #[cfg(feature = "mpi")]
    Mpi(mpi::topology::SimpleCommunicator),
}

impl Launcher {
    /// The number of ranks of a parallel run.
    fn size(&self) -> usize {
        match self {
            Self::Threads(workers) => *workers,
            #[cfg(feature = "mpi")]
            Self::Mpi(world) => Communicator::size(world),
        }
    }

    fn is_root(&self) -> bool {
        match self {
            Self::Threads(_) => true,
            #[cfg(feature = "mpi")]
            Self::Mpi(world) => Communicator::is_root(world),
        }
    }

    /// Run `mode`; the outcome is returned on the root only.
    fn execute(&self, config: &RunConfig, mode: Mode) -> Result<Option<Outcome<f64>>> {
        if !mode.is_parallel() {
            return if self.is_root() {
                integrate(config, mode, &SingleProcess)
            } else {
                Ok(None)
            };
        }

        match self {
            Self::Threads(workers) => {
                let results = run_spmd(*workers, |comm| integrate(config, mode, &comm))?;
                let mut outcomes = results.into_iter().collect::<Result<Vec<_>>>()?;
                Ok(outcomes.swap_remove(0))
            }
            #[cfg(feature = "mpi")]
            Self::Mpi(world) => integrate(config, mode, world),
        }
    }
}

/// Returns the requested number of workers if the launcher runs a different number of ranks.
fn ignored_workers(requested: Option<usize>, size: usize) -> Option<usize> {
    requested.filter(|&workers| workers != size)
}

fn generator(seed: Option<u64>) -> (Pcg64, Streams) {
    match seed {
        Some(seed) => (Pcg64::seed_from_u64(seed), Streams::Shared),
        None => (Pcg64::from_entropy(), Streams::Independent),
    }
}

fn integrate<C: Communicator>(
    config: &RunConfig,
    mode: Mode,
    comm: &C,
) -> Result<Option<Outcome<f64>>> {
    let (rng, streams) = generator(config.seed);
    let mut strategy = Strategy::with_streams(mode, config.domain, comm, rng, streams);

    let start = Instant::now();
    let value = strategy.calculate(&config.function)?;
    let elapsed_seconds = start.elapsed().as_secs_f64();

    Ok(value.map(|value| Outcome {
        mode,
        field: config.function,
        workers: comm.size(),
        value,
        elapsed_seconds,
    }))
}

fn run(args: Args) -> Result<()> {
    let compare = args.compare;
    let report = args.report.clone();
    let requested_workers = args.workers;
    let config = args.into_config()?;

    #[cfg(not(feature = "mpi"))]
    let launcher = Launcher::Threads(config.workers);

    #[cfg(feature = "mpi")]
    let universe = mpi::initialize().ok_or(dintir::Error::MpiInitialization)?;
    #[cfg(feature = "mpi")]
    let launcher = Launcher::Mpi(universe.world());

    if let Some(workers) = ignored_workers(requested_workers, launcher.size()) {
        if launcher.is_root() {
            let size = launcher.size();
            tracing::warn!(
                workers,
                size,
                "--workers is ignored, all ranks of the world take part"
            );
        }
    }

    if launcher.is_root() && !config.domain.is_well_formed() {
        tracing::warn!(domain = ?config.domain, "the result for this domain is meaningless");
    }

    if compare {
        let sequential = launcher.execute(&config, config.mode.sequential_counterpart())?;
        let parallel = launcher.execute(&config, config.mode.parallel_counterpart())?;

        if let (Some(sequential), Some(parallel)) = (sequential, parallel) {
            if let Some(path) = &report {
                FileWriterCallback::new(path).report(&parallel)?;
            }
            let comparison = Comparison::new(sequential, parallel);
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
    } else if let Some(outcome) = launcher.execute(&config, config.mode)? {
        SimpleCallback {}.report(&outcome)?;

        if let Some(path) = &report {
            FileWriterCallback::new(path).report(&outcome)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
