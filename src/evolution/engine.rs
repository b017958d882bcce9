//! # Population Engines
//!
//! The controller drives a population through the [`PopulationEngine`] trait
//! and never touches its members directly. Every query is an independent
//! snapshot: two consecutive reads may see different generations.
//!
//! [`GenerationalPopulation`] is the engine used by [`solve`](super::solve).
//! Once started it evolves generations on a background thread. Every member
//! of a generation evolves against the whole previous generation as suitors,
//! in parallel with Rayon once the population reaches the parallel threshold.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use rayon::prelude::*;
use thread_local::ThreadLocal;
use tracing::{debug, trace, warn};

use super::options::SolveOptions;
use super::stats::Stats;
use crate::error::{MagicError, Result};
use crate::genome::Genome;
use crate::rng::RandomNumberGenerator;

/// The contract between the convergence controller and a population.
pub trait PopulationEngine<G: Genome>: Send {
    /// Creates a stopped engine holding `seeds`.
    ///
    /// `rng` is the root of every random stream the engine draws from.
    fn new(seeds: Vec<G>, options: &SolveOptions, rng: RandomNumberGenerator) -> Self
    where
        Self: Sized;

    /// Starts evolving in the background.
    ///
    /// # Errors
    ///
    /// Fails if the engine is already running, has no members, or the
    /// background worker cannot be spawned.
    fn start(&mut self) -> Result<()>;

    /// Stops evolving and waits for the background work to finish.
    fn close(&mut self);

    fn is_running(&self) -> bool;

    /// Fitness statistics of the current members.
    fn stats(&self) -> Stats;

    /// A copy of the current members.
    fn members(&self) -> Vec<G>;

    /// The fittest current member.
    fn best(&self) -> Option<G>;

    /// Number of generations completed since the engine was started.
    fn generation(&self) -> usize;
}

#[derive(Debug)]
struct Shared<G> {
    members: RwLock<Vec<G>>,
    running: AtomicBool,
    generation: AtomicUsize,
}

impl<G: Genome> Shared<G> {
    fn snapshot(&self) -> Vec<G> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, next: Vec<G>) {
        *self
            .members
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// A generational population evolving on a background thread.
#[derive(Debug)]
pub struct GenerationalPopulation<G: Genome> {
    shared: Arc<Shared<G>>,
    worker: Option<JoinHandle<()>>,
    parallel_threshold: usize,
    rng: RandomNumberGenerator,
}

impl<G: Genome> GenerationalPopulation<G> {
    /// Evolves one generation from `current`.
    ///
    /// Each worker thread lazily forks its own generator from `root`.
    fn next_generation(
        current: &[G],
        parallel_threshold: usize,
        rngs: &ThreadLocal<RefCell<RandomNumberGenerator>>,
        root: &Mutex<RandomNumberGenerator>,
    ) -> Vec<G> {
        let evolve = |genome: &G| {
            let cell = rngs.get_or(|| {
                RefCell::new(root.lock().unwrap_or_else(PoisonError::into_inner).fork())
            });
            let mut rng = cell.borrow_mut();
            genome.evolve(current, &mut rng)
        };

        if current.len() >= parallel_threshold {
            current.par_iter().map(evolve).collect()
        } else {
            current.iter().map(evolve).collect()
        }
    }

    fn run(shared: Arc<Shared<G>>, parallel_threshold: usize, root: RandomNumberGenerator) {
        let rngs = ThreadLocal::new();
        let root = Mutex::new(root);

        while shared.running.load(Ordering::Acquire) {
            let current = shared.snapshot();
            let next = Self::next_generation(&current, parallel_threshold, &rngs, &root);
            shared.replace(next);
            let generation = shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
            trace!(generation, "population evolved");
        }
    }
}

impl<G: Genome> PopulationEngine<G> for GenerationalPopulation<G> {
    fn new(seeds: Vec<G>, options: &SolveOptions, rng: RandomNumberGenerator) -> Self {
        Self {
            shared: Arc::new(Shared {
                members: RwLock::new(seeds),
                running: AtomicBool::new(false),
                generation: AtomicUsize::new(0),
            }),
            worker: None,
            parallel_threshold: options.get_parallel_threshold(),
            rng,
        }
    }

    fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(MagicError::Engine(
                "population is already running".to_string(),
            ));
        }
        let size = self
            .shared
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        if size == 0 {
            return Err(MagicError::EmptyPopulation);
        }

        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let threshold = self.parallel_threshold;
        let root = self.rng.fork();
        let spawned = thread::Builder::new()
            .name("magicga-population".to_string())
            .spawn(move || Self::run(shared, threshold, root));

        match spawned {
            Ok(handle) => {
                debug!(size, "population started");
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(MagicError::Engine(format!(
                    "failed to spawn population worker: {}",
                    e
                )))
            }
        }
    }

    fn close(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("population worker panicked");
            }
            debug!(
                generations = self.generation(),
                "population stopped"
            );
        }
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn stats(&self) -> Stats {
        let members = self
            .shared
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let scores: Vec<f64> = members.iter().map(Genome::fitness).collect();
        Stats::from_scores(&scores)
    }

    fn members(&self) -> Vec<G> {
        self.shared.snapshot()
    }

    fn best(&self) -> Option<G> {
        self.shared
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            .cloned()
    }

    fn generation(&self) -> usize {
        self.shared.generation.load(Ordering::Acquire)
    }
}

impl<G: Genome> Drop for GenerationalPopulation<G> {
    fn drop(&mut self) {
        self.close();
    }
}
