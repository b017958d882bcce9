use std::marker::PhantomData;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::engine::{GenerationalPopulation, PopulationEngine};
use super::options::SolveOptions;
use crate::error::{MagicError, OptionExt, Result};
use crate::genome::{Encoding, Genome, PermutationGenome, SiameseGenome};
use crate::rng::RandomNumberGenerator;
use crate::session::Session;
use crate::square::{Schema, Square};

/// How a solve ended.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A member reached the solved score.
    Solved,
    /// The deadline passed first; the result carries the best member seen.
    TimedOut,
}

/// Why a population was reseeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReseedTrigger {
    /// The reseed interval elapsed.
    Timer,
    /// The relative standard deviation fell below the convergence threshold.
    Converged,
}

/// What one controller tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Reseeded(ReseedTrigger),
    Finished(Outcome),
}

/// Interval timer with exponential backoff.
#[derive(Debug, Clone)]
pub struct ReseedTimer {
    interval: Duration,
    started: Instant,
}

impl ReseedTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: Instant::now(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.interval
    }

    /// Doubles the interval and restarts the timer.
    pub fn back_off(&mut self) {
        self.interval = self.interval.saturating_mul(2);
        self.started = Instant::now();
    }
}

/// The best genome of a finished solve.
#[derive(Debug, Clone)]
pub struct SolveResult<G: Genome> {
    pub outcome: Outcome,
    pub best: G,
    pub reseeds: usize,
    pub evaluations: usize,
    pub elapsed: Duration,
}

/// Drives a population engine towards a magic square.
///
/// Each [`tick`](Self::tick) checks, in order: the overall deadline, the
/// reseed timer, whether the best member is solved, and whether the
/// population has lost its diversity. Reseeding replaces the population
/// with fresh seeds but keeps the best member of the outgoing one, so the
/// best fitness never decreases across reseeds.
pub struct ConvergenceController<G, E = GenerationalPopulation<G>>
where
    G: Genome,
    E: PopulationEngine<G>,
{
    session: Arc<Session>,
    options: SolveOptions,
    population_size: usize,
    engine: E,
    rng: RandomNumberGenerator,
    timer: ReseedTimer,
    started: Instant,
    deadline: Instant,
    reseeds: usize,
    _marker: PhantomData<G>,
}

impl<G, E> ConvergenceController<G, E>
where
    G: Genome,
    E: PopulationEngine<G>,
{
    /// Seeds a population for `session` and starts the engine.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid options and an engine error
    /// if the population cannot be started.
    pub fn new(session: Arc<Session>, options: SolveOptions) -> Result<Self> {
        options.validate()?;
        session.schema().validate()?;

        let mut rng = match options.get_seed() {
            Some(seed) => RandomNumberGenerator::from_seed(seed),
            None => RandomNumberGenerator::new(),
        };
        let population_size = options.get_population_size(session.order());
        let seeds = seed_population(&session, population_size, &mut rng);
        let mut engine = E::new(seeds, &options, rng.fork());
        engine.start()?;

        let started = Instant::now();
        Ok(Self {
            timer: ReseedTimer::new(options.get_reseed_interval()),
            deadline: started + options.get_timeout(),
            started,
            session,
            options,
            population_size,
            engine,
            rng,
            reseeds: 0,
            _marker: PhantomData,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn reseeds(&self) -> usize {
        self.reseeds
    }

    /// The interval the reseed timer is currently waiting for.
    pub fn reseed_interval(&self) -> Duration {
        self.timer.interval()
    }

    /// Runs one step of the control loop.
    pub fn tick(&mut self) -> Result<Tick> {
        if Instant::now() >= self.deadline {
            self.engine.close();
            return Ok(Tick::Finished(Outcome::TimedOut));
        }

        if self.timer.expired() {
            self.reseed(ReseedTrigger::Timer)?;
            return Ok(Tick::Reseeded(ReseedTrigger::Timer));
        }

        let stats = self.engine.stats();
        if stats.max >= self.session.solved_score() {
            self.engine.close();
            return Ok(Tick::Finished(Outcome::Solved));
        }

        // a fresh population has not been evolved yet, its spread says nothing
        if self.engine.generation() > 0 && stats.rsd() < self.options.get_convergence_threshold()
        {
            debug!(
                rsd = stats.rsd(),
                mean = stats.mean,
                max = stats.max,
                "population converged"
            );
            self.reseed(ReseedTrigger::Converged)?;
            return Ok(Tick::Reseeded(ReseedTrigger::Converged));
        }

        Ok(Tick::Continue)
    }

    /// Replaces the population with fresh seeds, keeping the outgoing best member.
    ///
    /// The reseed interval doubles whatever triggered the reseed.
    pub fn reseed(&mut self, trigger: ReseedTrigger) -> Result<()> {
        self.engine.close();
        let elite = self.engine.best();

        let mut seeds = seed_population(&self.session, self.population_size, &mut self.rng);
        if let (Some(elite), Some(slot)) = (elite, seeds.last_mut()) {
            *slot = elite;
        }

        // a fresh stream per engine, so a seeded run does not replay itself
        self.engine = E::new(seeds, &self.options, self.rng.fork());
        self.engine.start()?;
        self.reseeds += 1;
        self.timer.back_off();

        debug!(
            ?trigger,
            reseeds = self.reseeds,
            next_interval = ?self.timer.interval(),
            "population reseeded"
        );
        Ok(())
    }

    /// Ticks until the population is solved or the deadline passes.
    pub fn run(mut self) -> Result<SolveResult<G>> {
        let outcome = loop {
            match self.tick()? {
                Tick::Finished(outcome) => break outcome,
                Tick::Reseeded(_) => {}
                Tick::Continue => {
                    let pause = self.options.get_poll_interval();
                    if !pause.is_zero() {
                        thread::sleep(pause);
                    }
                }
            }
        };

        let best = self
            .engine
            .best()
            .ok_or_else_magic(|| MagicError::EmptyPopulation)?;
        Ok(SolveResult {
            outcome,
            best,
            reseeds: self.reseeds,
            evaluations: self.session.evaluations(),
            elapsed: self.started.elapsed(),
        })
    }
}

impl<G, E> Drop for ConvergenceController<G, E>
where
    G: Genome,
    E: PopulationEngine<G>,
{
    fn drop(&mut self) {
        self.engine.close();
    }
}

pub type PermutationController =
    ConvergenceController<PermutationGenome, GenerationalPopulation<PermutationGenome>>;
pub type SiameseController =
    ConvergenceController<SiameseGenome, GenerationalPopulation<SiameseGenome>>;

/// Creates `size` random genomes that already satisfy the session schema.
pub fn seed_population<G: Genome>(
    session: &Arc<Session>,
    size: usize,
    rng: &mut RandomNumberGenerator,
) -> Vec<G> {
    (0..size).map(|_| G::seed(session, rng)).collect()
}

/// Encoding-independent summary of a finished solve.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub outcome: Outcome,
    pub encoding: Encoding,
    /// The best square found; magic when `outcome` is `Solved`.
    pub square: Square,
    pub fitness: f64,
    pub reseeds: usize,
    pub evaluations: usize,
    pub elapsed: Duration,
}

impl SolveReport {
    pub fn is_solved(&self) -> bool {
        self.outcome == Outcome::Solved
    }

    fn from_result<G: Genome>(encoding: Encoding, result: SolveResult<G>) -> Self {
        Self {
            outcome: result.outcome,
            encoding,
            square: result.best.square(),
            fitness: result.best.fitness(),
            reseeds: result.reseeds,
            evaluations: result.evaluations,
            elapsed: result.elapsed,
        }
    }
}

/// Searches for a magic square honouring `schema`.
///
/// The schema is validated before anything is seeded. Running out of time
/// is reported through [`Outcome::TimedOut`], not as an error.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use magicga::evolution::{solve, SolveOptions};
/// use magicga::square::Schema;
///
/// let options = SolveOptions::builder().timeout(Duration::from_secs(5)).build();
/// let report = solve(Schema::free(3), &options).unwrap();
/// if report.is_solved() {
///     assert!(report.square.is_magic());
/// }
/// ```
pub fn solve(schema: Schema, options: &SolveOptions) -> Result<SolveReport> {
    let encoding = options.get_encoding();
    let session = Session::new(schema, options.get_measure())?;
    info!(
        order = session.order(),
        fixed = session.schema().fixed_count(),
        ?encoding,
        measure = ?session.measure(),
        "solving"
    );

    let report = match encoding {
        Encoding::Permutation => SolveReport::from_result(
            encoding,
            PermutationController::new(session, options.clone())?.run()?,
        ),
        Encoding::Siamese => SolveReport::from_result(
            encoding,
            SiameseController::new(session, options.clone())?.run()?,
        ),
    };

    info!(
        outcome = ?report.outcome,
        reseeds = report.reseeds,
        evaluations = report.evaluations,
        elapsed = ?report.elapsed,
        best = %report.square,
        "solve finished"
    );
    Ok(report)
}

/// Searches for an unconstrained magic square of the given order.
pub fn generate(order: usize, options: &SolveOptions) -> Result<SolveReport> {
    if order == 0 {
        return Err(MagicError::Configuration(
            "Order cannot be zero".to_string(),
        ));
    }
    solve(Schema::free(order), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::stats::Stats;
    use crate::fitness::FitnessMeasure;

    /// An engine that never evolves and always reports a collapsed population.
    struct FrozenEngine<G: Genome> {
        members: Vec<G>,
        running: bool,
        /// First draw of the root generator the engine was built with.
        fingerprint: f64,
    }

    impl<G: Genome> PopulationEngine<G> for FrozenEngine<G> {
        fn new(seeds: Vec<G>, _options: &SolveOptions, mut rng: RandomNumberGenerator) -> Self {
            Self {
                members: seeds,
                running: false,
                fingerprint: rng.probability(),
            }
        }

        fn start(&mut self) -> Result<()> {
            self.running = true;
            Ok(())
        }

        fn close(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn stats(&self) -> Stats {
            let max = self
                .members
                .iter()
                .map(Genome::fitness)
                .fold(f64::NEG_INFINITY, f64::max);
            Stats {
                max,
                min: max,
                mean: max,
                std_dev: 0.0,
                count: self.members.len(),
            }
        }

        fn members(&self) -> Vec<G> {
            self.members.clone()
        }

        fn best(&self) -> Option<G> {
            self.members
                .iter()
                .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
                .cloned()
        }

        fn generation(&self) -> usize {
            1
        }
    }

    /// A frozen engine whose members look far from converged.
    struct ScatteredEngine<G: Genome>(FrozenEngine<G>);

    impl<G: Genome> PopulationEngine<G> for ScatteredEngine<G> {
        fn new(seeds: Vec<G>, options: &SolveOptions, rng: RandomNumberGenerator) -> Self {
            Self(FrozenEngine::new(seeds, options, rng))
        }

        fn start(&mut self) -> Result<()> {
            self.0.start()
        }

        fn close(&mut self) {
            self.0.close()
        }

        fn is_running(&self) -> bool {
            self.0.is_running()
        }

        fn stats(&self) -> Stats {
            Stats {
                std_dev: f64::INFINITY,
                ..self.0.stats()
            }
        }

        fn members(&self) -> Vec<G> {
            self.0.members()
        }

        fn best(&self) -> Option<G> {
            self.0.best()
        }

        fn generation(&self) -> usize {
            self.0.generation()
        }
    }

    fn order_four_session() -> Arc<Session> {
        Session::new(Schema::free(4), FitnessMeasure::LineCount).unwrap()
    }

    #[test]
    fn test_reseed_timer_doubles() {
        let mut timer = ReseedTimer::new(Duration::from_millis(4));
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(timer.interval());
            timer.back_off();
        }
        assert_eq!(
            seen,
            [4, 8, 16, 32].map(Duration::from_millis).to_vec()
        );
    }

    #[test]
    fn test_converged_population_reseeds_with_backoff() {
        let options = SolveOptions::builder().seed(5).build();
        let mut controller: ConvergenceController<PermutationGenome, FrozenEngine<PermutationGenome>> =
            ConvergenceController::new(order_four_session(), options).unwrap();

        let mut intervals = vec![controller.reseed_interval()];
        for expected_reseeds in 1..=5 {
            match controller.tick().unwrap() {
                Tick::Reseeded(_) => {}
                other => panic!("Expected a reseed, got {:?}", other),
            }
            assert_eq!(controller.reseeds(), expected_reseeds);
            intervals.push(controller.reseed_interval());
        }
        assert_eq!(
            intervals,
            [4, 8, 16, 32, 64, 128].map(Duration::from_millis).to_vec()
        );
    }

    #[test]
    fn test_expired_timer_reseeds_first() {
        let options = SolveOptions::builder()
            .reseed_interval(Duration::from_millis(1))
            .seed(6)
            .build();
        let mut controller: ConvergenceController<PermutationGenome, ScatteredEngine<PermutationGenome>> =
            ConvergenceController::new(order_four_session(), options).unwrap();

        thread::sleep(Duration::from_millis(5));
        assert_eq!(
            controller.tick().unwrap(),
            Tick::Reseeded(ReseedTrigger::Timer)
        );
        assert_eq!(controller.reseeds(), 1);
        assert_eq!(controller.reseed_interval(), Duration::from_millis(2));
    }

    #[test]
    fn test_expired_timer_wins_over_solved_population() {
        let session = Session::new(Schema::free(3), FitnessMeasure::SoftGradient).unwrap();
        let options = SolveOptions::builder()
            .reseed_interval(Duration::from_millis(1))
            .seed(2)
            .build();
        let mut controller: ConvergenceController<SiameseGenome, FrozenEngine<SiameseGenome>> =
            ConvergenceController::new(Arc::clone(&session), options).unwrap();
        controller.engine.members[0] =
            SiameseGenome::new(&session, crate::genome::SiameseParams::classic(3));

        thread::sleep(Duration::from_millis(5));
        assert_eq!(
            controller.tick().unwrap(),
            Tick::Reseeded(ReseedTrigger::Timer)
        );
        // the solved member survives as the elite
        assert!(controller.engine().stats().max >= session.solved_score());
    }

    #[test]
    fn test_reseeded_engines_draw_fresh_streams() {
        let fingerprints = |seed: u64| {
            let options = SolveOptions::builder()
                .reseed_interval(Duration::from_secs(60))
                .seed(seed)
                .build();
            let mut controller: ConvergenceController<PermutationGenome, FrozenEngine<PermutationGenome>> =
                ConvergenceController::new(order_four_session(), options).unwrap();
            let mut seen = vec![controller.engine().fingerprint];
            for _ in 0..4 {
                controller.reseed(ReseedTrigger::Converged).unwrap();
                seen.push(controller.engine().fingerprint);
            }
            seen
        };

        let first = fingerprints(12);
        for (i, a) in first.iter().enumerate() {
            for b in &first[i + 1..] {
                assert_ne!(a, b);
            }
        }
        // still reproducible from the root seed
        assert_eq!(fingerprints(12), first);
    }

    #[test]
    fn test_reseed_keeps_elite() {
        let options = SolveOptions::builder().seed(9).population_size(6).build();
        let mut controller: ConvergenceController<PermutationGenome, FrozenEngine<PermutationGenome>> =
            ConvergenceController::new(order_four_session(), options).unwrap();

        for _ in 0..10 {
            let before = controller.engine().best().unwrap();
            controller.reseed(ReseedTrigger::Timer).unwrap();
            let members = controller.engine().members();
            assert_eq!(members.len(), 6);
            assert_eq!(members[5].gene(), before.gene());
            assert!(controller.engine().stats().max >= before.fitness());
        }
    }

    #[test]
    fn test_deadline_times_out() {
        let options = SolveOptions::builder()
            .timeout(Duration::ZERO)
            .seed(1)
            .build();
        let controller: ConvergenceController<PermutationGenome, FrozenEngine<PermutationGenome>> =
            ConvergenceController::new(order_four_session(), options).unwrap();
        let result = controller.run().unwrap();
        assert_eq!(result.outcome, Outcome::TimedOut);
        assert_eq!(result.reseeds, 0);
        assert!(result.best.gene().is_permutation());
    }

    #[test]
    fn test_solved_population_finishes() {
        let session = Session::new(Schema::free(3), FitnessMeasure::SoftGradient).unwrap();
        let options = SolveOptions::builder()
            .reseed_interval(Duration::from_secs(60))
            .seed(2)
            .build();
        let mut controller: ConvergenceController<SiameseGenome, FrozenEngine<SiameseGenome>> =
            ConvergenceController::new(Arc::clone(&session), options).unwrap();

        // swap a known solution into the population through an elitist reseed
        controller.engine.members[0] =
            SiameseGenome::new(&session, crate::genome::SiameseParams::classic(3));
        controller.reseed(ReseedTrigger::Timer).unwrap();

        assert_eq!(controller.tick().unwrap(), Tick::Finished(Outcome::Solved));
        assert!(!controller.engine().is_running());
    }

    #[test]
    fn test_generate_rejects_zero_order() {
        assert!(matches!(
            generate(0, &SolveOptions::default()),
            Err(MagicError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_options_fail_before_seeding() {
        let options = SolveOptions::builder().population_size(0).build();
        let result: Result<ConvergenceController<PermutationGenome, FrozenEngine<PermutationGenome>>> =
            ConvergenceController::new(order_four_session(), options);
        assert!(matches!(result, Err(MagicError::Configuration(_))));
    }
}
