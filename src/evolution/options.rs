//! # SolveOptions
//!
//! The `SolveOptions` struct holds the configuration of a solve: which genome
//! encoding and fitness measure to use, how large the population is, and the
//! timing policy of the convergence controller.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use magicga::evolution::options::SolveOptions;
//! use magicga::genome::Encoding;
//!
//! // Custom options through the builder
//! let options = SolveOptions::builder()
//!     .encoding(Encoding::Siamese)
//!     .timeout(Duration::from_secs(5))
//!     .seed(42)
//!     .build();
//! assert_eq!(options.get_population_size(4), 40);
//!
//! // Default options
//! let default_options = SolveOptions::default();
//! assert_eq!(default_options.get_reseed_interval(), Duration::from_millis(4));
//! ```
//!
//! ## Fields
//!
//! - `encoding`: the genome encoding, chosen once per solve.
//! - `measure`: the fitness measure, which also fixes the solved score.
//! - `population_size`: members per population; `None` means ten per unit of order.
//! - `timeout`: overall deadline of the solve.
//! - `reseed_interval`: initial reseed interval, doubled after every reseed.
//! - `convergence_threshold`: relative standard deviation below which the
//!   population counts as converged and is reseeded.
//! - `poll_interval`: pause between two controller ticks.
//! - `parallel_threshold`: minimum population size evolved in parallel.
//! - `seed`: root seed for reproducible seeding.

use std::time::Duration;

use crate::error::{MagicError, Result};
use crate::fitness::FitnessMeasure;
use crate::genome::Encoding;

/// Members per unit of order when no population size is given.
pub const MEMBERS_PER_ORDER: usize = 10;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    encoding: Encoding,
    measure: FitnessMeasure,
    population_size: Option<usize>,
    timeout: Duration,
    reseed_interval: Duration,
    convergence_threshold: f64,
    poll_interval: Duration,
    /// Minimum number of members to evolve in parallel
    parallel_threshold: usize,
    seed: Option<u64>,
}

impl SolveOptions {
    pub fn new(encoding: Encoding, measure: FitnessMeasure, timeout: Duration) -> Self {
        Self {
            encoding,
            measure,
            timeout,
            ..Self::default()
        }
    }

    /// Checks that the options describe a runnable solve.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == Some(0) {
            return Err(MagicError::Configuration(
                "Population size cannot be zero".to_string(),
            ));
        }
        if self.reseed_interval.is_zero() {
            return Err(MagicError::Configuration(
                "Reseed interval cannot be zero".to_string(),
            ));
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return Err(MagicError::Configuration(format!(
                "Convergence threshold must be a non-negative number, got {}",
                self.convergence_threshold
            )));
        }
        Ok(())
    }

    pub fn get_encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn get_measure(&self) -> FitnessMeasure {
        self.measure
    }

    /// Returns the population size for a square of the given order.
    pub fn get_population_size(&self, order: usize) -> usize {
        self.population_size
            .unwrap_or(MEMBERS_PER_ORDER * order)
            .max(1)
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_reseed_interval(&self) -> Duration {
        self.reseed_interval
    }

    pub fn get_convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    pub fn get_poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the minimum number of members to evolve in parallel.
    pub fn get_parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    pub fn set_measure(&mut self, measure: FitnessMeasure) {
        self.measure = measure;
    }

    pub fn set_population_size(&mut self, population_size: usize) {
        self.population_size = Some(population_size);
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_reseed_interval(&mut self, interval: Duration) {
        self.reseed_interval = interval;
    }

    pub fn set_convergence_threshold(&mut self, threshold: f64) {
        self.convergence_threshold = threshold;
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    pub fn set_parallel_threshold(&mut self, threshold: usize) {
        self.parallel_threshold = threshold;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }

    /// Returns a builder for creating a `SolveOptions` instance.
    pub fn builder() -> SolveOptionsBuilder {
        SolveOptionsBuilder::default()
    }
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Permutation,
            measure: FitnessMeasure::SoftGradient,
            population_size: None,
            timeout: Duration::from_secs(30),
            reseed_interval: Duration::from_millis(4),
            convergence_threshold: 0.3,
            poll_interval: Duration::from_millis(1),
            parallel_threshold: 64,
            seed: None,
        }
    }
}

/// Builder for `SolveOptions`.
///
/// Provides a fluent interface for constructing `SolveOptions` instances.
/// Unset values fall back to `SolveOptions::default()`.
#[derive(Debug, Clone, Default)]
pub struct SolveOptionsBuilder {
    encoding: Option<Encoding>,
    measure: Option<FitnessMeasure>,
    population_size: Option<usize>,
    timeout: Option<Duration>,
    reseed_interval: Option<Duration>,
    convergence_threshold: Option<f64>,
    poll_interval: Option<Duration>,
    parallel_threshold: Option<usize>,
    seed: Option<u64>,
}

impl SolveOptionsBuilder {
    pub fn encoding(mut self, value: Encoding) -> Self {
        self.encoding = Some(value);
        self
    }

    pub fn measure(mut self, value: FitnessMeasure) -> Self {
        self.measure = Some(value);
        self
    }

    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = Some(value);
        self
    }

    pub fn reseed_interval(mut self, value: Duration) -> Self {
        self.reseed_interval = Some(value);
        self
    }

    pub fn convergence_threshold(mut self, value: f64) -> Self {
        self.convergence_threshold = Some(value);
        self
    }

    pub fn poll_interval(mut self, value: Duration) -> Self {
        self.poll_interval = Some(value);
        self
    }

    pub fn parallel_threshold(mut self, value: usize) -> Self {
        self.parallel_threshold = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    /// Builds the `SolveOptions` instance.
    pub fn build(self) -> SolveOptions {
        let default = SolveOptions::default();
        SolveOptions {
            encoding: self.encoding.unwrap_or(default.encoding),
            measure: self.measure.unwrap_or(default.measure),
            population_size: self.population_size.or(default.population_size),
            timeout: self.timeout.unwrap_or(default.timeout),
            reseed_interval: self.reseed_interval.unwrap_or(default.reseed_interval),
            convergence_threshold: self
                .convergence_threshold
                .unwrap_or(default.convergence_threshold),
            poll_interval: self.poll_interval.unwrap_or(default.poll_interval),
            parallel_threshold: self
                .parallel_threshold
                .unwrap_or(default.parallel_threshold),
            seed: self.seed.or(default.seed),
        }
    }
}
