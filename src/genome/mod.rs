//! # Genomes
//!
//! A [`Genome`] is an evolvable encoding of a candidate square. Two encodings
//! exist and the choice is made once, when a solve seeds its population:
//!
//! - [`PermutationGenome`] evolves the square directly. Crossover is cycle
//!   crossover, mutation is random and corner-relation swaps.
//! - [`SiameseGenome`] evolves the six integer parameters of a generalised
//!   Siamese walk and expresses them into a square on demand.
//!
//! Both carry an `Arc<Session>` so that every evaluation is counted in the
//! session that seeded them, and both cache their fitness so that it is
//! computed (and counted) once per genome.
//!
//! ## Example
//!
//! ```rust
//! use magicga::fitness::FitnessMeasure;
//! use magicga::genome::{Genome, PermutationGenome};
//! use magicga::rng::RandomNumberGenerator;
//! use magicga::session::Session;
//! use magicga::square::Schema;
//!
//! let session = Session::new(Schema::free(3), FitnessMeasure::LineCount).unwrap();
//! let mut rng = RandomNumberGenerator::from_seed(1);
//! let population: Vec<PermutationGenome> =
//!     (0..10).map(|_| PermutationGenome::seed(&session, &mut rng)).collect();
//!
//! let child = population[0].evolve(&population, &mut rng);
//! assert!(child.fitness() >= population[0].fitness());
//! assert!(child.square().is_permutation());
//! ```
pub mod permutation;
pub mod siamese;

use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::rng::RandomNumberGenerator;
use crate::session::Session;
use crate::square::Square;

pub use permutation::PermutationGenome;
pub use siamese::{express, SiameseGenome, SiameseParams};

/// Which genome encoding a solve evolves.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// The square itself, as a permutation of `1..=N²`.
    #[default]
    Permutation,
    /// Parameters of a generalised Siamese walk.
    Siamese,
}

/// Capability shared by every genome encoding.
///
/// The population engine only ever talks to genomes through this trait:
/// it asks for fitness, asks a member to evolve against its neighbours, and
/// prints members through `Display`.
///
/// Types implementing this trait must be `Clone`, `Send` and `Sync`: members
/// are read concurrently while a generation is evolved in parallel.
pub trait Genome: Clone + Debug + Display + Send + Sync + 'static {
    /// Creates a random genome whose square already satisfies the session schema.
    fn seed(session: &Arc<Session>, rng: &mut RandomNumberGenerator) -> Self;

    /// Returns the fitness of the expressed square. Computed once and cached.
    fn fitness(&self) -> f64;

    /// Breeds a child with a mate picked from `suitors` and returns the child
    /// if it is at least as fit as `self`, otherwise a copy of `self`.
    ///
    /// `self` and `suitors` are never modified.
    fn evolve(&self, suitors: &[Self], rng: &mut RandomNumberGenerator) -> Self;

    /// Returns the expressed square.
    fn square(&self) -> Square;

    /// Returns the session this genome belongs to.
    fn session(&self) -> &Arc<Session>;
}

/// Picks two suitors uniformly at random and returns the fitter one.
///
/// Returns `None` when `suitors` is empty.
pub fn binary_tournament<'a, G: Genome>(
    suitors: &'a [G],
    rng: &mut RandomNumberGenerator,
) -> Option<&'a G> {
    if suitors.is_empty() {
        return None;
    }
    let a = &suitors[rng.index(suitors.len())];
    let b = &suitors[rng.index(suitors.len())];
    Some(if b.fitness() > a.fitness() { b } else { a })
}
