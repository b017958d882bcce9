use std::fmt;
use std::sync::{Arc, OnceLock};

use super::{binary_tournament, Genome};
use crate::operators::{cycle_crossover, random_swap, smart_mutation, SWAP_PROBABILITY};
use crate::rng::RandomNumberGenerator;
use crate::session::Session;
use crate::square::Square;

/// Upper bound of the per-round draw that selects a corner-relation mutation.
const SMART_PROBABILITY: f64 = 0.4;

/// A genome that is the square itself.
#[derive(Debug, Clone)]
pub struct PermutationGenome {
    gene: Square,
    session: Arc<Session>,
    fitness: OnceLock<f64>,
}

impl PermutationGenome {
    /// Wraps a square. The square is used as given; callers seeding a
    /// population should repair it against the schema first.
    pub fn new(session: &Arc<Session>, gene: Square) -> Self {
        Self {
            gene,
            session: Arc::clone(session),
            fitness: OnceLock::new(),
        }
    }

    pub fn gene(&self) -> &Square {
        &self.gene
    }

    /// Applies the mutation rounds to a fresh child gene.
    ///
    /// Each round draws `u` in `[0, 1)`: below 0.2 a random swap, below 0.4 a
    /// corner-relation swap, anything else ends the mutation.
    fn mutate(gene: &mut [usize], session: &Session, rng: &mut RandomNumberGenerator) {
        loop {
            let u = rng.probability();
            if u < SWAP_PROBABILITY {
                random_swap(gene, session.schema(), rng);
            } else if u < SMART_PROBABILITY {
                smart_mutation(gene, session.schema(), rng);
            } else {
                break;
            }
        }
    }
}

impl Genome for PermutationGenome {
    fn seed(session: &Arc<Session>, rng: &mut RandomNumberGenerator) -> Self {
        let mut gene = Square::random(session.order(), rng);
        gene.repair(session.schema());
        let genome = Self::new(session, gene);
        // scored before it can be cloned into a population snapshot
        genome.fitness();
        genome
    }

    fn fitness(&self) -> f64 {
        *self
            .fitness
            .get_or_init(|| self.session.evaluate(&self.gene))
    }

    fn evolve(&self, suitors: &[Self], rng: &mut RandomNumberGenerator) -> Self {
        let mate = binary_tournament(suitors, rng).unwrap_or(self);

        let mut child = Square::new(self.gene.order());
        cycle_crossover(child.cells_mut(), self.gene.cells(), mate.gene.cells());
        Self::mutate(child.cells_mut(), &self.session, rng);
        child.repair(self.session.schema());

        let child = Self::new(&self.session, child);
        if child.fitness() < self.fitness() {
            self.clone()
        } else {
            child
        }
    }

    fn square(&self) -> Square {
        self.gene.clone()
    }

    fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

impl fmt::Display for PermutationGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.gene, self.fitness())
    }
}
