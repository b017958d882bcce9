//! Generalised Siamese walk.
//!
//! The classic Siamese method places `1` in the top middle cell and keeps
//! moving up-right, dropping one row down whenever the next cell is taken. A
//! [`SiameseParams`] generalises the start cell, the ordinary step and the
//! break step; every choice expresses *some* permutation, and the classic one
//! expresses a magic square for every odd order.

use std::fmt;
use std::sync::{Arc, OnceLock};

use super::{binary_tournament, Genome};
use crate::operators::{gaussian_perturb, uniform_crossover};
use crate::rng::RandomNumberGenerator;
use crate::session::Session;
use crate::square::{Schema, Square};

/// The six integers of a Siamese walk, each as `[row, col]`.
///
/// Step vectors are unconstrained integers; they are reduced modulo the
/// order only when the walk is expressed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiameseParams {
    pub start: [i64; 2],
    pub ordinary: [i64; 2],
    pub breaking: [i64; 2],
}

impl SiameseParams {
    /// Draws every component uniformly from `[0, order)`.
    pub fn random(order: usize, rng: &mut RandomNumberGenerator) -> Self {
        let mut draw = || rng.index(order) as i64;
        Self {
            start: [draw(), draw()],
            ordinary: [draw(), draw()],
            breaking: [draw(), draw()],
        }
    }

    /// The classic method: start top middle, step up-right, break one row down.
    pub fn classic(order: usize) -> Self {
        Self {
            start: [0, (order / 2) as i64],
            ordinary: [-1, 1],
            breaking: [1, 0],
        }
    }

    fn to_array(self) -> [i64; 6] {
        [
            self.start[0],
            self.start[1],
            self.ordinary[0],
            self.ordinary[1],
            self.breaking[0],
            self.breaking[1],
        ]
    }

    fn from_array(values: [i64; 6]) -> Self {
        Self {
            start: [values[0], values[1]],
            ordinary: [values[2], values[3]],
            breaking: [values[4], values[5]],
        }
    }

    /// Each of the six parameters is inherited from either parent with probability 0.5.
    pub fn crossover(mom: &Self, dad: &Self, rng: &mut RandomNumberGenerator) -> Self {
        let mut child = [0i64; 6];
        uniform_crossover(&mut child, &mom.to_array(), &dad.to_array(), rng);
        Self::from_array(child)
    }

    /// Adds a rounded standard-normal sample to every parameter, then brings
    /// the start position back into `[0, order)`.
    pub fn mutate(&mut self, order: usize, rng: &mut RandomNumberGenerator) {
        let mut values = self.to_array();
        gaussian_perturb(&mut values, rng);
        *self = Self::from_array(values);
        let order = order as i64;
        for coord in self.start.iter_mut() {
            while *coord < 0 {
                *coord += order;
            }
            while *coord >= order {
                *coord -= order;
            }
        }
    }
}

/// A position on the torus of an `order × order` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    row: usize,
    col: usize,
    order: usize,
}

impl Cursor {
    fn at(order: usize, position: [i64; 2]) -> Self {
        let wrap = |v: i64| v.rem_euclid(order as i64) as usize;
        Self {
            row: wrap(position[0]),
            col: wrap(position[1]),
            order,
        }
    }

    fn step(self, by: [i64; 2]) -> Self {
        Self::at(
            self.order,
            [self.row as i64 + by[0], self.col as i64 + by[1]],
        )
    }

    fn index(self) -> usize {
        self.row * self.order + self.col
    }
}

/// Expresses `params` into a square of the given order, repaired against `schema`.
///
/// The walk places `1, 2, …, order²` one at a time. After each placement it
/// takes the ordinary step; if that cell is already filled the walk is
/// *blocked* and takes break steps from the current cell until it reaches an
/// empty one. A break step landing on a cell already visited during the same
/// blockage is a loop: the walk then scans row-major for the first empty cell
/// and resumes there.
///
/// # Example
///
/// ```rust
/// use magicga::genome::{express, SiameseParams};
/// use magicga::square::Schema;
///
/// let square = express(3, &SiameseParams::classic(3), &Schema::free(3));
/// assert_eq!(square.to_string(), "[[8,1,6],[3,5,7],[4,9,2]]");
/// ```
pub fn express(order: usize, params: &SiameseParams, schema: &Schema) -> Square {
    let mut square = Square::new(order);
    let size = order * order;
    let mut cursor = Cursor::at(order, params.start);

    for value in 1..=size {
        square.cells_mut()[cursor.index()] = value;
        if value == size {
            break;
        }
        let next = cursor.step(params.ordinary);
        cursor = if square.cells()[next.index()] == 0 {
            next
        } else {
            unblock(&square, cursor, params.breaking)
        };
    }

    square.repair(schema);
    square
}

/// Follows break steps from a blocked cursor until an empty cell is reached.
fn unblock(square: &Square, from: Cursor, breaking: [i64; 2]) -> Cursor {
    let mut visited = vec![false; square.len()];
    visited[from.index()] = true;
    let mut cursor = from;
    loop {
        cursor = cursor.step(breaking);
        if square.cells()[cursor.index()] == 0 {
            return cursor;
        }
        if visited[cursor.index()] {
            return first_empty(square, from.order).unwrap_or(from);
        }
        visited[cursor.index()] = true;
    }
}

fn first_empty(square: &Square, order: usize) -> Option<Cursor> {
    square.position_of(0).map(|idx| Cursor {
        row: idx / order,
        col: idx % order,
        order,
    })
}

/// A genome made of Siamese walk parameters.
///
/// The expressed square is computed on first use and cached; concurrent
/// first accesses are serialised by the `OnceLock`, so the walk and its
/// evaluation run once per genome.
#[derive(Debug, Clone)]
pub struct SiameseGenome {
    params: SiameseParams,
    session: Arc<Session>,
    expressed: OnceLock<Square>,
    fitness: OnceLock<f64>,
}

impl SiameseGenome {
    pub fn new(session: &Arc<Session>, params: SiameseParams) -> Self {
        Self {
            params,
            session: Arc::clone(session),
            expressed: OnceLock::new(),
            fitness: OnceLock::new(),
        }
    }

    pub fn params(&self) -> &SiameseParams {
        &self.params
    }

    /// The expressed square, computing it on first access.
    pub fn expressed(&self) -> &Square {
        self.expressed.get_or_init(|| {
            express(self.session.order(), &self.params, self.session.schema())
        })
    }

    /// Returns `true` once the square has been expressed.
    pub fn is_expressed(&self) -> bool {
        self.expressed.get().is_some()
    }
}

impl Genome for SiameseGenome {
    fn seed(session: &Arc<Session>, rng: &mut RandomNumberGenerator) -> Self {
        let genome = Self::new(session, SiameseParams::random(session.order(), rng));
        // expressing repairs the square, so every seed satisfies the schema;
        // scoring here keeps clones from evaluating it again
        genome.fitness();
        genome
    }

    fn fitness(&self) -> f64 {
        *self
            .fitness
            .get_or_init(|| self.session.evaluate(self.expressed()))
    }

    fn evolve(&self, suitors: &[Self], rng: &mut RandomNumberGenerator) -> Self {
        let mate = binary_tournament(suitors, rng).unwrap_or(self);
        let mut params = SiameseParams::crossover(&self.params, &mate.params, rng);
        params.mutate(self.session.order(), rng);

        let child = Self::new(&self.session, params);
        if child.fitness() < self.fitness() {
            self.clone()
        } else {
            child
        }
    }

    fn square(&self) -> Square {
        self.expressed().clone()
    }

    fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

impl fmt::Display for SiameseGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.expressed(), self.fitness())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::FitnessMeasure;
    use rayon::prelude::*;

    #[test]
    fn test_classic_walk_is_magic_for_odd_orders() {
        for order in [3, 5, 7, 9] {
            let square = express(order, &SiameseParams::classic(order), &Schema::free(order));
            assert!(square.is_magic(), "order {} gave {}", order, square);
        }
    }

    #[test]
    fn test_classic_walk_order_three() {
        let square = express(3, &SiameseParams::classic(3), &Schema::free(3));
        assert_eq!(square.cells(), &[8, 1, 6, 3, 5, 7, 4, 9, 2]);
    }

    #[test]
    fn test_zero_break_step_falls_back_to_scan() {
        // ordinary step (0, 0) blocks immediately, break step (0, 0) loops at once,
        // so every value lands on the first empty cell in row-major order
        let params = SiameseParams {
            start: [0, 0],
            ordinary: [0, 0],
            breaking: [0, 0],
        };
        let square = express(3, &params, &Schema::free(3));
        assert_eq!(square.cells(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_any_params_express_a_permutation() {
        let mut rng = RandomNumberGenerator::from_seed(77);
        for order in 2..8 {
            for _ in 0..100 {
                let mut params = SiameseParams::random(order, &mut rng);
                params.ordinary[0] += rng.index(5) as i64 - 7;
                params.breaking[1] -= rng.index(11) as i64;
                let square = express(order, &params, &Schema::free(order));
                assert!(square.is_permutation());
            }
        }
    }

    #[test]
    fn test_expression_is_repaired() {
        let schema = Schema::from_cells(vec![
            Some(1), None, None, None, None, None, None, None, Some(9),
        ])
        .unwrap();
        let square = express(3, &SiameseParams::classic(3), &schema);
        assert!(square.satisfies(&schema));
        assert!(square.is_permutation());
    }

    #[test]
    fn test_mutate_keeps_start_in_range() {
        let mut rng = RandomNumberGenerator::from_seed(13);
        let mut params = SiameseParams::classic(5);
        for _ in 0..1000 {
            params.mutate(5, &mut rng);
            assert!((0..5).contains(&params.start[0]));
            assert!((0..5).contains(&params.start[1]));
        }
    }

    #[test]
    fn test_concurrent_first_access_counts_once() {
        let session = Session::new(Schema::free(5), FitnessMeasure::SoftGradient).unwrap();
        let genome = SiameseGenome::new(&session, SiameseParams::classic(5));
        assert!(!genome.is_expressed());

        let scores: Vec<f64> = (0..64).into_par_iter().map(|_| genome.fitness()).collect();

        assert!(genome.is_expressed());
        assert!(scores.iter().all(|&s| s == session.solved_score()));
        assert_eq!(session.evaluations(), 1);
    }

    #[test]
    fn test_seed_clone_shares_score() {
        let session = Session::new(Schema::free(5), FitnessMeasure::SoftGradient).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(4);
        let seed = SiameseGenome::seed(&session, &mut rng);
        let snapshot = seed.clone();
        assert!(snapshot.is_expressed());
        assert_eq!(snapshot.fitness(), seed.fitness());
        assert_eq!(session.evaluations(), 1);
    }

    #[test]
    fn test_evolved_children_honour_fixed_cells() {
        let schema = Schema::from_cells(vec![
            Some(3), None, None, None, None,
            None, None, Some(13), None, None,
            None, None, None, None, None,
            None, Some(20), None, None, None,
            None, None, None, None, Some(25),
        ])
        .unwrap();
        let session = Session::new(schema, FitnessMeasure::SoftGradient).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(31);
        let mut population: Vec<SiameseGenome> = (0..20)
            .map(|_| SiameseGenome::seed(&session, &mut rng))
            .collect();
        for _ in 0..10 {
            population = population
                .iter()
                .map(|genome| genome.evolve(&population, &mut rng))
                .collect();
            for genome in &population {
                let square = genome.square();
                assert!(square.is_permutation());
                assert!(square.satisfies(session.schema()));
            }
        }
    }

    #[test]
    fn test_evolve_never_regresses() {
        let session = Session::new(Schema::free(5), FitnessMeasure::LineCount).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(23);
        let population: Vec<SiameseGenome> = (0..20)
            .map(|_| SiameseGenome::seed(&session, &mut rng))
            .collect();
        for genome in &population {
            let child = genome.evolve(&population, &mut rng);
            assert!(child.fitness() >= genome.fitness());
            assert!(child.square().is_permutation());
        }
    }
}
