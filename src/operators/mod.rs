//! # Variation Operators
//!
//! Crossover and mutation operators used by the genome encodings.
//!
//! Operators on permutation genes keep the gene a permutation: crossover
//! copies whole value cycles, mutations only swap. Operators on Siamese
//! parameters work on unconstrained integers; the parameters are only reduced
//! when the genome is expressed.
pub mod crossover;
pub mod mutation;

pub use crossover::{cycle_crossover, uniform_crossover};
pub use mutation::{gaussian_perturb, random_swap, smart_mutation, swap_rounds, SWAP_PROBABILITY};
