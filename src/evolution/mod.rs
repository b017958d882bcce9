//! # Evolution
//!
//! Everything that moves a population through time: the [`SolveOptions`]
//! that configure a solve, the [`PopulationEngine`] that evolves members in
//! the background, and the [`ConvergenceController`] that polls the engine,
//! reseeds it when it stalls and stops it once a magic square appears.
//!
//! Most callers only need [`solve`] or [`generate`].
pub mod controller;
pub mod engine;
pub mod options;
pub mod stats;

pub use controller::{
    generate, solve, ConvergenceController, Outcome, ReseedTimer, ReseedTrigger, SolveReport,
    SolveResult, Tick,
};
pub use engine::{GenerationalPopulation, PopulationEngine};
pub use options::{SolveOptions, SolveOptionsBuilder};
pub use stats::Stats;
