pub mod error;
pub mod evolution;
pub mod fitness;
pub mod genome;
pub mod operators;
pub mod rng;
pub mod session;
pub mod square;
pub mod trial;

// Re-export commonly used types for convenience
pub use error::{MagicError, OptionExt, Result, ResultExt};
pub use evolution::{generate, solve, Outcome, SolveOptions, SolveReport};
pub use fitness::FitnessMeasure;
pub use genome::Encoding;
pub use square::{Schema, Square};
