//! # Session
//!
//! The state shared by every genome of one solve: the order, the schema, the
//! fitness measure and a counter of fitness evaluations. Genomes hold an
//! `Arc<Session>`; the counter is diagnostic only and never drives control
//! decisions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::fitness::FitnessMeasure;
use crate::square::{magic_constant, Schema, Square};

#[derive(Debug)]
pub struct Session {
    schema: Schema,
    measure: FitnessMeasure,
    evaluations: AtomicUsize,
}

impl Session {
    /// Validates `schema` and wraps it in a shareable session.
    pub fn new(schema: Schema, measure: FitnessMeasure) -> Result<Arc<Self>> {
        schema.validate()?;
        Ok(Arc::new(Self {
            schema,
            measure,
            evaluations: AtomicUsize::new(0),
        }))
    }

    pub fn order(&self) -> usize {
        self.schema.order()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn measure(&self) -> FitnessMeasure {
        self.measure
    }

    pub fn magic_constant(&self) -> usize {
        magic_constant(self.order())
    }

    /// Score of a fully solved square under this session's measure.
    pub fn solved_score(&self) -> f64 {
        self.measure.solved_score(self.order())
    }

    /// Scores `square` and counts the evaluation.
    pub fn evaluate(&self, square: &Square) -> f64 {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.measure.score(square)
    }

    /// Number of evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}
