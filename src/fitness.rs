//! # Fitness Measures
//!
//! A [`FitnessMeasure`] scores a complete square against the magic constant.
//! Both measures are maximised and reach their maximum exactly on magic squares.
//!
//! - [`FitnessMeasure::SoftGradient`] rewards every matching line with the
//!   magic constant and penalises every other line by a quarter of its
//!   distance from the target. The landscape is smooth, which helps the
//!   search move between near misses.
//! - [`FitnessMeasure::LineCount`] counts the matching lines.
//!
//! ## Example
//!
//! ```rust
//! use magicga::fitness::FitnessMeasure;
//! use magicga::square::Square;
//!
//! let lo_shu = Square::from_cells(vec![2, 7, 6, 9, 5, 1, 4, 3, 8]).unwrap();
//! assert_eq!(FitnessMeasure::SoftGradient.score(&lo_shu), 120.0);
//! assert_eq!(FitnessMeasure::LineCount.score(&lo_shu), 8.0);
//! assert_eq!(FitnessMeasure::LineCount.solved_score(3), 8.0);
//! ```

use crate::square::{magic_constant, Square};

/// Penalty applied per unit of distance from the magic constant.
const PENALTY: f64 = 0.25;

/// The scoring rule used for a whole solve session.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitnessMeasure {
    /// `+target` for each matching line, `-0.25·|sum − target|` otherwise.
    #[default]
    SoftGradient,
    /// Number of lines summing to the target.
    LineCount,
}

impl FitnessMeasure {
    /// Scores a complete square.
    pub fn score(&self, square: &Square) -> f64 {
        let target = square.magic_constant();
        let sums = square.line_sums();
        match self {
            FitnessMeasure::SoftGradient => sums
                .into_iter()
                .map(|sum| {
                    if sum == target {
                        target as f64
                    } else {
                        -PENALTY * sum.abs_diff(target) as f64
                    }
                })
                .sum(),
            FitnessMeasure::LineCount => sums.into_iter().filter(|&s| s == target).count() as f64,
        }
    }

    /// The score of a fully solved square of the given order.
    pub fn solved_score(&self, order: usize) -> f64 {
        let lines = (2 * order + 2) as f64;
        match self {
            FitnessMeasure::SoftGradient => magic_constant(order) as f64 * lines,
            FitnessMeasure::LineCount => lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomNumberGenerator;

    #[test]
    fn test_lo_shu_scores_maximum() {
        let sq = Square::from_cells(vec![2, 7, 6, 9, 5, 1, 4, 3, 8]).unwrap();
        for measure in [FitnessMeasure::SoftGradient, FitnessMeasure::LineCount] {
            assert_eq!(measure.score(&sq), measure.solved_score(3));
        }
        assert_eq!(FitnessMeasure::SoftGradient.solved_score(3), 120.0);
    }

    #[test]
    fn test_soft_gradient_penalises_distance() {
        // rows 6,15,24 cols 12,15,18 diags 15,15
        let sq = Square::from_cells((1..=9).collect()).unwrap();
        let expected = 4.0 * 15.0 - 0.25 * (9.0 + 9.0 + 3.0 + 3.0);
        assert_eq!(FitnessMeasure::SoftGradient.score(&sq), expected);
        assert_eq!(FitnessMeasure::LineCount.score(&sq), 4.0);
    }

    #[test]
    fn test_scores_are_bounded() {
        let mut rng = RandomNumberGenerator::from_seed(17);
        for order in 3..7 {
            for _ in 0..100 {
                let sq = Square::random(order, &mut rng);
                let soft = FitnessMeasure::SoftGradient.score(&sq);
                let count = FitnessMeasure::LineCount.score(&sq);
                assert!(soft <= FitnessMeasure::SoftGradient.solved_score(order));
                assert!((0.0..=FitnessMeasure::LineCount.solved_score(order)).contains(&count));
            }
        }
    }
}
