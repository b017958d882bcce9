/// Summary of the fitness scores of a population at one instant.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl Stats {
    /// Computes the statistics of a set of scores (population standard deviation).
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let count = scores.len();
        let n = count as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            mean,
            std_dev: variance.sqrt(),
            count,
        }
    }

    /// Relative standard deviation, `std_dev / |mean|`.
    ///
    /// Soft-gradient scores are often negative, so the magnitude of the mean
    /// is used. A zero mean gives `0` for a uniform population and infinity
    /// otherwise.
    pub fn rsd(&self) -> f64 {
        if self.mean == 0.0 {
            if self.std_dev == 0.0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            self.std_dev / self.mean.abs()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scores() {
        let stats = Stats::from_scores(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.count, 8);
        assert_eq!(stats.rsd(), 0.4);
    }

    #[test]
    fn test_rsd_of_negative_mean() {
        let stats = Stats::from_scores(&[-8.0, -12.0]);
        assert_eq!(stats.mean, -10.0);
        assert!((stats.rsd() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_rsd_of_zero_mean() {
        assert_eq!(Stats::from_scores(&[0.0, 0.0]).rsd(), 0.0);
        assert_eq!(Stats::from_scores(&[-1.0, 1.0]).rsd(), f64::INFINITY);
    }

    #[test]
    fn test_empty() {
        let stats = Stats::from_scores(&[]);
        assert_eq!(stats.count, 0);
    }
}
