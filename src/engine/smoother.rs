use std::collections::VecDeque;

/// Moving average over the last few instantaneous rates.
pub struct RateSmoother {
    history: VecDeque<f64>,
    baseline: f64,
    published: f64,
}

impl RateSmoother {
    /// History starts filled with `baseline`, so the published rate is defined
    /// before the first cycle completes.
    pub fn new(size: usize, baseline: f64) -> Self {
        let size = size.max(1);
        Self {
            history: std::iter::repeat(baseline).take(size).collect(),
            baseline,
            published: baseline,
        }
    }

    /// Push a clamped instantaneous rate and return the new published rate.
    pub fn push(&mut self, rate: f64) -> f64 {
        self.history.pop_front();
        self.history.push_back(rate);
        self.published = self.history.iter().sum::<f64>() / self.history.len() as f64;
        self.published
    }

    pub fn published(&self) -> f64 {
        self.published
    }

    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    pub fn reset(&mut self) {
        let size = self.history.len();
        self.history = std::iter::repeat(self.baseline).take(size).collect();
        self.published = self.baseline;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_baseline() {
        let smoother = RateSmoother::new(3, 14.0);
        assert_eq!(smoother.published(), 14.0);
        assert_eq!(smoother.history().len(), 3);
    }

    #[test]
    fn publishes_mean_of_history() {
        let mut smoother = RateSmoother::new(3, 14.0);
        assert_eq!(smoother.push(11.0), 13.0);
        assert_eq!(smoother.push(8.0), 11.0);
        assert_eq!(smoother.push(5.0), 8.0);
        assert_eq!(smoother.push(5.0), 6.0);
        assert_eq!(smoother.history().len(), 3);
        let mean = smoother.history().iter().sum::<f64>() / 3.0;
        assert_eq!(smoother.published(), mean);
    }

    #[test]
    fn reset_refills_with_baseline() {
        let mut smoother = RateSmoother::new(2, 12.0);
        smoother.push(20.0);
        smoother.reset();
        assert_eq!(smoother.published(), 12.0);
        assert!(smoother.history().iter().all(|&r| r == 12.0));
        assert_eq!(smoother.history().len(), 2);
    }
}
