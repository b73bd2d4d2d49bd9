use std::collections::VecDeque;

/// Fixed-length window of blended strap samples plus the derived mean series.
///
/// During warm-up the window is filled with raw values. Afterwards every tick
/// evicts the oldest slot and appends `influence * raw + (1 - influence) * last`,
/// where `last` is the slot that was newest before the eviction.
pub struct SmoothingWindow {
    raw: VecDeque<f64>,
    means: VecDeque<f64>,
    // Present only when the zero-crossing detector needs a deviation series.
    std_devs: Option<VecDeque<f64>>,
    capacity: usize,
    influence: f64,
}

impl SmoothingWindow {
    pub fn new(capacity: usize, influence: f64, track_std_dev: bool) -> Self {
        Self {
            raw: VecDeque::with_capacity(capacity),
            means: zeroed(capacity),
            std_devs: track_std_dev.then(|| zeroed(capacity)),
            capacity,
            influence,
        }
    }

    pub fn is_warm(&self) -> bool {
        self.raw.len() == self.capacity
    }

    /// Append a warm-up value. Returns `false` once the window is already full.
    pub fn fill(&mut self, value: f64) -> bool {
        if self.is_warm() {
            return false;
        }
        self.raw.push_back(value);
        true
    }

    /// Blend one raw value into the window and return the new windowed mean.
    pub fn advance(&mut self, value: f64) -> f64 {
        let previous_last = self.raw.back().copied().unwrap_or(value);
        self.raw.pop_front();
        self.raw
            .push_back(self.influence * value + (1.0 - self.influence) * previous_last);
        let mean = mean(&self.raw);
        push_evict(&mut self.means, mean);
        if let Some(std_devs) = self.std_devs.as_mut() {
            let std_dev = population_std_dev(&self.raw, mean);
            push_evict(std_devs, std_dev);
        }
        mean
    }

    /// `mean[-1]`
    pub fn latest_mean(&self) -> f64 {
        self.means.back().copied().unwrap_or(0.0)
    }

    /// `mean[-2]`
    pub fn previous_mean(&self) -> f64 {
        self.means
            .get(self.capacity.saturating_sub(2))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn latest_std_dev(&self) -> Option<f64> {
        self.std_devs.as_ref().and_then(|s| s.back().copied())
    }

    /// `std[-2]`
    pub fn previous_std_dev(&self) -> Option<f64> {
        let index = self.capacity.saturating_sub(2);
        self.std_devs.as_ref().and_then(|s| s.get(index).copied())
    }

    pub fn raw(&self) -> &VecDeque<f64> {
        &self.raw
    }

    pub fn means(&self) -> &VecDeque<f64> {
        &self.means
    }

    pub fn std_devs(&self) -> Option<&VecDeque<f64>> {
        self.std_devs.as_ref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn reset(&mut self) {
        self.raw.clear();
        self.means = zeroed(self.capacity);
        if let Some(std_devs) = self.std_devs.as_mut() {
            *std_devs = zeroed(self.capacity);
        }
    }
}

fn zeroed(capacity: usize) -> VecDeque<f64> {
    std::iter::repeat(0.0).take(capacity).collect()
}

fn push_evict(series: &mut VecDeque<f64>, value: f64) {
    series.pop_front();
    series.push_back(value);
}

fn mean(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &VecDeque<f64>, mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|v| {
            let delta = v - mean;
            delta * delta
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}
