use std::collections::VecDeque;

/// Number of recent samples kept per device.
pub const SAMPLE_WINDOW_CAPACITY: usize = 10;

/// Fixed-capacity FIFO of recent sensor samples.
///
/// Pushing onto a full window evicts the oldest sample first, so the window
/// always holds the most recent `capacity` samples in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleWindow {
    samples: VecDeque<i32>,
    capacity: usize,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::with_capacity(SAMPLE_WINDOW_CAPACITY)
    }
}

impl SampleWindow {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "sample window capacity must be positive");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: i32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Arithmetic mean of the window, or `None` when there is no sample yet.
    ///
    /// `None` is the "insufficient data" signal: an empty window must never
    /// read as a 0 average.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: i64 = self.samples.iter().map(|&v| i64::from(v)).sum();
        Some(sum as f64 / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.samples.iter().copied().collect()
    }
}
