//! Rolling buffer of temperature samples behind a live plot.

use alloc::collections::VecDeque;

/// Default window capacity: 3000 samples, five minutes of telemetry at
/// the oven's 10 Hz report rate.
pub const WINDOW_CAPACITY: usize = 3000;

/// A bounded, ordered buffer of averaged temperature samples.
///
/// Samples keep dense ordinal indices from zero: when the buffer is
/// full, appending evicts the oldest sample and every survivor shifts
/// down one position. A snapshot therefore always reads as a contiguous
/// series suitable for plotting, no matter how many samples have ever
/// been appended.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryWindow {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl TelemetryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append one sample in °C, evicting the oldest if full.
    pub fn append(&mut self, celsius: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(celsius);
    }

    /// Forget all samples, for the start of a new run.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Ordered, read-only view of the retained samples as
    /// `(index, temperature)` pairs, indices dense from zero.
    pub fn snapshot(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.samples.iter().copied().enumerate()
    }
}

impl Default for TelemetryWindow {
    fn default() -> Self {
        Self::new(WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn snapshot(window: &TelemetryWindow) -> Vec<(usize, f64)> {
        window.snapshot().collect()
    }

    #[test]
    fn fills_in_order() {
        let mut window = TelemetryWindow::new(3);
        window.append(10.0);
        window.append(20.0);
        window.append(30.0);
        assert_eq!(snapshot(&window), vec![(0, 10.0), (1, 20.0), (2, 30.0)]);
    }

    #[test]
    fn evicts_oldest_and_reindexes() {
        let mut window = TelemetryWindow::new(3);
        for temp in [10.0, 20.0, 30.0, 40.0] {
            window.append(temp);
        }
        assert_eq!(snapshot(&window), vec![(0, 20.0), (1, 30.0), (2, 40.0)]);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut window = TelemetryWindow::new(2);
        for temp in [1.0, 2.0, 3.0, 4.0, 5.0] {
            window.append(temp);
        }
        assert_eq!(snapshot(&window), vec![(0, 4.0), (1, 5.0)]);
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut window = TelemetryWindow::new(4);
        window.append(12.5);
        window.append(13.0);
        assert_eq!(snapshot(&window), snapshot(&window));
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut window = TelemetryWindow::new(3);
        window.append(100.0);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(snapshot(&window), vec![]);
        window.append(25.0);
        assert_eq!(snapshot(&window), vec![(0, 25.0)]);
    }

    #[test]
    fn zero_capacity_stays_empty() {
        let mut window = TelemetryWindow::new(0);
        window.append(10.0);
        assert!(window.is_empty());
    }
}
