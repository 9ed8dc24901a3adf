/// Independent-excursion bookkeeping anchored at the entropy peak.
///
/// An energy counts as a new sample the first time it is reached during an excursion. An
/// excursion ends when the walk returns to the anchor or crosses it to the other side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitLog {
    visited: Vec<bool>,
    samples: Vec<u64>,
}

impl VisitLog {
    /// Empty log over `energy_range` indices.
    pub fn new(energy_range: usize) -> Self {
        Self {
            visited: vec![false; energy_range],
            samples: vec![0; energy_range],
        }
    }

    /// Samples counted per energy.
    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    /// Whether `energy` has been reached during the current excursion.
    pub fn visited(&self, energy: usize) -> bool {
        self.visited[energy]
    }

    /// Updates the log after a move from `old` to `new` with the anchor at `peak`.
    pub fn update(&mut self, new: usize, old: usize, peak: usize) {
        if new == peak && old != peak {
            // arriving at the anchor opens a fresh excursion
            self.visited.fill(false);
        }
        if !self.visited[new] {
            self.visited[new] = true;
            self.samples[new] += 1;
        }
        if new == peak || old == peak {
            return;
        }
        if (new > peak) != (old > peak) {
            let departed = if old < peak {
                0..peak
            } else {
                peak + 1..self.visited.len()
            };
            self.visited[departed].fill(false);
        }
    }

    /// Overwrites the sample count at `energy` (checkpoint restore).
    pub(crate) fn set_samples(&mut self, energy: usize, count: u64) {
        self.samples[energy] = count;
    }

    /// Clears visits and samples.
    pub fn reset(&mut self) {
        self.visited.fill(false);
        self.samples.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staying_put_counts_once() {
        let mut log = VisitLog::new(5);
        log.update(1, 1, 3);
        log.update(1, 1, 3);
        assert_eq!(log.samples(), &[0, 1, 0, 0, 0]);
    }

    #[test]
    fn returning_to_the_peak_starts_a_new_excursion() {
        let mut log = VisitLog::new(5);
        log.update(1, 2, 3);
        log.update(2, 1, 3);
        log.update(3, 2, 3);
        log.update(2, 3, 3);
        log.update(1, 2, 3);
        assert_eq!(log.samples(), &[0, 2, 2, 1, 0]);
        assert!(log.visited(3));
    }

    #[test]
    fn crossing_clears_the_departed_side() {
        let mut log = VisitLog::new(5);
        log.update(1, 1, 2);
        log.update(3, 1, 2);
        assert!(!log.visited(1));
        assert!(log.visited(3));
        log.update(1, 3, 2);
        assert!(!log.visited(3));
        assert_eq!(log.samples(), &[0, 2, 0, 1, 0]);
    }
}
