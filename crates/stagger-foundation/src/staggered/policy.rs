//! Placement policies: which column receives the next item.
//!
//! Staggered-list implementations tend to grow near-duplicate engines for
//! the same decision (round-robin only, greedy only, hybrid, variants that
//! pre-sort on known dimensions). Here the decision is a single
//! [`PlacementPolicy`] selected in configuration and applied by
//! [`ColumnAssigner`].

use smallvec::SmallVec;

use super::height_tracker::{HeightTracker, COLUMN_HINT};

/// Strategy for assigning items to columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlacementPolicy {
    /// `(previous + 1) % columns`, ignoring heights entirely.
    RoundRobin,
    /// Always the currently shortest column.
    GreedyMinimum,
    /// Round-robin while more than `columns` items remain, then greedy.
    ///
    /// Early in a batch little or no height information exists and greedy
    /// decisions over zero/partial data skew badly, so round-robin seeds the
    /// columns evenly. Near the tail real measured heights are available and
    /// a final greedy pass minimizes the visible disparity.
    #[default]
    HybridSeedThenGreedy,
    /// Greedy over heights the items declare up front.
    ///
    /// For data sources that already know their rendered dimensions (images
    /// with intrinsic sizes), assignment runs on the declared heights instead
    /// of waiting for measurement feedback. An item without a declared height
    /// counts as 0.
    PresortedByKnownDimensions,
}

/// Decides the destination column for each unplaced item in turn.
///
/// Callable once per item, synchronously; never blocks on measurement.
#[derive(Debug)]
pub struct ColumnAssigner {
    policy: PlacementPolicy,
    columns: usize,
    previous: Option<usize>,
    /// Running declared-height sums, used only by
    /// [`PlacementPolicy::PresortedByKnownDimensions`].
    declared: SmallVec<[f32; COLUMN_HINT]>,
}

impl ColumnAssigner {
    pub fn new(policy: PlacementPolicy, columns: usize) -> Self {
        Self {
            policy,
            columns,
            previous: None,
            declared: smallvec::smallvec![0.0; columns],
        }
    }

    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    /// Assigns a column for the item at the cursor.
    ///
    /// `remaining` counts the item being assigned plus everything after it
    /// in the backlog. `declared_height` is only consulted by
    /// [`PlacementPolicy::PresortedByKnownDimensions`].
    pub fn assign(
        &mut self,
        remaining: usize,
        tracker: &HeightTracker,
        declared_height: Option<f32>,
    ) -> usize {
        let column = match self.policy {
            PlacementPolicy::RoundRobin => self.round_robin(),
            PlacementPolicy::GreedyMinimum => tracker.shortest(),
            PlacementPolicy::HybridSeedThenGreedy => {
                if remaining > self.columns {
                    self.round_robin()
                } else {
                    tracker.shortest()
                }
            }
            PlacementPolicy::PresortedByKnownDimensions => {
                let height = declared_height.filter(|h| h.is_finite()).unwrap_or(0.0);
                let column = self.shortest_declared();
                self.declared[column] += height.max(0.0);
                column
            }
        };
        self.previous = Some(column);
        column
    }

    /// Forgets all assignment history. Called on reset.
    pub fn reset(&mut self) {
        self.previous = None;
        self.declared.fill(0.0);
    }

    fn round_robin(&self) -> usize {
        match self.previous {
            Some(previous) => (previous + 1) % self.columns,
            None => 0,
        }
    }

    fn shortest_declared(&self) -> usize {
        let mut min_index = 0;
        let mut min_total = f32::INFINITY;
        for (index, &total) in self.declared.iter().enumerate() {
            if total < min_total {
                min_total = total;
                min_index = index;
            }
        }
        min_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_cycles_from_zero() {
        let tracker = HeightTracker::new(3);
        let mut assigner = ColumnAssigner::new(PlacementPolicy::RoundRobin, 3);
        let picks: Vec<usize> = (0..7).map(|i| assigner.assign(7 - i, &tracker, None)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn greedy_follows_tracker() {
        let mut tracker = HeightTracker::new(2);
        tracker.set(0, 30.0);
        tracker.set(1, 10.0);
        let mut assigner = ColumnAssigner::new(PlacementPolicy::GreedyMinimum, 2);
        assert_eq!(assigner.assign(5, &tracker, None), 1);

        tracker.set(1, 40.0);
        assert_eq!(assigner.assign(4, &tracker, None), 0);
    }

    #[test]
    fn hybrid_switches_to_greedy_for_the_tail() {
        let mut tracker = HeightTracker::new(2);
        tracker.set(0, 50.0);
        tracker.set(1, 0.0);
        let mut assigner = ColumnAssigner::new(PlacementPolicy::HybridSeedThenGreedy, 2);

        // remaining > columns: round-robin regardless of heights
        assert_eq!(assigner.assign(5, &tracker, None), 0);
        assert_eq!(assigner.assign(4, &tracker, None), 1);
        assert_eq!(assigner.assign(3, &tracker, None), 0);
        // remaining <= columns: greedy
        assert_eq!(assigner.assign(2, &tracker, None), 1);
        assert_eq!(assigner.assign(1, &tracker, None), 1);
    }

    #[test]
    fn presorted_balances_declared_heights() {
        let tracker = HeightTracker::new(2);
        let mut assigner = ColumnAssigner::new(PlacementPolicy::PresortedByKnownDimensions, 2);

        assert_eq!(assigner.assign(4, &tracker, Some(100.0)), 0);
        assert_eq!(assigner.assign(3, &tracker, Some(10.0)), 1);
        // column 1 is far shorter on declared sums
        assert_eq!(assigner.assign(2, &tracker, Some(10.0)), 1);
        assert_eq!(assigner.assign(1, &tracker, Some(100.0)), 1);
    }

    #[test]
    fn presorted_counts_missing_dimensions_as_zero() {
        let tracker = HeightTracker::new(2);
        let mut assigner = ColumnAssigner::new(PlacementPolicy::PresortedByKnownDimensions, 2);

        assert_eq!(assigner.assign(3, &tracker, Some(50.0)), 0);
        assert_eq!(assigner.assign(2, &tracker, None), 1);
        // the None above contributed 0, so column 1 is still shortest
        assert_eq!(assigner.assign(1, &tracker, Some(20.0)), 1);
    }

    #[test]
    fn reset_restarts_the_rotation() {
        let tracker = HeightTracker::new(2);
        let mut assigner = ColumnAssigner::new(PlacementPolicy::RoundRobin, 2);
        assigner.assign(3, &tracker, None);
        assigner.assign(2, &tracker, None);
        assigner.reset();
        assert_eq!(assigner.assign(1, &tracker, None), 0);
    }
}
